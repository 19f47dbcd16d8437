//! Tile rasterisation: sample a dataset on a map tile and recolor it.
//!
//! A tile is sampled on a `resolution × resolution` grid of cell centres and
//! each cell is then expanded to a block of output pixels, so `resolution`
//! controls detail independently of the output tile size.

use ntl_common::{TileCoord, tile::tile_pixel_to_lon_lat};
use raster::{RasterDataset, ResampleMethod};
use rayon::prelude::*;

use crate::scale::ColorScale;

/// Sample band values at the centres of a `resolution²` grid over `coord`.
///
/// Row-major from the tile's north-west corner. Cells outside the raster are
/// `None`; no-data cells are `Some(NaN)`.
pub fn sample_tile(
    dataset: &RasterDataset,
    band: usize,
    coord: TileCoord,
    resolution: usize,
    resample: ResampleMethod,
) -> Vec<Option<f64>> {
    let res = resolution.max(1);
    (0..res * res)
        .into_par_iter()
        .map(|i| {
            let (row, col) = (i / res, i % res);
            let tx = coord.x as f64 + (col as f64 + 0.5) / res as f64;
            let ty = coord.y as f64 + (row as f64 + 0.5) / res as f64;
            let (lon, lat) = tile_pixel_to_lon_lat(coord.z, tx, ty);
            dataset.sample_lon_lat(band, lon, lat, resample)
        })
        .collect()
}

/// Recolor sampled values and upscale to `tile_size × tile_size` RGBA bytes.
pub fn render_samples(
    samples: &[Option<f64>],
    resolution: usize,
    tile_size: usize,
    scale: &ColorScale,
    opacity: f32,
) -> Vec<u8> {
    let res = resolution.max(1);
    let colors: Vec<[u8; 4]> = samples
        .par_iter()
        .map(|v| scale.map(*v).with_opacity(opacity).to_array())
        .collect();

    let mut pixels = vec![0u8; tile_size * tile_size * 4];
    pixels
        .par_chunks_mut(tile_size * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let cell_row = (y * res / tile_size).min(res - 1);
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let cell_col = (x * res / tile_size).min(res - 1);
                if let Some(c) = colors.get(cell_row * res + cell_col) {
                    px.copy_from_slice(c);
                }
            }
        });
    pixels
}

/// Sample and recolor one tile. `None` when the tile misses the raster.
#[allow(clippy::too_many_arguments)]
pub fn render_tile(
    dataset: &RasterDataset,
    band: usize,
    coord: TileCoord,
    scale: &ColorScale,
    resolution: usize,
    tile_size: usize,
    resample: ResampleMethod,
    opacity: f32,
) -> Option<Vec<u8>> {
    if !coord.bounds().intersects(&dataset.lon_lat_bounds()) {
        return None;
    }
    let samples = sample_tile(dataset, band, coord, resolution, resample);
    Some(render_samples(&samples, resolution, tile_size, scale, opacity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntl_common::{InterpolationMode, Rgba};

    fn bw_scale() -> ColorScale {
        ColorScale::build(
            &[Rgba::opaque(0, 0, 0), Rgba::opaque(255, 255, 255)],
            InterpolationMode::Rgb,
            (0.0, 1.0),
        )
        .unwrap()
    }

    #[test]
    fn test_render_samples_block_upscale() {
        let samples = vec![Some(0.0), Some(1.0), None, Some(f64::NAN)];
        let pixels = render_samples(&samples, 2, 4, &bw_scale(), 1.0);
        assert_eq!(pixels.len(), 4 * 4 * 4);

        let px = |x: usize, y: usize| &pixels[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
        assert_eq!(px(0, 0), &[0, 0, 0, 255]);
        assert_eq!(px(1, 1), &[0, 0, 0, 255]);
        assert_eq!(px(3, 0), &[255, 255, 255, 255]);
        assert_eq!(px(0, 3)[3], 0);
        assert_eq!(px(3, 3)[3], 0);
    }

    #[test]
    fn test_render_samples_opacity() {
        let pixels = render_samples(&[Some(1.0)], 1, 2, &bw_scale(), 0.5);
        assert_eq!(pixels[3], 128);
    }
}
