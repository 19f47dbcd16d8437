//! XYZ tile addressing on the Web Mercator grid.

use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Maximum latitude representable in Web Mercator.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// Deepest zoom level tiles are generated for.
pub const MAX_ZOOM: u32 = 24;

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y), counted from the north
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Tile path fragment, e.g. `"5/17/11"`.
    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.z, self.x, self.y)
    }

    /// Number of tiles along one axis at this zoom.
    pub fn tiles_per_axis(&self) -> u64 {
        axis_size(self.z) as u64
    }

    /// Geographic bounds of this tile in degrees.
    pub fn bounds(&self) -> BoundingBox {
        let (min_lon, max_lat) = tile_pixel_to_lon_lat(self.z, self.x as f64, self.y as f64);
        let (max_lon, min_lat) =
            tile_pixel_to_lon_lat(self.z, (self.x + 1) as f64, (self.y + 1) as f64);
        BoundingBox::new(min_lon, min_lat, max_lon, max_lat)
    }

    /// Lon/lat of a fractional position inside the tile (`fx`, `fy` in 0..=1 from
    /// the north-west corner).
    pub fn lon_lat_at(&self, fx: f64, fy: f64) -> (f64, f64) {
        tile_pixel_to_lon_lat(self.z, self.x as f64 + fx, self.y as f64 + fy)
    }
}

/// Convert fractional tile coordinates at zoom `z` to lon/lat degrees.
pub fn tile_pixel_to_lon_lat(z: u32, tx: f64, ty: f64) -> (f64, f64) {
    let n = axis_size(z);
    let lon = tx / n * 360.0 - 180.0;
    let lat = (std::f64::consts::PI * (1.0 - 2.0 * ty / n))
        .sinh()
        .atan()
        .to_degrees();
    (lon, lat)
}

/// Fractional tile coordinates of a lon/lat position at zoom `z`.
pub fn lon_lat_to_tile_pixel(z: u32, lon: f64, lat: f64) -> (f64, f64) {
    let n = axis_size(z);
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let tx = (lon + 180.0) / 360.0 * n;
    let ty = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0 * n;
    (tx, ty)
}

fn axis_size(z: u32) -> f64 {
    2f64.powi(z as i32)
}

/// Inclusive block of tiles at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub z: u32,
    pub x_start: u32,
    pub x_end: u32,
    pub y_start: u32,
    pub y_end: u32,
}

impl TileRange {
    /// Tiles at zoom `z` intersecting a lon/lat bounding box. `None` above
    /// [`MAX_ZOOM`].
    pub fn covering(bounds: &BoundingBox, z: u32) -> Option<Self> {
        if z > MAX_ZOOM {
            return None;
        }
        let max_index = axis_size(z) - 1.0;
        let (x0, y0) = lon_lat_to_tile_pixel(z, bounds.min_x, bounds.max_y);
        let (x1, y1) = lon_lat_to_tile_pixel(z, bounds.max_x, bounds.min_y);

        let clamp = |v: f64| v.floor().clamp(0.0, max_index) as u32;
        Some(Self {
            z,
            x_start: clamp(x0),
            x_end: clamp(x1),
            y_start: clamp(y0),
            y_end: clamp(y1),
        })
    }

    pub fn columns(&self) -> u64 {
        u64::from(self.x_end.saturating_sub(self.x_start)) + 1
    }

    pub fn rows(&self) -> u64 {
        u64::from(self.y_end.saturating_sub(self.y_start)) + 1
    }

    /// Number of tiles in the range.
    pub fn tile_count(&self) -> u64 {
        self.columns().checked_mul(self.rows()).unwrap_or(u64::MAX)
    }

    /// Tiles row-major from the north-west, generated lazily.
    pub fn iter(&self) -> impl Iterator<Item = TileCoord> {
        let Self {
            z,
            x_start,
            x_end,
            y_start,
            y_end,
        } = *self;
        (y_start..=y_end).flat_map(move |y| (x_start..=x_end).map(move |x| TileCoord { z, x, y }))
    }
}

/// All tiles at zoom `z` intersecting a lon/lat bounding box, row-major from
/// the north-west. Empty above [`MAX_ZOOM`].
pub fn tiles_covering(bounds: &BoundingBox, z: u32) -> impl Iterator<Item = TileCoord> {
    TileRange::covering(bounds, z)
        .into_iter()
        .flat_map(|range| range.iter())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_tile_bounds() {
        let bounds = TileCoord::new(0, 0, 0).bounds();
        assert!((bounds.min_x + 180.0).abs() < 1e-9);
        assert!((bounds.max_x - 180.0).abs() < 1e-9);
        assert!((bounds.max_y - MAX_MERCATOR_LAT).abs() < 1e-6);
    }

    #[test]
    fn test_tile_roundtrip() {
        let (tx, ty) = lon_lat_to_tile_pixel(10, 8.5417, 47.3769);
        let (lon, lat) = tile_pixel_to_lon_lat(10, tx, ty);
        assert!((lon - 8.5417).abs() < 1e-9);
        assert!((lat - 47.3769).abs() < 1e-9);
    }

    #[test]
    fn test_tiles_covering_single_tile() {
        let tiles: Vec<_> = tiles_covering(&BoundingBox::new(1.0, 1.0, 2.0, 2.0), 1).collect();
        assert_eq!(tiles, vec![TileCoord::new(1, 1, 0)]);
    }

    #[test]
    fn test_tiles_covering_spans_quadrants() {
        let tiles: Vec<_> = tiles_covering(&BoundingBox::new(-10.0, -10.0, 10.0, 10.0), 1).collect();
        assert_eq!(tiles.len(), 4);
        assert_eq!(tiles[0], TileCoord::new(1, 0, 0));
        assert_eq!(tiles[3], TileCoord::new(1, 1, 1));
    }

    #[test]
    fn test_world_at_high_zoom_is_lazy() {
        let world = BoundingBox::new(-180.0, -85.0, 180.0, 85.0);
        let range = TileRange::covering(&world, 17).unwrap();
        assert_eq!(range.columns(), 1 << 17);
        assert_eq!(range.tile_count(), range.columns() * range.rows());
        assert!(range.tile_count() > u64::from(u32::MAX));

        let first: Vec<_> = tiles_covering(&world, 17).take(3).collect();
        assert_eq!(first.len(), 3);
        assert_eq!(first[2], TileCoord::new(17, 2, first[0].y));
    }

    #[test]
    fn test_zoom_beyond_limit_is_empty() {
        let world = BoundingBox::new(-180.0, -85.0, 180.0, 85.0);
        assert!(TileRange::covering(&world, MAX_ZOOM + 1).is_none());
        assert_eq!(tiles_covering(&world, 64).count(), 0);
        assert_eq!(TileCoord::new(40, 0, 0).tiles_per_axis(), 1 << 40);
    }
}
