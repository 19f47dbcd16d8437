//! In-memory raster dataset.

use std::sync::Arc;

use ntl_common::{BandStatistics, BoundingBox, CrsCode};
use serde::{Deserialize, Serialize};

use crate::error::{RasterError, RasterResult};

/// How a value is read between pixel centres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleMethod {
    Nearest,
    #[default]
    Bilinear,
}

impl std::str::FromStr for ResampleMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(ResampleMethod::Nearest),
            "bilinear" => Ok(ResampleMethod::Bilinear),
            other => Err(format!("unknown resample method: {}", other)),
        }
    }
}

/// Affine placement of a north-up raster: top-left corner and pixel size, in
/// units of the raster's CRS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    /// Pixel width, positive.
    pub pixel_width: f64,
    /// Pixel height, positive (rows go south).
    pub pixel_height: f64,
}

/// A decoded grid of samples per band plus georeferencing.
///
/// Bands are stored row-major from the north-west corner. No-data samples are
/// stored as NaN.
#[derive(Debug, Clone)]
pub struct RasterDataset {
    url: String,
    width: usize,
    height: usize,
    bands: Vec<Vec<f32>>,
    transform: GeoTransform,
    crs: CrsCode,
    no_data: Option<f64>,
    mins: Vec<Option<f64>>,
    maxs: Vec<Option<f64>>,
}

impl RasterDataset {
    /// Build a dataset, validating band sizes and computing per-band ranges.
    pub fn new(
        width: usize,
        height: usize,
        bands: Vec<Vec<f32>>,
        transform: GeoTransform,
        crs: CrsCode,
    ) -> RasterResult<Self> {
        if width == 0 || height == 0 || bands.is_empty() {
            return Err(RasterError::Empty);
        }
        if let Some((index, band)) = bands
            .iter()
            .enumerate()
            .find(|(_, b)| b.len() != width * height)
        {
            return Err(RasterError::InvalidFormat(format!(
                "band {} has {} samples, expected {}x{}",
                index,
                band.len(),
                width,
                height
            )));
        }
        if !(transform.pixel_width > 0.0 && transform.pixel_height > 0.0) {
            return Err(RasterError::InvalidFormat(format!(
                "non-positive pixel size {}x{}",
                transform.pixel_width, transform.pixel_height
            )));
        }

        let (mins, maxs): (Vec<_>, Vec<_>) = bands.iter().map(|b| observed_range(b)).unzip();

        Ok(Self {
            url: String::new(),
            width,
            height,
            bands,
            transform,
            crs,
            no_data: None,
            mins,
            maxs,
        })
    }

    /// Record the URL the dataset was fetched from.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_no_data(mut self, no_data: Option<f64>) -> Self {
        self.no_data = no_data;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band(&self, index: usize) -> Option<&[f32]> {
        self.bands.get(index).map(Vec::as_slice)
    }

    pub fn crs(&self) -> CrsCode {
        self.crs
    }

    /// Declared no-data value, if the payload carried one.
    pub fn no_data(&self) -> Option<f64> {
        self.no_data
    }

    pub fn transform(&self) -> GeoTransform {
        self.transform
    }

    /// Pixel size as (width, height).
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.transform.pixel_width, self.transform.pixel_height)
    }

    /// Extent in the raster's own CRS.
    pub fn bounds(&self) -> BoundingBox {
        let t = &self.transform;
        BoundingBox::new(
            t.origin_x,
            t.origin_y - self.height as f64 * t.pixel_height,
            t.origin_x + self.width as f64 * t.pixel_width,
            t.origin_y,
        )
    }

    /// Extent in lon/lat degrees.
    pub fn lon_lat_bounds(&self) -> BoundingBox {
        let native = self.bounds();
        let (min_lon, min_lat) = self.crs.to_lon_lat(native.min_x, native.min_y);
        let (max_lon, max_lat) = self.crs.to_lon_lat(native.max_x, native.max_y);
        BoundingBox::new(min_lon, min_lat, max_lon, max_lat)
    }

    /// Smallest finite sample of a band; `None` if there is none.
    pub fn observed_min(&self, band: usize) -> Option<f64> {
        self.mins.get(band).copied().flatten()
    }

    /// Largest finite sample of a band; `None` if there is none.
    pub fn observed_max(&self, band: usize) -> Option<f64> {
        self.maxs.get(band).copied().flatten()
    }

    pub fn observed_range(&self, band: usize) -> Option<(f64, f64)> {
        Some((self.observed_min(band)?, self.observed_max(band)?))
    }

    /// Sample at a pixel index. NaN means no data.
    pub fn value(&self, band: usize, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.bands.get(band)?.get(row * self.width + col).copied()
    }

    /// Sample at a coordinate in the raster's CRS.
    ///
    /// Returns `None` outside the raster. A NaN result means no data.
    pub fn sample(&self, band: usize, x: f64, y: f64, method: ResampleMethod) -> Option<f64> {
        let t = &self.transform;
        let px = (x - t.origin_x) / t.pixel_width;
        let py = (t.origin_y - y) / t.pixel_height;
        if !(px >= 0.0 && py >= 0.0 && px < self.width as f64 && py < self.height as f64) {
            return None;
        }

        let nearest = self.value(band, px as usize, py as usize)? as f64;
        match method {
            ResampleMethod::Nearest => Some(nearest),
            ResampleMethod::Bilinear => Some(self.bilinear(band, px, py).unwrap_or(nearest)),
        }
    }

    /// Sample at a lon/lat position.
    pub fn sample_lon_lat(
        &self,
        band: usize,
        lon: f64,
        lat: f64,
        method: ResampleMethod,
    ) -> Option<f64> {
        let (x, y) = self.crs.from_lon_lat(lon, lat);
        self.sample(band, x, y, method)
    }

    /// Interpolate between the four surrounding pixel centres. `None` if any of
    /// them is no-data.
    fn bilinear(&self, band: usize, px: f64, py: f64) -> Option<f64> {
        let max_x = (self.width - 1) as f64;
        let max_y = (self.height - 1) as f64;
        let cx = (px - 0.5).clamp(0.0, max_x);
        let cy = (py - 0.5).clamp(0.0, max_y);

        let x1 = cx.floor() as usize;
        let y1 = cy.floor() as usize;
        let x2 = (x1 + 1).min(self.width - 1);
        let y2 = (y1 + 1).min(self.height - 1);
        let dx = cx - x1 as f64;
        let dy = cy - y1 as f64;

        let v11 = self.value(band, x1, y1)? as f64;
        let v21 = self.value(band, x2, y1)? as f64;
        let v12 = self.value(band, x1, y2)? as f64;
        let v22 = self.value(band, x2, y2)? as f64;
        if [v11, v21, v12, v22].iter().any(|v| v.is_nan()) {
            return None;
        }

        let v1 = v11 * (1.0 - dx) + v21 * dx;
        let v2 = v12 * (1.0 - dx) + v22 * dx;
        Some(v1 * (1.0 - dy) + v2 * dy)
    }
}

fn observed_range(samples: &[f32]) -> (Option<f64>, Option<f64>) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut any = false;
    for &v in samples.iter().filter(|v| v.is_finite()) {
        any = true;
        min = min.min(v);
        max = max.max(v);
    }
    if any {
        (Some(min as f64), Some(max as f64))
    } else {
        (None, None)
    }
}

/// A decoded dataset together with the statistics that came with it.
#[derive(Debug, Clone)]
pub struct FetchedRaster {
    pub dataset: Arc<RasterDataset>,
    pub stats: BandStatistics,
}

impl FetchedRaster {
    pub fn new(dataset: RasterDataset, stats: BandStatistics) -> Self {
        Self {
            dataset: Arc::new(dataset),
            stats,
        }
    }
}
