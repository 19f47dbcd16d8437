//! Decoded raster datasets and GeoTIFF decoding.
//!
//! Decoding is pure: bytes in, [`RasterDataset`] out. Fetching lives in the
//! `client` crate.

pub mod dataset;
pub mod error;
pub mod geotiff;

pub use dataset::{FetchedRaster, GeoTransform, RasterDataset, ResampleMethod};
pub use error::{RasterError, RasterResult};
pub use geotiff::decode_geotiff;
