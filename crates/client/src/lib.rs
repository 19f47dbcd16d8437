//! HTTP access to the night-light backend.
//!
//! - [`RasterFetcher`]: raster payloads plus percentile headers, decoded and
//!   cached by URL
//! - [`ApiClient`]: dates, per-region dates and administrative boundaries

pub mod api;
pub mod config;
pub mod fetcher;

pub use api::{ApiClient, BoundaryResolution};
pub use config::{ApiConfig, EndpointPaths};
pub use fetcher::{parse_band_statistics, with_nocache, FetchMode, RasterFetcher, RasterSource};
