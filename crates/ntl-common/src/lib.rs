//! Common types and utilities shared across the night-light comparison viewer.

pub mod bbox;
pub mod color;
pub mod crs;
pub mod error;
pub mod product;
pub mod stats;
pub mod surface;
pub mod tile;
pub mod viewport;

pub use bbox::BoundingBox;
pub use color::{InterpolationMode, Rgba};
pub use crs::CrsCode;
pub use error::{ViewerError, ViewerResult};
pub use product::{ProductType, RasterRoute};
pub use stats::BandStatistics;
pub use surface::{
    AttachmentId, Corner, HeadlessSurface, MapControl, MapSurface, SurfaceEvent, SurfaceHandle,
    TileSource, ViewOptions, ViewOrigin,
};
pub use tile::{TileCoord, TileRange};
pub use viewport::{LatLng, ViewportState};
