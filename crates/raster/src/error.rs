//! Error types for raster decoding.

use ntl_common::ViewerError;
use thiserror::Error;

/// Result type for raster operations.
pub type RasterResult<T> = Result<T, RasterError>;

#[derive(Error, Debug)]
pub enum RasterError {
    /// The TIFF container itself could not be read
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// No ModelPixelScale/ModelTiepoint or ModelTransformation tags
    #[error("Missing georeferencing: {0}")]
    MissingGeoreference(String),

    /// Structurally valid TIFF whose content we cannot interpret
    #[error("Invalid raster format: {0}")]
    InvalidFormat(String),

    #[error("Raster has no pixels")]
    Empty,
}

impl From<RasterError> for ViewerError {
    fn from(err: RasterError) -> Self {
        ViewerError::decode(err)
    }
}
