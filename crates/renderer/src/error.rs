//! Error types for rendering.

use ntl_common::ViewerError;
use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Invalid palette: {0}")]
    InvalidPalette(String),

    #[error("Invalid scale domain [{min}, {max}]")]
    InvalidDomain { min: f64, max: f64 },

    /// No finite statistics and no finite samples to derive a domain from
    #[error("Band {band} has no finite values")]
    NoFiniteValues { band: usize },

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("Font error: {0}")]
    Font(String),
}

impl From<RenderError> for ViewerError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::InvalidPalette(message) => ViewerError::validation("palette", message),
            RenderError::InvalidDomain { .. } | RenderError::NoFiniteValues { .. } => {
                ViewerError::decode(err)
            }
            RenderError::Encode(_) | RenderError::Font(_) => ViewerError::Io(err.to_string()),
        }
    }
}
