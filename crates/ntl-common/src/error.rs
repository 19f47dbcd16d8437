//! Error types for the comparison viewer.

use thiserror::Error;

/// Result type alias using ViewerError.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Primary error type for viewer operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewerError {
    // === Fetch Errors ===
    #[error("Request failed for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to decode raster: {cause}")]
    Decode { cause: String },

    // === Input Errors ===
    #[error("Invalid value for '{param}': {message}")]
    Validation { param: String, message: String },

    #[error("Corrupt persisted configuration: {0}")]
    ConfigDeserialization(String),

    #[error("Product not supported: {0}")]
    Unsupported(String),

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(String),
}

impl ViewerError {
    pub fn decode(cause: impl std::fmt::Display) -> Self {
        ViewerError::Decode {
            cause: cause.to_string(),
        }
    }

    pub fn validation(param: impl Into<String>, message: impl Into<String>) -> Self {
        ViewerError::Validation {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Short category label used in logs and slot error overlays.
    pub fn category(&self) -> &'static str {
        match self {
            ViewerError::Network { .. } | ViewerError::HttpStatus { .. } => "NetworkError",
            ViewerError::Decode { .. } => "DecodeError",
            ViewerError::Validation { .. } => "ValidationError",
            ViewerError::ConfigDeserialization(_) => "ConfigDeserializationError",
            ViewerError::Unsupported(_) => "Unsupported",
            ViewerError::Io(_) => "IoError",
        }
    }

    /// Whether re-issuing the same request can plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ViewerError::Network { .. } | ViewerError::Decode { .. } => true,
            ViewerError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for ViewerError {
    fn from(err: std::io::Error) -> Self {
        ViewerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        ViewerError::ConfigDeserialization(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let err = ViewerError::HttpStatus {
            url: "/compare/x".into(),
            status: 502,
        };
        assert_eq!(err.category(), "NetworkError");
        assert!(err.is_retryable());

        let err = ViewerError::HttpStatus {
            url: "/compare/x".into(),
            status: 404,
        };
        assert!(!err.is_retryable());

        assert_eq!(ViewerError::decode("bad magic").category(), "DecodeError");
        assert_eq!(
            ViewerError::validation("date", "not a date").category(),
            "ValidationError"
        );
    }

    #[test]
    fn test_decode_keeps_cause() {
        let err = ViewerError::decode("unexpected end of file");
        assert_eq!(
            err.to_string(),
            "Failed to decode raster: unexpected end of file"
        );
    }
}
