//! Configuration errors.

use std::path::PathBuf;

use ntl_common::ViewerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for ViewerError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Read { .. } => ViewerError::Io(err.to_string()),
            other => ViewerError::ConfigDeserialization(other.to_string()),
        }
    }
}
