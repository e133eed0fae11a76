//! Error types for fusionsync-core

use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiError;

/// Result type alias using fusionsync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fusionsync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Remote API error (transport or server-side validation)
    #[error(transparent)]
    Api(#[from] ApiError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Resource not found on the server or on disk
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The server returned a payload we could not interpret
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Missing or invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem watcher failure
    #[error("Watch error: {0}")]
    Watch(String),

    /// A path could not be read or written
    #[error("{path}: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Attach the offending path to an IO error.
    pub fn at_path(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Path {
            path: path.into(),
            source,
        }
    }

    /// Structured remote errors, when the failure came from the server.
    pub const fn remote_errors(&self) -> Option<&crate::api::ApiErrors> {
        match self {
            Self::Api(ApiError::Remote { errors, .. }) => Some(errors),
            _ => None,
        }
    }
}
