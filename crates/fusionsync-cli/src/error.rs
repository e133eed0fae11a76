use std::io;

use fusionsync_core::ResourceId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] fusionsync_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Upload of {0} failed")]
    UploadFailed(ResourceId),
    #[error("No existing lambdas were linked")]
    NoLinkedLambdas,
}

impl CliError {
    /// Core error behind this failure, if any.
    pub const fn core(&self) -> Option<&fusionsync_core::Error> {
        match self {
            Self::Core(error) => Some(error),
            _ => None,
        }
    }
}
