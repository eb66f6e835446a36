//! Error types for keep-core

use thiserror::Error;

use crate::remote::RemoteError;

/// Result type alias using keep-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in keep-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// The remote note service rejected or failed a request
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Cached state could not be restored into a session
    #[error("Invalid cached state: {0}")]
    InvalidState(String),
}
