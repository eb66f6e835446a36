use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] keep_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(
        "Username and password are required. Pass --username/--password, set KEEP_USERNAME/KEEP_PASSWORD, or add them to config.yaml."
    )]
    MissingCredentials,
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
