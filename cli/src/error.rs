//! CLI error types.

use cmk_core::ApiError;
use thiserror::Error;

/// Everything that can end a `cmkclient` run.
#[derive(Debug, Error)]
pub enum CliError {
    /// The web API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Credentials or endpoint missing.
    #[error("{0}")]
    Config(String),
    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
