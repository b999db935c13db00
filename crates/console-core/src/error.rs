//! Core error types for the console client.

use thiserror::Error;

/// Errors raised while resolving the console directory and loading config.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A setting that cannot drive a session
    #[error("Invalid console config: {0}")]
    Config(String),

    /// Reading config.json or creating the console directory failed
    #[error("Config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Backend origin or poll path does not parse
    #[error("Bad backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// config.json is not valid JSON for [`crate::Config`]
    #[error("Malformed config.json: {0}")]
    Json(#[from] serde_json::Error),

    /// No home directory to place `~/.sim-console` under
    #[error("Cannot resolve console directory: {0}")]
    Path(String),
}

/// Result type alias using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
