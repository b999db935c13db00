//! Reconciler error types.

use thiserror::Error;

/// Errors from the backend HTTP API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors raised while reconciling state.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Persistence failure
    #[error("Storage error: {0}")]
    Storage(#[from] console_storage::StorageError),

    /// Payload or snapshot could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type alias using ReconcileError.
pub type ReconcileResult<T> = Result<T, ReconcileError>;
