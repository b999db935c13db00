//! Local key-value persistence for the console client.
//!
//! This crate provides the storage collaborator the reconciler persists its
//! snapshot through:
//! - **FileStore**: one file per key under a directory, written atomically
//! - **MemoryStore**: in-process map for tests and ephemeral sessions

mod file;
mod memory;
mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::KeyValueStore;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Key contains characters that cannot be mapped to a file name
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Stored bytes are not valid UTF-8
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Backend refused the write (quota, read-only, injected failure)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Check that a key is non-empty and limited to `[A-Za-z0-9._-]`.
pub fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_key_accepts_namespaced_names() {
        assert!(validate_key("chat_history").is_ok());
        assert!(validate_key("console.chat-history.v1").is_ok());
    }

    #[test]
    fn validate_key_rejects_paths_and_empty() {
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key(".hidden").is_err());
        assert!(validate_key("with space").is_err());
    }
}
