//! Storage errors

use thiserror::Error;

/// Errors from a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Backend I/O failed
    #[error("storage I/O error: {0}")]
    Io(String),

    /// Stored bytes could not be encoded or decoded
    #[error("storage serialization error: {0}")]
    Serialization(String),

    /// Blocking task was cancelled or panicked
    #[error("storage task failed: {0}")]
    Task(String),
}

impl StorageError {
    /// Whether retrying the same operation may succeed.
    ///
    /// Retry policy belongs to the caller; the record store never retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Task(_))
    }
}
