//! Server error types.

use opentoken_core::SecretError;
use opentoken_crypto::CryptoError;
use thiserror::Error;

use crate::{config::ConfigError, records::RecordError, storage::StorageError};

/// Errors that stop a server command.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration is unreadable or invalid. Fix and restart.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Service secret could not be loaded.
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),

    /// Storage backend could not be opened.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A record operation failed.
    #[error("record error: {0}")]
    Record(#[from] RecordError),

    /// Signing a request failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Local I/O (secret generation, output) failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Command-line input is invalid.
    #[error("invalid input: {0}")]
    Input(String),
}
