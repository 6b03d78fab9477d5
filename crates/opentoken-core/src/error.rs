//! Error types for the record core

use chrono::{DateTime, Utc};
use opentoken_crypto::CryptoError;
use thiserror::Error;

/// Value codec failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Value could not be encoded
    #[error("encode failed: {0}")]
    Encode(String),

    /// Bytes are not a valid encoding of the requested type
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Freeze/thaw failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FreezeError {
    /// Record authenticated but its expiration has passed
    #[error("Expired")]
    Expired {
        /// Expiration recorded in the frozen document
        expires: DateTime<Utc>,
    },

    /// Envelope layer failed (HMAC, header, algorithm resolution)
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Value or frozen document codec failed
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Deflate stream could not be produced or read
    #[error("compression failed: {0}")]
    Compression(String),

    /// Inflated data exceeds the decompression ceiling
    #[error("decompressed record exceeds {limit} bytes")]
    TooLarge {
        /// Ceiling in bytes
        limit: usize,
    },

    /// Expiration falls outside the representable time range
    #[error("record lifetime out of range")]
    LifetimeOutOfRange,
}

impl FreezeError {
    /// Short opaque code for client-facing error references.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Expired { .. } => "F300",
            Self::Crypto(e) => e.code(),
            Self::Codec(CodecError::Encode(_)) => "F301",
            Self::Codec(CodecError::Decode(_)) => "F302",
            Self::Compression(_) => "F303",
            Self::TooLarge { .. } => "F304",
            Self::LifetimeOutOfRange => "F305",
        }
    }

    /// An expired record is indistinguishable from an absent one to readers.
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired { .. })
    }
}

/// Storage key derivation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// No identifier segments were supplied
    #[error("at least one identifier is required")]
    NoIdentifiers,

    /// Record class has no hash configs to cycle through
    #[error("record class {class} has no hash configs")]
    NoHashConfigs {
        /// Record class name
        class: String,
    },

    /// Hash config names a digest that is not registered
    #[error("unknown hash digest: {name}")]
    UnknownDigest {
        /// Configured name
        name: String,
    },

    /// Hash config names a reserved digest
    #[error("unsupported hash digest: {name}")]
    UnsupportedDigest {
        /// Configured name
        name: String,
    },

    /// Iterations or length is zero
    #[error("hash config {field} must be at least 1")]
    ZeroParameter {
        /// `iterations` or `length`
        field: &'static str,
    },

    /// Derived length exceeds what one address segment may carry
    #[error("hash config length {length} exceeds {max} bytes")]
    LengthTooLarge {
        /// Configured length
        length: usize,
        /// Largest accepted length
        max: usize,
    },

    /// Identifier tuple could not be encoded as an inner key
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Service secret loading failures.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Secret file could not be read
    #[error("cannot read secret file {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Secret file is empty
    #[error("secret file {path} is empty")]
    Empty {
        /// File path
        path: String,
    },
}
