//! Error types for algorithm resolution and envelope processing

use std::fmt;

use thiserror::Error;

/// Algorithm slot of an envelope that was being resolved.
///
/// Ciphers and digests share one numeric code space, so every resolution
/// error names the slot it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmField {
    /// Digest used for the record HMAC
    HmacAlgorithm,
    /// Digest used by PBKDF2 to derive the HMAC key
    HmacKeyDigest,
    /// Block cipher and mode
    CipherAlgorithm,
    /// Digest used by PBKDF2 to derive the cipher key
    CipherKeyDigest,
}

impl fmt::Display for AlgorithmField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::HmacAlgorithm => "HMAC algorithm",
            Self::HmacKeyDigest => "HMAC key digest",
            Self::CipherAlgorithm => "cipher algorithm",
            Self::CipherKeyDigest => "cipher key digest",
        };
        f.write_str(label)
    }
}

/// Errors from registry lookups and envelope encryption/decryption.
///
/// All variants fail closed. None of them are retryable: the same input
/// always produces the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Configured algorithm name is not in the registry
    #[error("Unknown {field}: {name}")]
    UnknownAlgorithmName {
        /// Slot being resolved
        field: AlgorithmField,
        /// Name as configured
        name: String,
    },

    /// Header carries a code that is not in the registry
    #[error("Unknown {field} code: {code}")]
    UnknownAlgorithmCode {
        /// Slot being resolved
        field: AlgorithmField,
        /// Code as read from the header
        code: u8,
    },

    /// Algorithm is registered but this build cannot execute it
    #[error("Unsupported {field}: {name}")]
    UnsupportedAlgorithm {
        /// Slot being resolved
        field: AlgorithmField,
        /// Registered name
        name: &'static str,
    },

    /// First header byte is not a known version
    #[error("Invalid header version")]
    InvalidVersion {
        /// Version byte found
        version: u8,
    },

    /// Record ends before the header, HMAC or IV is complete
    #[error("Truncated ciphertext record: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required to continue parsing
        needed: usize,
        /// Bytes present
        available: usize,
    },

    /// Embedded HMAC does not match the recomputed one
    #[error("HMAC invalid")]
    HmacInvalid,

    /// Authenticated payload disagrees with the declared length
    #[error("Ciphertext length mismatch: header declares {declared}, record holds {actual}")]
    LengthMismatch {
        /// Length from the header
        declared: u32,
        /// Bytes actually following the IV
        actual: usize,
    },

    /// Caller-provided IV does not fit the cipher
    #[error("IV must be {expected} bytes, got {actual}")]
    InvalidIvLength {
        /// Cipher's IV size
        expected: usize,
        /// Size provided
        actual: usize,
    },

    /// Key does not fit the cipher
    #[error("Invalid key length for {algorithm}")]
    InvalidKeyLength {
        /// Cipher name
        algorithm: &'static str,
    },

    /// Ciphertext does not fit in the header's 32-bit length field
    #[error("Ciphertext too large: {len} bytes")]
    TooLarge {
        /// Ciphertext size
        len: usize,
    },

    /// Authenticated ciphertext failed to decrypt (bad padding)
    #[error("Decryption failed")]
    DecryptionFailed,
}

impl CryptoError {
    /// Short opaque code for client-facing error references.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownAlgorithmName { .. } => "C100",
            Self::UnknownAlgorithmCode { .. } => "C101",
            Self::UnsupportedAlgorithm { .. } => "C102",
            Self::InvalidVersion { .. } => "C103",
            Self::Truncated { .. } => "C104",
            Self::HmacInvalid => "C105",
            Self::LengthMismatch { .. } => "C106",
            Self::InvalidIvLength { .. } => "C107",
            Self::InvalidKeyLength { .. } => "C108",
            Self::TooLarge { .. } => "C109",
            Self::DecryptionFailed => "C110",
        }
    }

    /// Configuration errors are detected while resolving method configs.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::UnknownAlgorithmName { .. })
    }

    /// Crypto errors are never transient.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_messages_are_exact() {
        assert_eq!(CryptoError::HmacInvalid.to_string(), "HMAC invalid");
        assert_eq!(CryptoError::InvalidVersion { version: 7 }.to_string(), "Invalid header version");
    }

    #[test]
    fn resolution_errors_name_the_field() {
        let err = CryptoError::UnknownAlgorithmCode { field: AlgorithmField::CipherKeyDigest, code: 200 };
        assert_eq!(err.to_string(), "Unknown cipher key digest code: 200");

        let err = CryptoError::UnknownAlgorithmName {
            field: AlgorithmField::HmacAlgorithm,
            name: "sha3".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown HMAC algorithm: sha3");
    }

    #[test]
    fn codes_are_distinct() {
        let errors = [
            CryptoError::UnknownAlgorithmName { field: AlgorithmField::HmacAlgorithm, name: String::new() },
            CryptoError::UnknownAlgorithmCode { field: AlgorithmField::HmacAlgorithm, code: 0 },
            CryptoError::UnsupportedAlgorithm { field: AlgorithmField::HmacAlgorithm, name: "" },
            CryptoError::InvalidVersion { version: 1 },
            CryptoError::Truncated { needed: 0, available: 0 },
            CryptoError::HmacInvalid,
            CryptoError::LengthMismatch { declared: 0, actual: 0 },
            CryptoError::InvalidIvLength { expected: 0, actual: 0 },
            CryptoError::InvalidKeyLength { algorithm: "" },
            CryptoError::TooLarge { len: 0 },
            CryptoError::DecryptionFailed,
        ];
        let mut codes: Vec<_> = errors.iter().map(CryptoError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(errors.iter().all(|e| !e.is_retryable()));
    }
}
