//! Versioned, self-describing encryption envelope
//!
//! Wire layout (all integers little-endian):
//!
//! ```text
//! offset size field
//!      0    1 version (0)
//!      1    1 HMAC algorithm code
//!      2    1 HMAC key digest code
//!      3    4 HMAC key iterations
//!      7    1 cipher algorithm code
//!      8    1 cipher key digest code
//!      9    4 cipher key iterations
//!     13    4 ciphertext length
//!     17    - HMAC ‖ IV ‖ ciphertext
//! ```
//!
//! Keys are stretched from the key source with an empty salt. Key sources
//! are random upstream, so PBKDF2 only sizes and spreads them; there is no
//! separate place a per-record salt could be kept.

use zeroize::Zeroizing;

use crate::{
    error::{AlgorithmField, CryptoError},
    kdf::constant_time_eq,
    registry,
    suite::{CipherMethod, HmacMethod, Suite},
    symmetric,
};

/// Only header version understood by this build.
pub const HEADER_VERSION: u8 = 0;

/// Size of a version 0 header.
pub const HEADER_LEN: usize = 17;

/// Parsed envelope header.
///
/// Created at encrypt time and never mutated once written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionHeader {
    /// Format version
    pub version: u8,
    /// HMAC digest code
    pub hmac_algorithm: u8,
    /// HMAC key derivation digest code
    pub hmac_key_digest: u8,
    /// HMAC key derivation iterations as recorded
    pub hmac_key_iterations: u32,
    /// Cipher code
    pub cipher_algorithm: u8,
    /// Cipher key derivation digest code
    pub cipher_key_digest: u8,
    /// Cipher key derivation iterations as recorded
    pub cipher_key_iterations: u32,
    /// Ciphertext length in bytes
    pub payload_length: u32,
}

impl EncryptionHeader {
    /// Header describing `suite` for a ciphertext of `payload_length` bytes.
    pub fn for_suite(suite: &Suite, payload_length: u32) -> Self {
        Self {
            version: HEADER_VERSION,
            hmac_algorithm: suite.hmac.algorithm().code,
            hmac_key_digest: suite.hmac.key_digest().code,
            hmac_key_iterations: suite.hmac.iterations(),
            cipher_algorithm: suite.cipher.algorithm().code,
            cipher_key_digest: suite.cipher.key_digest().code,
            cipher_key_iterations: suite.cipher.iterations(),
            payload_length,
        }
    }

    /// Serialize to the 17-byte wire form.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0] = self.version;
        out[1] = self.hmac_algorithm;
        out[2] = self.hmac_key_digest;
        out[3..7].copy_from_slice(&self.hmac_key_iterations.to_le_bytes());
        out[7] = self.cipher_algorithm;
        out[8] = self.cipher_key_digest;
        out[9..13].copy_from_slice(&self.cipher_key_iterations.to_le_bytes());
        out[13..17].copy_from_slice(&self.payload_length.to_le_bytes());
        out
    }

    /// Parse the header at the start of `record`.
    ///
    /// The version is checked before the length so that any buffer starting
    /// with an unknown version byte reports the version.
    pub fn parse(record: &[u8]) -> Result<Self, CryptoError> {
        let Some(&version) = record.first() else {
            return Err(CryptoError::Truncated { needed: HEADER_LEN, available: 0 });
        };
        if version != HEADER_VERSION {
            return Err(CryptoError::InvalidVersion { version });
        }
        if record.len() < HEADER_LEN {
            return Err(CryptoError::Truncated { needed: HEADER_LEN, available: record.len() });
        }

        Ok(Self {
            version,
            hmac_algorithm: record[1],
            hmac_key_digest: record[2],
            hmac_key_iterations: read_u32(record, 3),
            cipher_algorithm: record[7],
            cipher_key_digest: record[8],
            cipher_key_iterations: read_u32(record, 9),
            payload_length: read_u32(record, 13),
        })
    }

    /// Resolve header codes to a suite, clamping iterations.
    ///
    /// Fields are resolved in wire order and the first failure names its
    /// field.
    pub fn resolve(&self) -> Result<Suite, CryptoError> {
        let hmac_algorithm = registry::digest_by_code(self.hmac_algorithm).ok_or(
            CryptoError::UnknownAlgorithmCode {
                field: AlgorithmField::HmacAlgorithm,
                code: self.hmac_algorithm,
            },
        )?;
        let hmac_key_digest = registry::digest_by_code(self.hmac_key_digest).ok_or(
            CryptoError::UnknownAlgorithmCode {
                field: AlgorithmField::HmacKeyDigest,
                code: self.hmac_key_digest,
            },
        )?;
        let hmac = HmacMethod::new(hmac_algorithm, hmac_key_digest, self.hmac_key_iterations)?;

        let cipher_algorithm = registry::cipher_by_code(self.cipher_algorithm).ok_or(
            CryptoError::UnknownAlgorithmCode {
                field: AlgorithmField::CipherAlgorithm,
                code: self.cipher_algorithm,
            },
        )?;
        let cipher_key_digest = registry::digest_by_code(self.cipher_key_digest).ok_or(
            CryptoError::UnknownAlgorithmCode {
                field: AlgorithmField::CipherKeyDigest,
                code: self.cipher_key_digest,
            },
        )?;
        let cipher =
            CipherMethod::new(cipher_algorithm, cipher_key_digest, self.cipher_key_iterations)?;

        Ok(Suite { hmac, cipher })
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

/// Encrypt and authenticate `plaintext` under keys stretched from
/// `key_source`.
///
/// Consumes the plaintext and zeroizes it before returning. `iv` must be
/// `suite.cipher.iv_len()` bytes and, in production, freshly random.
///
/// # Errors
///
/// - `InvalidIvLength`: IV does not fit the cipher
/// - `TooLarge`: ciphertext exceeds the 32-bit length field
pub fn encrypt(
    plaintext: Vec<u8>,
    key_source: &[u8],
    suite: &Suite,
    iv: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let plaintext = Zeroizing::new(plaintext);

    let cipher_key = suite.cipher.derive_key(key_source);
    let ciphertext = symmetric::seal(suite.cipher.algorithm(), &cipher_key, iv, &plaintext)?;
    let payload_length =
        u32::try_from(ciphertext.len()).map_err(|_| CryptoError::TooLarge { len: ciphertext.len() })?;

    let header = EncryptionHeader::for_suite(suite, payload_length).to_bytes();
    let hmac_key = suite.hmac.derive_key(key_source);
    let mac = suite.hmac.mac(&hmac_key, &[header.as_slice(), iv, ciphertext.as_slice()])?;

    let mut record = Vec::with_capacity(HEADER_LEN + mac.len() + iv.len() + ciphertext.len());
    record.extend_from_slice(&header);
    record.extend_from_slice(&mac);
    record.extend_from_slice(iv);
    record.extend_from_slice(&ciphertext);
    Ok(record)
}

/// Authenticate and decrypt a record produced by [`encrypt`].
///
/// The HMAC is checked in constant time before any decryption.
///
/// # Errors
///
/// - `Truncated`: record shorter than its header
/// - `InvalidVersion`: first byte is not [`HEADER_VERSION`]
/// - `UnknownAlgorithmCode` / `UnsupportedAlgorithm`: naming the field
/// - `HmacInvalid`: wrong key source, tampered record, or a body too short
///   for the HMAC and IV the header names
/// - `LengthMismatch`: trailing bytes beyond the declared ciphertext
pub fn decrypt(record: &[u8], key_source: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let header = EncryptionHeader::parse(record)?;
    let suite = header.resolve()?;

    let mac_len = suite.hmac.algorithm().hash_length;
    let iv_len = suite.cipher.iv_len();
    // A body too short for the suite the header names cannot authenticate
    // that header.
    if record.len() < HEADER_LEN + mac_len + iv_len {
        return Err(CryptoError::HmacInvalid);
    }

    let (mac, rest) = record[HEADER_LEN..].split_at(mac_len);
    let (iv, payload) = rest.split_at(iv_len);
    let declared = header.payload_length as usize;
    let ciphertext = &payload[..declared.min(payload.len())];

    let hmac_key = suite.hmac.derive_key(key_source);
    let expected = suite.hmac.mac(&hmac_key, &[&record[..HEADER_LEN], iv, ciphertext])?;
    if !constant_time_eq(&expected, mac) {
        return Err(CryptoError::HmacInvalid);
    }

    if payload.len() != declared {
        return Err(CryptoError::LengthMismatch {
            declared: header.payload_length,
            actual: payload.len(),
        });
    }

    let cipher_key = suite.cipher.derive_key(key_source);
    symmetric::open(suite.cipher.algorithm(), &cipher_key, iv, ciphertext)
}
