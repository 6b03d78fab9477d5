//! Storage key derivation
//!
//! Each identifier segment is stretched with PBKDF2 into an irreversible
//! address component. The unhashed identifier tuple doubles as the inner
//! freeze key, so the storage address never reveals what it decrypts with.

use chrono::TimeDelta;
use opentoken_crypto::{HashFunction, derive_key, registry};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{codec, error::KeyError};

/// Largest derived length per address segment, in bytes.
pub const MAX_SEGMENT_LENGTH: usize = 64;

/// One address hashing step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashConfig {
    digest: &'static str,
    function: HashFunction,
    iterations: u32,
    salt: Vec<u8>,
    length: usize,
}

impl HashConfig {
    /// Resolve a digest name and validate parameters.
    pub fn new(
        digest: &str,
        iterations: u32,
        salt: impl Into<Vec<u8>>,
        length: usize,
    ) -> Result<Self, KeyError> {
        let descriptor = registry::digest_by_name(digest)
            .ok_or_else(|| KeyError::UnknownDigest { name: digest.to_string() })?;
        let function = descriptor
            .function
            .ok_or_else(|| KeyError::UnsupportedDigest { name: digest.to_string() })?;
        if iterations == 0 {
            return Err(KeyError::ZeroParameter { field: "iterations" });
        }
        if length == 0 {
            return Err(KeyError::ZeroParameter { field: "length" });
        }
        if length > MAX_SEGMENT_LENGTH {
            return Err(KeyError::LengthTooLarge { length, max: MAX_SEGMENT_LENGTH });
        }
        Ok(Self { digest: descriptor.name, function, iterations, salt: salt.into(), length })
    }

    /// Digest name.
    pub fn digest(&self) -> &'static str {
        self.digest
    }

    /// Lowercase hex of `PBKDF2(segment, salt, iterations, length)`.
    pub fn hash(&self, segment: &str) -> String {
        let derived =
            derive_key(self.function, segment.as_bytes(), &self.salt, self.iterations, self.length);
        hex::encode(&*derived)
    }
}

/// Hash config as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashConfigSpec {
    /// Digest name
    pub digest: String,
    /// PBKDF2 iterations
    pub iterations: u32,
    /// PBKDF2 salt
    #[serde(default)]
    pub salt: String,
    /// Derived length in bytes
    pub length: usize,
}

impl HashConfigSpec {
    /// Resolve into a [`HashConfig`].
    pub fn resolve(&self) -> Result<HashConfig, KeyError> {
        HashConfig::new(&self.digest, self.iterations, self.salt.as_bytes(), self.length)
    }
}

/// Addressing and lifetime for one kind of record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordClass {
    name: String,
    prefix: String,
    lifetime: TimeDelta,
    hashes: Vec<HashConfig>,
}

impl RecordClass {
    /// Create a record class. `hashes` are applied to identifier segments
    /// round-robin.
    pub fn new(
        name: impl Into<String>,
        prefix: impl Into<String>,
        lifetime: TimeDelta,
        hashes: Vec<HashConfig>,
    ) -> Result<Self, KeyError> {
        let name = name.into();
        if hashes.is_empty() {
            return Err(KeyError::NoHashConfigs { class: name });
        }
        Ok(Self { name, prefix: prefix.into(), lifetime, hashes })
    }

    /// Class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace prepended to every address.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Lifetime given to records on write.
    pub fn lifetime(&self) -> TimeDelta {
        self.lifetime
    }

    /// Storage address for an identifier tuple.
    pub fn storage_key(&self, ids: &[&str]) -> Result<String, KeyError> {
        if ids.is_empty() {
            return Err(KeyError::NoIdentifiers);
        }
        let segments: Vec<String> = ids
            .iter()
            .zip(self.hashes.iter().cycle())
            .map(|(id, config)| config.hash(id))
            .collect();
        Ok(format!("{}{}", self.prefix, segments.join("/")))
    }
}

/// Inner freeze key for an identifier tuple.
///
/// The tuple is CBOR-encoded rather than joined, so `["a/b"]` and
/// `["a", "b"]` never share a key.
pub fn inner_key(ids: &[&str]) -> Result<Zeroizing<Vec<u8>>, KeyError> {
    if ids.is_empty() {
        return Err(KeyError::NoIdentifiers);
    }
    Ok(Zeroizing::new(codec::encode(ids)?))
}
