//! Double-encrypted, expiring record format
//!
//! ```text
//! freeze:  value ─encode─► deflate ─encrypt(inner key, secondary)─► data
//!          {data, expires} ─encode─► encrypt(service secret, primary) ─► bytes
//! thaw:    the reverse, failing with `Expired` once `expires` has passed
//! ```
//!
//! Expiration is evaluated only at thaw time. Expired bytes may linger in
//! storage but are never returned.

use std::io::{Read, Write};

use chrono::{DateTime, TimeDelta, Utc};
use flate2::{Compression, read::DeflateDecoder, write::DeflateEncoder};
use opentoken_crypto::{Suite, decrypt, encrypt};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use zeroize::Zeroizing;

use crate::{
    codec,
    env::Environment,
    error::FreezeError,
    secret::ServiceSecret,
};

/// Ceiling on inflated record size.
pub const MAX_INFLATED_LEN: usize = 64 * 1024 * 1024;

/// Outer document, visible only after the service-secret layer is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrozenRecord {
    /// Inner envelope, keyed by the record owner
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
    /// Instant after which the record reads as absent
    pub expires: DateTime<Utc>,
}

/// Caller options for a single freeze.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreezeOptions {
    /// Requested expiration; capped at `now + max_lifetime`
    pub expires: Option<DateTime<Utc>>,
}

impl FreezeOptions {
    /// Expire at `expires` (or earlier, if that exceeds the ceiling).
    pub fn expiring_at(expires: DateTime<Utc>) -> Self {
        Self { expires: Some(expires) }
    }
}

/// Resolved suites and lifetime ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezeConfig {
    /// Outer layer, keyed by the service secret
    pub primary: Suite,
    /// Inner layer, keyed by the record owner
    pub secondary: Suite,
    /// Longest lifetime any record may be given
    pub max_lifetime: TimeDelta,
}

/// Freezes and thaws records.
///
/// Cheap to clone; clones share the service secret.
#[derive(Clone)]
pub struct Freezer<E: Environment> {
    config: FreezeConfig,
    secret: ServiceSecret,
    env: E,
}

impl<E: Environment> Freezer<E> {
    /// Create a freezer over an explicitly loaded service secret.
    pub fn new(config: FreezeConfig, secret: ServiceSecret, env: E) -> Self {
        Self { config, secret, env }
    }

    /// Configuration in use.
    pub fn config(&self) -> &FreezeConfig {
        &self.config
    }

    /// Environment in use.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Encode `value` and freeze it.
    pub fn freeze<T: Serialize + ?Sized>(
        &self,
        value: &T,
        inner_key: &[u8],
        options: FreezeOptions,
    ) -> Result<Vec<u8>, FreezeError> {
        self.freeze_bytes(codec::encode(value)?, inner_key, options)
    }

    /// Thaw and decode a value.
    pub fn thaw<T: DeserializeOwned>(
        &self,
        frozen: &[u8],
        inner_key: &[u8],
    ) -> Result<T, FreezeError> {
        let encoded = self.thaw_bytes(frozen, inner_key)?;
        Ok(codec::decode(&encoded)?)
    }

    /// Freeze an already-encoded value.
    ///
    /// The encoded bytes are consumed and zeroized.
    pub fn freeze_bytes(
        &self,
        encoded: Vec<u8>,
        inner_key: &[u8],
        options: FreezeOptions,
    ) -> Result<Vec<u8>, FreezeError> {
        let encoded = Zeroizing::new(encoded);
        let compressed = deflate(&encoded)?;

        let inner_iv = self.iv(&self.config.secondary);
        let data = encrypt(compressed, inner_key, &self.config.secondary, &inner_iv)?;

        let expires = self.expiration(options)?;
        let document = codec::encode(&FrozenRecord { data, expires })?;

        let outer_iv = self.iv(&self.config.primary);
        Ok(encrypt(document, self.secret.expose(), &self.config.primary, &outer_iv)?)
    }

    /// Thaw to the encoded value bytes.
    ///
    /// # Errors
    ///
    /// - `Expired`: authenticated, but `expires` is before now
    /// - `Crypto`: either envelope failed (wrong inner key, tampering)
    pub fn thaw_bytes(&self, frozen: &[u8], inner_key: &[u8]) -> Result<Vec<u8>, FreezeError> {
        let document = Zeroizing::new(decrypt(frozen, self.secret.expose())?);
        let record: FrozenRecord = codec::decode(&document)?;

        let now = self.env.wall_clock();
        if record.expires < now {
            tracing::debug!(expires = %record.expires, "discarding expired record");
            return Err(FreezeError::Expired { expires: record.expires });
        }

        let compressed = Zeroizing::new(decrypt(&record.data, inner_key)?);
        inflate(&compressed)
    }

    fn expiration(&self, options: FreezeOptions) -> Result<DateTime<Utc>, FreezeError> {
        let ceiling = self
            .env
            .wall_clock()
            .checked_add_signed(self.config.max_lifetime)
            .ok_or(FreezeError::LifetimeOutOfRange)?;
        Ok(options.expires.map_or(ceiling, |requested| requested.min(ceiling)))
    }

    fn iv(&self, suite: &Suite) -> Vec<u8> {
        let mut iv = vec![0u8; suite.cipher.iv_len()];
        self.env.random_bytes(&mut iv);
        iv
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, FreezeError> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(|e| FreezeError::Compression(e.to_string()))?;
    encoder.finish().map_err(|e| FreezeError::Compression(e.to_string()))
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, FreezeError> {
    let mut out = Vec::new();
    DeflateDecoder::new(data)
        .take(MAX_INFLATED_LEN as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| FreezeError::Compression(e.to_string()))?;
    if out.len() > MAX_INFLATED_LEN {
        return Err(FreezeError::TooLarge { limit: MAX_INFLATED_LEN });
    }
    Ok(out)
}
