//! Method configuration and its resolved form
//!
//! Configuration names algorithms by string. Resolution turns those names
//! into registry descriptors once, so encryption never re-parses strings.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{
    error::{AlgorithmField, CryptoError},
    kdf,
    registry::{self, CipherDescriptor, DigestDescriptor, HashFunction},
};

/// Ceiling on PBKDF2 iterations, applied to configs and headers alike.
pub const MAX_ITERATIONS: u32 = 1000;

/// Size of the derived HMAC key in bytes.
pub const HMAC_KEY_BYTES: usize = 32;

fn default_iterations() -> u32 {
    MAX_ITERATIONS
}

/// One `{algorithm, digest, iterations}` method as written in configuration.
///
/// For an HMAC method `algorithm` is a digest name; for a cipher method it
/// is a cipher name. `digest` always names the PBKDF2 digest for the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodConfig {
    /// Algorithm name
    pub algorithm: String,
    /// Key derivation digest name
    pub digest: String,
    /// Key derivation iterations, clamped to `1..=MAX_ITERATIONS`
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

impl MethodConfig {
    /// Build a method config from borrowed names.
    pub fn new(algorithm: &str, digest: &str, iterations: u32) -> Self {
        Self { algorithm: algorithm.to_string(), digest: digest.to_string(), iterations }
    }
}

/// HMAC plus cipher method pair, as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Authentication method
    pub hmac: MethodConfig,
    /// Encryption method
    pub cipher: MethodConfig,
}

impl SuiteConfig {
    /// Resolve both methods against the registry.
    ///
    /// # Errors
    ///
    /// - `UnknownAlgorithmName` naming the field whose name is not registered
    /// - `UnsupportedAlgorithm` for reserved entries
    pub fn resolve(&self) -> Result<Suite, CryptoError> {
        Ok(Suite {
            hmac: HmacMethod::from_config(&self.hmac)?,
            cipher: CipherMethod::from_config(&self.cipher)?,
        })
    }
}

fn clamp_iterations(iterations: u32) -> u32 {
    iterations.clamp(1, MAX_ITERATIONS)
}

/// Resolved HMAC method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HmacMethod {
    algorithm: &'static DigestDescriptor,
    function: HashFunction,
    key_digest: &'static DigestDescriptor,
    key_function: HashFunction,
    iterations: u32,
}

impl HmacMethod {
    /// Build from descriptors, clamping `iterations`.
    pub fn new(
        algorithm: &'static DigestDescriptor,
        key_digest: &'static DigestDescriptor,
        iterations: u32,
    ) -> Result<Self, CryptoError> {
        Ok(Self {
            algorithm,
            function: algorithm.function_for(AlgorithmField::HmacAlgorithm)?,
            key_digest,
            key_function: key_digest.function_for(AlgorithmField::HmacKeyDigest)?,
            iterations: clamp_iterations(iterations),
        })
    }

    /// Resolve from configuration names.
    pub fn from_config(config: &MethodConfig) -> Result<Self, CryptoError> {
        Self::new(
            registry::resolve_digest(&config.algorithm, AlgorithmField::HmacAlgorithm)?,
            registry::resolve_digest(&config.digest, AlgorithmField::HmacKeyDigest)?,
            config.iterations,
        )
    }

    /// HMAC digest.
    pub fn algorithm(&self) -> &'static DigestDescriptor {
        self.algorithm
    }

    /// Key derivation digest.
    pub fn key_digest(&self) -> &'static DigestDescriptor {
        self.key_digest
    }

    /// Clamped key derivation iterations.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub(crate) fn derive_key(&self, key_source: &[u8]) -> Zeroizing<Vec<u8>> {
        kdf::derive_key(self.key_function, key_source, b"", self.iterations, HMAC_KEY_BYTES)
    }

    pub(crate) fn mac(&self, key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, CryptoError> {
        kdf::compute_hmac(self.function, key, parts)
    }
}

/// Resolved cipher method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherMethod {
    algorithm: &'static CipherDescriptor,
    key_digest: &'static DigestDescriptor,
    key_function: HashFunction,
    iterations: u32,
}

impl CipherMethod {
    /// Build from descriptors, clamping `iterations`.
    pub fn new(
        algorithm: &'static CipherDescriptor,
        key_digest: &'static DigestDescriptor,
        iterations: u32,
    ) -> Result<Self, CryptoError> {
        algorithm.suite_for(AlgorithmField::CipherAlgorithm)?;
        Ok(Self {
            algorithm,
            key_digest,
            key_function: key_digest.function_for(AlgorithmField::CipherKeyDigest)?,
            iterations: clamp_iterations(iterations),
        })
    }

    /// Resolve from configuration names.
    pub fn from_config(config: &MethodConfig) -> Result<Self, CryptoError> {
        Self::new(
            registry::resolve_cipher(&config.algorithm, AlgorithmField::CipherAlgorithm)?,
            registry::resolve_digest(&config.digest, AlgorithmField::CipherKeyDigest)?,
            config.iterations,
        )
    }

    /// Cipher.
    pub fn algorithm(&self) -> &'static CipherDescriptor {
        self.algorithm
    }

    /// Key derivation digest.
    pub fn key_digest(&self) -> &'static DigestDescriptor {
        self.key_digest
    }

    /// Clamped key derivation iterations.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// IV size the caller must supply to [`crate::encrypt`].
    pub fn iv_len(&self) -> usize {
        self.algorithm.iv_bytes
    }

    pub(crate) fn derive_key(&self, key_source: &[u8]) -> Zeroizing<Vec<u8>> {
        kdf::derive_key(
            self.key_function,
            key_source,
            b"",
            self.iterations,
            self.algorithm.key_bytes,
        )
    }
}

/// Fully resolved envelope parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suite {
    /// Authentication method
    pub hmac: HmacMethod,
    /// Encryption method
    pub cipher: CipherMethod,
}
