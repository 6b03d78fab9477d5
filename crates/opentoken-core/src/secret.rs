//! Process-wide service secret (the outer freeze key)
//!
//! Loaded once at startup and shared immutably. The bytes are zeroized when
//! the last handle is dropped and never appear in `Debug` output.

use std::{fmt, path::Path, sync::Arc};

use zeroize::Zeroizing;

use crate::{env::Environment, error::SecretError};

/// Default size of a generated secret in bytes.
pub const DEFAULT_SECRET_LEN: usize = 64;

/// Shared, read-only service secret.
#[derive(Clone)]
pub struct ServiceSecret {
    bytes: Arc<Zeroizing<Vec<u8>>>,
}

impl ServiceSecret {
    /// Wrap secret bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes: Arc::new(Zeroizing::new(bytes)) }
    }

    /// Read the secret from a file, using its raw contents.
    pub fn load(path: &Path) -> Result<Self, SecretError> {
        let bytes = std::fs::read(path)
            .map_err(|source| SecretError::Io { path: path.display().to_string(), source })?;
        if bytes.is_empty() {
            return Err(SecretError::Empty { path: path.display().to_string() });
        }
        tracing::info!(path = %path.display(), len = bytes.len(), "loaded service secret");
        Ok(Self::from_bytes(bytes))
    }

    /// Fresh random secret of `len` bytes.
    pub fn generate<E: Environment>(env: &E, len: usize) -> Self {
        let mut bytes = vec![0u8; len];
        env.random_bytes(&mut bytes);
        Self::from_bytes(bytes)
    }

    /// Secret bytes, for use as an envelope key source.
    pub fn expose(&self) -> &[u8] {
        &self.bytes
    }

    /// Secret length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ServiceSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceSecret").field("len", &self.bytes.len()).finish_non_exhaustive()
    }
}
