//! Access-code secret lookup

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::error::LookupError;

/// Shared signing secret behind an access code.
#[derive(Clone)]
pub struct AccessSecret {
    secret: Arc<Zeroizing<Vec<u8>>>,
}

impl AccessSecret {
    /// Wrap secret bytes.
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret: Arc::new(Zeroizing::new(secret)) }
    }

    /// Secret bytes, used as the HMAC key.
    pub fn expose(&self) -> &[u8] {
        &self.secret
    }
}

impl fmt::Debug for AccessSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessSecret(..)")
    }
}

/// Resolves `(account ID, access code)` to a signing secret.
#[async_trait]
pub trait AccessCodeStore: Send + Sync {
    /// `Ok(None)` when the pair does not resolve, for any reason.
    async fn resolve(
        &self,
        account_id: &str,
        access_code: &str,
    ) -> Result<Option<AccessSecret>, LookupError>;
}

/// In-memory store for tests and local tooling.
#[derive(Clone, Default)]
pub struct MemoryAccessCodes {
    codes: Arc<Mutex<HashMap<(String, String), AccessSecret>>>,
}

impl MemoryAccessCodes {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a code.
    #[allow(clippy::expect_used)]
    pub fn insert(&self, account_id: &str, access_code: &str, secret: AccessSecret) {
        self.codes
            .lock()
            .expect("Mutex poisoned")
            .insert((account_id.to_string(), access_code.to_string()), secret);
    }
}

#[async_trait]
impl AccessCodeStore for MemoryAccessCodes {
    #[allow(clippy::expect_used)]
    async fn resolve(
        &self,
        account_id: &str,
        access_code: &str,
    ) -> Result<Option<AccessSecret>, LookupError> {
        let codes = self.codes.lock().expect("Mutex poisoned");
        Ok(codes.get(&(account_id.to_string(), access_code.to_string())).cloned())
    }
}
