//! Access codes backed by the record store
//!
//! Each code is a frozen record keyed by `[account_id, access_code]`, so a
//! code only resolves for the account it was issued to and the backend never
//! sees either value in clear.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opentoken_auth::{AccessCodeStore, AccessSecret, LookupError};
use opentoken_core::Environment;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::{
    records::{RecordError, RecordStore},
    storage::Storage,
};

/// Record class access codes are stored under by default.
pub const ACCESS_CODE_CLASS: &str = "access_code";

/// Random bytes behind a generated access code (hex encoded on issue).
pub const ACCESS_CODE_BYTES: usize = 16;

/// Length of a generated signing secret in bytes.
pub const ACCESS_SECRET_BYTES: usize = 32;

#[derive(Serialize, Deserialize)]
struct AccessCodeRecord {
    #[serde(with = "serde_bytes")]
    secret: Vec<u8>,
    description: String,
    issued: DateTime<Utc>,
}

impl Drop for AccessCodeRecord {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

/// Freshly issued access code. The secret is shown to the client once.
#[derive(Debug, Clone)]
pub struct IssuedAccessCode {
    /// Public access code
    pub access_code: String,
    /// Signing secret
    pub secret: AccessSecret,
}

/// Issues, resolves and revokes access codes.
#[derive(Clone)]
pub struct AccessCodes<S: Storage, E: Environment> {
    records: RecordStore<S, E>,
    class: String,
}

impl<S: Storage, E: Environment> AccessCodes<S, E> {
    /// Access codes stored under [`ACCESS_CODE_CLASS`].
    pub fn new(records: RecordStore<S, E>) -> Self {
        Self::with_class(records, ACCESS_CODE_CLASS)
    }

    /// Access codes stored under `class`.
    pub fn with_class(records: RecordStore<S, E>, class: &str) -> Self {
        Self { records, class: class.to_string() }
    }

    /// Generate a code and secret for `account_id`.
    pub async fn issue(
        &self,
        account_id: &str,
        description: &str,
    ) -> Result<IssuedAccessCode, RecordError> {
        let env = self.records.freezer().env();
        let access_code = env.random_hex(ACCESS_CODE_BYTES);
        let mut secret = vec![0u8; ACCESS_SECRET_BYTES];
        env.random_bytes(&mut secret);

        let record = AccessCodeRecord {
            secret: secret.clone(),
            description: description.to_string(),
            issued: env.wall_clock(),
        };
        self.records.put(&self.class, &[account_id, access_code.as_str()], &record).await?;

        tracing::info!(account_id, "access code issued");
        Ok(IssuedAccessCode { access_code, secret: AccessSecret::new(secret) })
    }

    /// Remove a code. Revoking an unknown code succeeds.
    pub async fn revoke(&self, account_id: &str, access_code: &str) -> Result<(), RecordError> {
        self.records.delete(&self.class, &[account_id, access_code]).await?;
        tracing::info!(account_id, "access code revoked");
        Ok(())
    }

    /// Description given at issue time, if the code exists.
    pub async fn description(
        &self,
        account_id: &str,
        access_code: &str,
    ) -> Result<Option<String>, RecordError> {
        let record: Option<AccessCodeRecord> =
            self.records.get(&self.class, &[account_id, access_code]).await?;
        Ok(record.map(|r| r.description.clone()))
    }
}

#[async_trait]
impl<S: Storage, E: Environment> AccessCodeStore for AccessCodes<S, E> {
    async fn resolve(
        &self,
        account_id: &str,
        access_code: &str,
    ) -> Result<Option<AccessSecret>, LookupError> {
        let record: Option<AccessCodeRecord> = self
            .records
            .get(&self.class, &[account_id, access_code])
            .await
            .map_err(|e| LookupError(e.to_string()))?;
        Ok(record.map(|r| AccessSecret::new(r.secret.clone())))
    }
}
