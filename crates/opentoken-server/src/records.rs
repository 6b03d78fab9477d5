//! Record store
//!
//! ```text
//! put(class, ids, value)
//!   encode ──► [pool] storage_key(ids), inner_key(ids), freeze ──► Storage::put
//! get(class, ids)
//!   [pool] storage_key(ids) ──► Storage::get ──► [pool] thaw ──► decode
//! ```
//!
//! An expired record reads as absent. Storage sees only hashed keys and
//! frozen bytes.

use std::{collections::HashMap, sync::Arc};

use opentoken_core::{
    CodecError, Environment, FreezeError, FreezeOptions, Freezer, KeyError, RecordClass, codec,
    inner_key,
};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::{
    pool::{CryptoPool, PoolError},
    storage::{Metadata, Storage, StorageError},
};

/// Metadata key carrying the record class name.
pub const CLASS_METADATA: &str = "class";

/// Record store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// No record class with this name is configured
    #[error("unknown record class: {class}")]
    UnknownClass {
        /// Requested class name
        class: String,
    },

    /// Record is absent or expired
    #[error("record not found")]
    NotFound {
        /// Class that was searched
        class: String,
    },

    /// Identifiers could not be turned into keys
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Freeze or thaw failed
    #[error(transparent)]
    Freeze(#[from] FreezeError),

    /// Value codec failed
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Storage backend failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Crypto pool failed
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl RecordError {
    /// Short opaque code for client-facing error references.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownClass { .. } => "R400",
            Self::NotFound { .. } => "R401",
            Self::Key(_) => "R402",
            Self::Freeze(e) => e.code(),
            Self::Codec(_) => "R403",
            Self::Storage(_) => "R404",
            Self::Pool(_) => "R405",
        }
    }

    /// Failures caused by the deployment rather than by the record or the
    /// caller. Their details stay in server logs.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::UnknownClass { .. } | Self::Storage(_) | Self::Pool(_))
    }
}

/// Confidential, expiring records addressed by identifier tuples.
///
/// Clones share storage, the freezer and the crypto pool.
#[derive(Clone)]
pub struct RecordStore<S: Storage, E: Environment> {
    storage: S,
    freezer: Freezer<E>,
    classes: Arc<HashMap<String, RecordClass>>,
    pool: CryptoPool,
}

impl<S: Storage, E: Environment> RecordStore<S, E> {
    /// Create a record store over `classes`.
    pub fn new(
        storage: S,
        freezer: Freezer<E>,
        classes: impl IntoIterator<Item = RecordClass>,
        pool: CryptoPool,
    ) -> Self {
        let classes = classes.into_iter().map(|c| (c.name().to_string(), c)).collect();
        Self { storage, freezer, classes: Arc::new(classes), pool }
    }

    /// Configured record class.
    pub fn class(&self, name: &str) -> Result<&RecordClass, RecordError> {
        self.classes.get(name).ok_or_else(|| RecordError::UnknownClass { class: name.to_string() })
    }

    /// Storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Freezer in use.
    pub fn freezer(&self) -> &Freezer<E> {
        &self.freezer
    }

    /// Storage address `ids` map to in `class`.
    pub async fn storage_key(&self, class: &str, ids: &[&str]) -> Result<String, RecordError> {
        let class = self.class(class)?.clone();
        let ids = owned(ids);
        Ok(self.pool.run(move || class.storage_key(&borrowed(&ids))).await??)
    }

    /// Store `value`, expiring after the class lifetime.
    pub async fn put<T: Serialize + ?Sized>(
        &self,
        class: &str,
        ids: &[&str],
        value: &T,
    ) -> Result<(), RecordError> {
        self.put_with_metadata(class, ids, value, Metadata::new()).await
    }

    /// Store `value` with extra plaintext metadata.
    ///
    /// The class name is always added under [`CLASS_METADATA`].
    pub async fn put_with_metadata<T: Serialize + ?Sized>(
        &self,
        class: &str,
        ids: &[&str],
        value: &T,
        mut metadata: Metadata,
    ) -> Result<(), RecordError> {
        let record_class = self.class(class)?.clone();
        let encoded = codec::encode(value)?;
        let ids = owned(ids);
        let freezer = self.freezer.clone();

        let (key, frozen) = self
            .pool
            .run(move || -> Result<(String, Vec<u8>), RecordError> {
                let ids = borrowed(&ids);
                let key = record_class.storage_key(&ids)?;
                let inner = inner_key(&ids)?;
                let expires = freezer
                    .env()
                    .wall_clock()
                    .checked_add_signed(record_class.lifetime())
                    .ok_or(FreezeError::LifetimeOutOfRange)?;
                let frozen =
                    freezer.freeze_bytes(encoded, &inner, FreezeOptions::expiring_at(expires))?;
                Ok((key, frozen))
            })
            .await??;

        metadata.insert(CLASS_METADATA.to_string(), class.to_string());
        self.storage.put(&key, frozen, metadata).await?;
        tracing::debug!(class, "record stored");
        Ok(())
    }

    /// Load a record. `None` when absent or expired.
    ///
    /// # Errors
    ///
    /// A record that exists but fails to thaw (tampered, wrong key,
    /// unknown algorithm code) is an error, not `None`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        class: &str,
        ids: &[&str],
    ) -> Result<Option<T>, RecordError> {
        let key = self.storage_key(class, ids).await?;
        let Some(object) = self.storage.get(&key).await? else {
            tracing::debug!(class, "record absent");
            return Ok(None);
        };

        let ids = owned(ids);
        let freezer = self.freezer.clone();
        let thawed = self
            .pool
            .run(move || -> Result<Zeroizing<Vec<u8>>, RecordError> {
                let inner = inner_key(&borrowed(&ids))?;
                Ok(Zeroizing::new(freezer.thaw_bytes(&object.bytes, &inner)?))
            })
            .await?;

        match thawed {
            Ok(encoded) => Ok(Some(codec::decode(&encoded)?)),
            Err(RecordError::Freeze(e)) if e.is_expired() => {
                tracing::debug!(class, "record expired");
                Ok(None)
            },
            Err(e) => Err(e),
        }
    }

    /// Load a record that must exist.
    pub async fn get_required<T: DeserializeOwned>(
        &self,
        class: &str,
        ids: &[&str],
    ) -> Result<T, RecordError> {
        self.get(class, ids).await?.ok_or_else(|| RecordError::NotFound { class: class.to_string() })
    }

    /// Remove a record. Removing an absent record succeeds.
    pub async fn delete(&self, class: &str, ids: &[&str]) -> Result<(), RecordError> {
        let key = self.storage_key(class, ids).await?;
        self.storage.delete(&key).await?;
        tracing::debug!(class, "record deleted");
        Ok(())
    }
}

fn owned(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| (*id).to_string()).collect()
}

fn borrowed(ids: &[String]) -> Vec<&str> {
    ids.iter().map(String::as_str).collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use opentoken_core::{FreezeConfig, HashConfig, ServiceSecret, SimEnv};
    use opentoken_crypto::SuiteConfig;

    use super::*;
    use crate::storage::MemoryStorage;

    fn suite() -> SuiteConfig {
        SuiteConfig {
            hmac: opentoken_crypto::MethodConfig::new("sha256", "sha1", 10),
            cipher: opentoken_crypto::MethodConfig::new("aes-128-cbc", "sha1", 10),
        }
    }

    fn store(env: SimEnv) -> RecordStore<MemoryStorage, SimEnv> {
        let config = FreezeConfig {
            primary: suite().resolve().unwrap(),
            secondary: suite().resolve().unwrap(),
            max_lifetime: TimeDelta::days(30),
        };
        let secret = ServiceSecret::from_bytes(b"outer".to_vec());
        let class = RecordClass::new(
            "session",
            "session/",
            TimeDelta::hours(1),
            vec![HashConfig::new("sha1", 2, "salt", 8).unwrap()],
        )
        .unwrap();
        RecordStore::new(
            MemoryStorage::new(),
            Freezer::new(config, secret, env),
            [class],
            CryptoPool::new(2),
        )
    }

    #[tokio::test]
    async fn put_then_get() {
        let store = store(SimEnv::with_seed(1));
        store.put("session", &["alice", "s1"], "hello").await.unwrap();
        let value: Option<String> = store.get("session", &["alice", "s1"]).await.unwrap();
        assert_eq!(value.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn absent_record_is_none() {
        let store = store(SimEnv::with_seed(1));
        let value: Option<String> = store.get("session", &["nobody"]).await.unwrap();
        assert_eq!(value, None);
        assert_eq!(
            store.get_required::<String>("session", &["nobody"]).await,
            Err(RecordError::NotFound { class: "session".to_string() })
        );
    }

    #[tokio::test]
    async fn expired_record_reads_as_absent() {
        let env = SimEnv::with_seed(2);
        let store = store(env.clone());
        store.put("session", &["alice"], &42u32).await.unwrap();

        env.advance(TimeDelta::minutes(59));
        assert_eq!(store.get::<u32>("session", &["alice"]).await.unwrap(), Some(42));

        env.advance(TimeDelta::minutes(2));
        assert_eq!(store.get::<u32>("session", &["alice"]).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unrepresentable_class_lifetime_is_an_error() {
        let store = store(SimEnv::with_seed(5));
        let endless = RecordClass::new(
            "endless",
            "endless/",
            TimeDelta::seconds(9_000_000_000_000),
            vec![HashConfig::new("sha1", 1, "", 8).unwrap()],
        )
        .unwrap();
        let store = RecordStore::new(
            store.storage().clone(),
            store.freezer().clone(),
            [endless],
            CryptoPool::new(1),
        );

        assert_eq!(
            store.put("endless", &["alice"], &1u8).await,
            Err(RecordError::Freeze(FreezeError::LifetimeOutOfRange))
        );
        assert!(store.storage().is_empty());
    }

    #[tokio::test]
    async fn storage_key_is_prefixed_hex() {
        let store = store(SimEnv::with_seed(3));
        let key = store.storage_key("session", &["alice", "s1"]).await.unwrap();
        let (first, second) = key.strip_prefix("session/").unwrap().split_once('/').unwrap();
        assert_eq!(first.len(), 16);
        assert_eq!(second.len(), 16);
        assert!(!key.contains("alice"));
    }

    #[tokio::test]
    async fn metadata_carries_class() {
        let store = store(SimEnv::with_seed(4));
        let mut metadata = Metadata::new();
        metadata.insert("origin".to_string(), "test".to_string());
        store.put_with_metadata("session", &["bob"], &1u8, metadata).await.unwrap();

        let key = store.storage_key("session", &["bob"]).await.unwrap();
        let object = store.storage().get(&key).await.unwrap().unwrap();
        assert_eq!(object.metadata.get(CLASS_METADATA).map(String::as_str), Some("session"));
        assert_eq!(object.metadata.get("origin").map(String::as_str), Some("test"));
    }

    #[tokio::test]
    async fn unknown_class_is_rejected() {
        let store = store(SimEnv::with_seed(5));
        let err = store.put("nope", &["a"], &1u8).await.unwrap_err();
        assert_eq!(err, RecordError::UnknownClass { class: "nope".to_string() });
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = store(SimEnv::with_seed(6));
        store.put("session", &["carol"], &true).await.unwrap();
        store.delete("session", &["carol"]).await.unwrap();
        assert_eq!(store.get::<bool>("session", &["carol"]).await.unwrap(), None);
        assert!(store.storage().is_empty());
    }
}
