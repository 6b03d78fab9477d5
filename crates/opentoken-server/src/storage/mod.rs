//! Key/value byte storage
//!
//! Records arrive here already frozen and addressed by hashed keys, so a
//! backend only ever sees ciphertext. There is no transactional or
//! compare-and-swap surface: concurrent writers to one key race and the
//! last write wins.

mod chaotic;
mod error;
mod memory;
mod redb;

use std::collections::BTreeMap;

use async_trait::async_trait;
pub use chaotic::ChaoticStorage;
pub use error::StorageError;
pub use memory::MemoryStorage;
use serde::{Deserialize, Serialize};

pub use self::redb::RedbStorage;

/// Plaintext metadata attached to a stored object.
///
/// Never contains record content; used for operator-visible tags such as
/// the record class.
pub type Metadata = BTreeMap<String, String>;

/// One stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// Frozen record bytes
    #[serde(with = "serde_bytes")]
    pub bytes: Vec<u8>,
    /// Plaintext metadata
    #[serde(default)]
    pub metadata: Metadata,
}

/// Storage abstraction for frozen records
///
/// Must be Clone (shared by the record store and access codes), Send + Sync
/// and `'static`. Implementations share internal state via Arc, so clones
/// access the same underlying storage.
#[async_trait]
pub trait Storage: Clone + Send + Sync + 'static {
    /// Store `bytes` under `key`, replacing any previous object.
    async fn put(&self, key: &str, bytes: Vec<u8>, metadata: Metadata)
    -> Result<(), StorageError>;

    /// Load the object under `key`. `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError>;

    /// Remove the object under `key`. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
