//! Redb-backed durable storage implementation.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety.
//! All objects survive restarts. Redb is blocking, so every operation runs
//! on Tokio's blocking pool.

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use redb::{Database, ReadableTableMetadata, TableDefinition};

use super::{Metadata, Storage, StorageError, StoredObject};

/// Table: objects
/// Key: storage key (prefix + hashed identifier segments)
/// Value: CBOR-encoded `StoredObject`
const OBJECTS: TableDefinition<&str, &[u8]> = TableDefinition::new("objects");

/// Durable storage backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbStorage {
    db: Arc<Database>,
}

impl RedbStorage {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates the OBJECTS table if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(|e| StorageError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(OBJECTS).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn put_blocking(&self, key: &str, object: &StoredObject) -> Result<(), StorageError> {
        let mut bytes = Vec::with_capacity(object.bytes.len() + 64);
        ciborium::into_writer(object, &mut bytes)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let mut table = txn.open_table(OBJECTS).map_err(|e| StorageError::Io(e.to_string()))?;
            table.insert(key, bytes.as_slice()).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(())
    }

    fn get_blocking(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(OBJECTS).map_err(|e| StorageError::Io(e.to_string()))?;

        let Some(value) = table.get(key).map_err(|e| StorageError::Io(e.to_string()))? else {
            return Ok(None);
        };

        let object: StoredObject = ciborium::from_reader(value.value())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(object))
    }

    fn delete_blocking(&self, key: &str) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let mut table = txn.open_table(OBJECTS).map_err(|e| StorageError::Io(e.to_string()))?;
            table.remove(key).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(())
    }

    /// Number of stored objects.
    pub fn len(&self) -> Result<u64, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(OBJECTS).map_err(|e| StorageError::Io(e.to_string()))?;
        table.len().map_err(|e| StorageError::Io(e.to_string()))
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

async fn blocking<T, F>(f: F) -> Result<T, StorageError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| StorageError::Task(e.to_string()))?
}

#[async_trait]
impl Storage for RedbStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        metadata: Metadata,
    ) -> Result<(), StorageError> {
        let this = self.clone();
        let key = key.to_string();
        blocking(move || this.put_blocking(&key, &StoredObject { bytes, metadata })).await
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        let this = self.clone();
        let key = key.to_string();
        blocking(move || this.get_blocking(&key)).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let this = self.clone();
        let key = key.to_string();
        blocking(move || this.delete_blocking(&key)).await
    }
}
