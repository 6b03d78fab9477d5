#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use super::{Metadata, Storage, StorageError, StoredObject};

/// In-memory storage implementation for testing and simulation
///
/// All state is wrapped in Arc<Mutex<>> to allow Clone and concurrent access.
/// Locks are never held across an await point.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
}

impl MemoryStorage {
    /// Create a new empty `MemoryStorage`
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    #[allow(clippy::expect_used)]
    pub fn len(&self) -> usize {
        self.objects.lock().expect("Mutex poisoned").len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored key, sorted.
    ///
    /// Lets tests inspect what an attacker with backend access would see.
    #[allow(clippy::expect_used)]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> =
            self.objects.lock().expect("Mutex poisoned").keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Overwrite the stored bytes under `key`, keeping metadata.
    ///
    /// Returns `false` if the key is absent. Used to simulate tampering.
    #[allow(clippy::expect_used)]
    pub fn replace_bytes(&self, key: &str, bytes: Vec<u8>) -> bool {
        let mut objects = self.objects.lock().expect("Mutex poisoned");
        match objects.get_mut(key) {
            Some(object) => {
                object.bytes = bytes;
                true
            },
            None => false,
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    #[allow(clippy::expect_used)]
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        metadata: Metadata,
    ) -> Result<(), StorageError> {
        self.objects
            .lock()
            .expect("Mutex poisoned")
            .insert(key.to_string(), StoredObject { bytes, metadata });
        Ok(())
    }

    #[allow(clippy::expect_used)]
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        Ok(self.objects.lock().expect("Mutex poisoned").get(key).cloned())
    }

    #[allow(clippy::expect_used)]
    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.lock().expect("Mutex poisoned").remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete() {
        let storage = MemoryStorage::new();
        storage.put("k", vec![1, 2, 3], Metadata::new()).await.unwrap();

        let object = storage.get("k").await.unwrap().unwrap();
        assert_eq!(object.bytes, vec![1, 2, 3]);

        storage.delete("k").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap(), None);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn last_write_wins() {
        let storage = MemoryStorage::new();
        storage.put("k", vec![1], Metadata::new()).await.unwrap();
        storage.put("k", vec![2], Metadata::new()).await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().unwrap().bytes, vec![2]);
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn deleting_absent_key_succeeds() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.delete("missing").await, Ok(()));
    }
}
