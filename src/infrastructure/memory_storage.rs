use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::storage::{KeyValueStorage, StorageError};

/// Process-local storage. Clones share the same map, so a test can keep a
/// handle and inspect what the store wrote.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    /// Reject writes that would push the summed size of all values past `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self { quota: Some(bytes), ..Self::default() }
    }

    pub fn set_quota(&mut self, bytes: Option<usize>) { self.quota = bytes; }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries.lock().map_err(|_| StorageError::Backend("memory storage lock poisoned".into()))
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.lock()?;
        if let Some(limit) = self.quota {
            let others: usize = entries.iter().filter(|(k, _)| k.as_str() != key).map(|(_, v)| v.len()).sum();
            let needed = others + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_entries() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        storage.set("k", "v").await.unwrap();
        assert_eq!(handle.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(handle.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn quota_rejects_oversized_writes_and_keeps_old_value() {
        let storage = MemoryStorage::with_quota(8);
        storage.set("k", "1234").await.unwrap();
        let err = storage.set("k", "123456789").await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { needed: 9, limit: 8 }));
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("1234"));
        // replacing a value only counts the new size
        storage.set("k", "12345678").await.unwrap();
    }
}
