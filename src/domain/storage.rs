use async_trait::async_trait;
use thiserror::Error;

/// Storage key holding the JSON array of task records.
pub const TASKS_KEY: &str = "tasks";
/// Storage key holding the theme preference.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("storage quota exceeded: {needed} bytes needed, limit is {limit}")]
    QuotaExceeded { needed: usize, limit: usize },
}

/// Durable string key-value storage shared by the task store and the theme preference.
#[async_trait]
pub trait KeyValueStorage: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

