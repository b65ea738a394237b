//! Key-value persistence for canvas state.

mod file;
mod memory;
mod persist;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use persist::{CanvasPersistence, PersistedCanvas};

use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A string key-value store.
///
/// Implementations can keep values in memory, on the filesystem, or in a
/// platform store. Values are opaque strings; callers serialize to JSON.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. A missing key is `Ok(None)`.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a value. Deleting a missing key succeeds.
    fn remove(&self, key: &str) -> StorageResult<()>;
}
