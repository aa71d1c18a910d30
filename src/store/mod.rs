//! Key-value storage backends
//!
//! The flow layer persists records through the [`KeyValueStore`]
//! capability rather than reaching for ambient globals: the durable
//! SQLite store and the ephemeral in-memory backup are injected into
//! [`crate::flow::FlowStorage`], so tests can swap in a memory-only pair
//! and the durable backend stays replaceable.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Failed to create data directory: {0}")]
    CreateDir(std::io::Error),
}

/// String key-value storage capability.
///
/// Implementations must be shareable across threads; the deferred cleanup
/// task re-reads and erases records from a spawned task.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set a value (insert or update)
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a key; succeeds whether or not the key exists
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// All keys starting with `prefix`
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}
