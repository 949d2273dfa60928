//! # districache-store
//!
//! Durable `key -> value` store the router falls back to on cache misses and
//! writes through to on every `Put` (spec §3 "Store row", §4.3.1-2).
//! Timestamps are persisted but not read by the core contract — they exist
//! because the original prototype's table carries them, not because the
//! router consults them.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use districache_common::Result;

/// A row as returned by [`Store::get_all`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoreEntry {
    pub key: String,
    pub value: String,
}

/// Durable backing store for the router's write-through path.
///
/// Implementations must be safe to share behind an `Arc` and called
/// concurrently; `districache-router` holds exactly one instance for the
/// lifetime of the process.
#[async_trait]
pub trait Store: Send + Sync {
    /// Upserts `key -> value`. Updates `updated_at` on an existing row.
    async fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Fetches the value for `key`, or `None` if absent.
    async fn fetch(&self, key: &str) -> Result<Option<String>>;

    /// Deletes `key`. Returns whether a row existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Returns every row currently stored.
    async fn get_all(&self) -> Result<Vec<StoreEntry>>;

    /// Removes every row.
    async fn clear(&self) -> Result<()>;
}
