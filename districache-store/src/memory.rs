//! In-process `Store` backing, used by tests and by `districache-router`
//! when run without a `--db` path.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use districache_common::Result;

use crate::{Store, StoreEntry};

#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn save(&self, key: &str, value: &str) -> Result<()> {
        self.rows.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>> {
        Ok(self.rows.read().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.rows.write().remove(key).is_some())
    }

    async fn get_all(&self) -> Result<Vec<StoreEntry>> {
        Ok(self
            .rows
            .read()
            .iter()
            .map(|(key, value)| StoreEntry { key: key.clone(), value: value.clone() })
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        self.rows.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_fetch_round_trips() {
        let store = MemoryStore::new();
        store.save("a", "1").await.unwrap();
        assert_eq!(store.fetch("a").await.unwrap(), Some("1".to_string()));
    }

    #[tokio::test]
    async fn fetch_missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.fetch("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_upserts() {
        let store = MemoryStore::new();
        store.save("a", "1").await.unwrap();
        store.save("a", "2").await.unwrap();
        assert_eq!(store.fetch("a").await.unwrap(), Some("2".to_string()));
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        store.save("a", "1").await.unwrap();
        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
    }

    #[tokio::test]
    async fn clear_empties_all_rows() {
        let store = MemoryStore::new();
        store.save("a", "1").await.unwrap();
        store.save("b", "2").await.unwrap();
        store.clear().await.unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
    }
}
