//! SQLite-backed `Store`, matching the original prototype's
//! `(key, value, created_at, updated_at)` table shape (`db.py`).
//!
//! Uses `sqlx`'s runtime query builder rather than the `query!` macros,
//! since those require a live database reachable at compile time.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use districache_common::{Error, Result};

use crate::{Store, StoreEntry};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if absent) the SQLite database at `path` and ensures
    /// the backing table exists.
    pub async fn connect(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::Internal(format!("failed to open sqlite store: {e}")))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| Error::Internal(format!("failed to create cache_entries table: {e}")))?;

        Ok(SqliteStore { pool })
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn save(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO cache_entries (key, value, updated_at)
             VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Internal(format!("store save failed: {e}")))?;
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM cache_entries WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Internal(format!("store fetch failed: {e}")))?;
        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Internal(format!("store delete failed: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_all(&self) -> Result<Vec<StoreEntry>> {
        let rows = sqlx::query("SELECT key, value FROM cache_entries")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Internal(format!("store get_all failed: {e}")))?;
        Ok(rows
            .into_iter()
            .map(|row| StoreEntry {
                key: row.get::<String, _>("key"),
                value: row.get::<String, _>("value"),
            })
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM cache_entries")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Internal(format!("store clear failed: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn in_memory_store() -> SqliteStore {
        SqliteStore::connect(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn save_then_fetch_round_trips() {
        let store = in_memory_store().await;
        store.save("a", "1").await.unwrap();
        assert_eq!(store.fetch("a").await.unwrap(), Some("1".to_string()));
    }

    #[tokio::test]
    async fn save_upserts_existing_key() {
        let store = in_memory_store().await;
        store.save("a", "1").await.unwrap();
        store.save("a", "2").await.unwrap();
        assert_eq!(store.fetch("a").await.unwrap(), Some("2".to_string()));
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let store = in_memory_store().await;
        store.save("a", "1").await.unwrap();
        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
    }

    #[tokio::test]
    async fn clear_empties_table() {
        let store = in_memory_store().await;
        store.save("a", "1").await.unwrap();
        store.save("b", "2").await.unwrap();
        store.clear().await.unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
    }
}
