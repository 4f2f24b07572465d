use serde::{de::DeserializeOwned, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, warn};

use crate::error::Result;

/// Keyed JSON store backed by a single SQLite table.
/// Survives restarts; every value is a JSON document under a string key.
#[derive(Clone)]
pub struct KvStore {
    pool: SqlitePool,
}

impl KvStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `path` and run migrations.
    pub async fn open(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Private in-memory database. One connection, never recycled, so the data lives
    /// as long as the store.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    pub async fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        let updated_at = chrono::Utc::now().timestamp_millis();
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;
        debug!(key, bytes = value.len(), "kv put");
        Ok(())
    }

    /// Read and decode a JSON value. A value that no longer decodes is logged and
    /// treated as absent so a bad write never blocks startup.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get_raw(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                warn!(key, "Ignoring corrupt persisted value: {e}");
                Ok(None)
            }
        }
    }

    pub async fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.put_raw(key, &raw).await
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_flag(&self, key: &str) -> Result<bool> {
        Ok(self.get_json::<bool>(key).await?.unwrap_or(false))
    }

    pub async fn set_flag(&self, key: &str, value: bool) -> Result<()> {
        self.put_json(key, &value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn json_round_trip_and_overwrite() {
        let kv = KvStore::in_memory().await.unwrap();
        assert_eq!(kv.get_json::<Vec<u32>>("k").await.unwrap(), None);

        kv.put_json("k", &vec![1u32, 2]).await.unwrap();
        kv.put_json("k", &vec![3u32]).await.unwrap();
        assert_eq!(kv.get_json::<Vec<u32>>("k").await.unwrap(), Some(vec![3]));

        kv.delete("k").await.unwrap();
        assert_eq!(kv.get_raw("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_value_reads_as_absent() {
        let kv = KvStore::in_memory().await.unwrap();
        kv.put_raw("bad", "{not json").await.unwrap();
        assert_eq!(kv.get_json::<Vec<u32>>("bad").await.unwrap(), None);
    }

    #[tokio::test]
    async fn flags_default_to_false() {
        let kv = KvStore::in_memory().await.unwrap();
        assert!(!kv.get_flag("seen").await.unwrap());
        kv.set_flag("seen", true).await.unwrap();
        assert!(kv.get_flag("seen").await.unwrap());
    }
}
