use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use super::MIGRATION_001_INITIAL;

/// Durable key-value storage backed by a single SQLite table.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Read the value stored under `key`.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read key '{}'", key))?;

        Ok(row.map(|row| row.get::<String, _>("value")))
    }

    /// Store `value` under `key`, overwriting any previous value.
    pub async fn put(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to write key '{}'", key))?;
        Ok(())
    }

    /// Remove `key`. Returns whether anything was removed.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to remove key '{}'", key))?;
        Ok(result.rows_affected() > 0)
    }

    /// When `key` was last written.
    pub async fn updated_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT updated_at FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read timestamp of key '{}'", key))?;

        match row {
            Some(row) => {
                let updated_at_str: String = row.get("updated_at");
                let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
                    .context("Invalid updated_at timestamp")?
                    .with_timezone(&Utc);
                Ok(Some(updated_at))
            }
            None => Ok(None),
        }
    }

    /// Close the underlying connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_repo() -> Repository {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let repo = Repository::new(pool);
        repo.migrate().await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let repo = memory_repo().await;
        assert_eq!(repo.get("transactions").await.unwrap(), None);
        assert_eq!(repo.updated_at("transactions").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let repo = memory_repo().await;

        repo.put("transactions", "[1]").await.unwrap();
        repo.put("transactions", "[2]").await.unwrap();

        assert_eq!(repo.get("transactions").await.unwrap().as_deref(), Some("[2]"));
        assert!(repo.updated_at("transactions").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove() {
        let repo = memory_repo().await;
        repo.put("transactions", "[]").await.unwrap();

        assert!(repo.remove("transactions").await.unwrap());
        assert!(!repo.remove("transactions").await.unwrap());
        assert_eq!(repo.get("transactions").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let repo = memory_repo().await;
        repo.put("settings", "{}").await.unwrap();
        repo.migrate().await.unwrap();
        assert_eq!(repo.get("settings").await.unwrap().as_deref(), Some("{}"));
    }
}
