//! # SQLite-Backed Store
//!
//! Durable [`DocumentStore`] implementation over a single SQLite table.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SQLite Document Store                              │
//! │                                                                         │
//! │  StoreConfig::new(path) ← Configure pool settings                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SqliteStore::connect(config).await ← Create pool + bootstrap schema    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                            │
//! │  │  documents                              │                            │
//! │  │  ┌───────────────────┬───────────────┐  │                            │
//! │  │  │ key TEXT PK       │ body TEXT     │  │                            │
//! │  │  ├───────────────────┼───────────────┤  │                            │
//! │  │  │ product:lx2...    │ {"id": ...}   │  │                            │
//! │  │  │ order:lx3...      │ {"id": ...}   │  │                            │
//! │  │  │ stock_history:... │ {"id": ...}   │  │                            │
//! │  │  └───────────────────┴───────────────┘  │                            │
//! │  └─────────────────────────────────────────┘                            │
//! │                                                                         │
//! │  get/set/delete: point queries on the primary key                       │
//! │  scan_prefix:    `key LIKE prefix || '%' ORDER BY key`                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled for:
//! - Better concurrent read performance
//! - Readers don't block writers
//! - Better crash recovery

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::DocumentStore;

// =============================================================================
// Configuration
// =============================================================================

/// Store configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = StoreConfig::new("/path/to/atlas.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5 (sufficient for a single-store POS deployment)
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection acquire timeout.
    ///
    /// Store calls must complete or fail within bounded time; a stuck pool
    /// surfaces as a StoreError instead of blocking callers indefinitely.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,
}

impl StoreConfig {
    /// Creates a new store configuration with the given path.
    ///
    /// The database file will be created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection acquire timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let store = SqliteStore::connect(StoreConfig::in_memory()).await?;
    /// ```
    pub fn in_memory() -> Self {
        StoreConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

// =============================================================================
// SqliteStore
// =============================================================================

/// SQLite-backed document store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects to the database and bootstraps the schema.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite for a POS workload:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous (balance of safety/speed)
    /// 3. Creates the connection pool
    /// 4. Creates the `documents` table if missing (idempotent)
    pub async fn connect(config: StoreConfig) -> StoreResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing document store"
        );

        let connect_url = if config.database_path == PathBuf::from(":memory:") {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite://{}?mode=rwc", config.database_path.display())
        };

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?
            // WAL mode: readers don't block writers and vice versa
            .journal_mode(SqliteJournalMode::Wal)
            // NORMAL synchronous: safe from corruption, may lose the last
            // write on a power cut
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Document store pool created"
        );

        let store = SqliteStore { pool };
        store.bootstrap_schema().await?;

        Ok(store)
    }

    /// Creates the documents table if it doesn't exist. Idempotent.
    async fn bootstrap_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                key  TEXT PRIMARY KEY,
                body TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("Document schema ready");
        Ok(())
    }

    /// Checks if the store is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Closes the connection pool.
    ///
    /// ## When To Call
    /// On application shutdown. After closing, all operations fail.
    pub async fn close(&self) {
        info!("Closing document store pool");
        self.pool.close().await;
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let row = sqlx::query("SELECT body FROM documents WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let body: String = row.get("body");
                Ok(Some(serde_json::from_str(&body)?))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, document: Value) -> StoreResult<()> {
        let body = serde_json::to_string(&document)?;

        sqlx::query(
            r#"
            INSERT INTO documents (key, body) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET body = excluded.body
            "#,
        )
        .bind(key)
        .bind(body)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        // Deleting an absent key is a no-op, not an error
        sqlx::query("DELETE FROM documents WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<Value>> {
        let rows = sqlx::query(
            r#"
            SELECT body FROM documents
            WHERE key LIKE ?1 || '%'
            ORDER BY key
            "#,
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let body: String = row.get("body");
            documents.push(serde_json::from_str(&body)?);
        }

        Ok(documents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn memory_store() -> SqliteStore {
        SqliteStore::connect(StoreConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let store = memory_store().await;
        assert!(store.health_check().await);
    }

    #[tokio::test]
    async fn test_get_set_delete_roundtrip() {
        let store = memory_store().await;

        assert_eq!(store.get("product:p1").await.unwrap(), None);

        store
            .set("product:p1", json!({"id": "p1", "stock": 5}))
            .await
            .unwrap();
        assert_eq!(
            store.get("product:p1").await.unwrap(),
            Some(json!({"id": "p1", "stock": 5}))
        );

        // Upsert overwrites
        store
            .set("product:p1", json!({"id": "p1", "stock": 2}))
            .await
            .unwrap();
        assert_eq!(
            store.get("product:p1").await.unwrap(),
            Some(json!({"id": "p1", "stock": 2}))
        );

        store.delete("product:p1").await.unwrap();
        assert_eq!(store.get("product:p1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_scan_prefix() {
        let store = memory_store().await;

        store.set("product:a", json!("pa")).await.unwrap();
        store.set("product:b", json!("pb")).await.unwrap();
        store.set("order:a", json!("oa")).await.unwrap();

        let products = store.scan_prefix("product:").await.unwrap();
        assert_eq!(products, vec![json!("pa"), json!("pb")]);

        let purchases = store.scan_prefix("purchase:").await.unwrap();
        assert!(purchases.is_empty());
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let path = std::env::temp_dir().join(format!(
            "atlas-store-test-{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        {
            let store = SqliteStore::connect(StoreConfig::new(&path)).await.unwrap();
            store
                .set("product:p1", json!({"id": "p1"}))
                .await
                .unwrap();
            store.close().await;
        }

        let reopened = SqliteStore::connect(StoreConfig::new(&path)).await.unwrap();
        assert_eq!(
            reopened.get("product:p1").await.unwrap(),
            Some(json!({"id": "p1"}))
        );
        reopened.close().await;

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = StoreConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
    }
}
