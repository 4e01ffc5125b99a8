//! # atlas-store: Document Store Boundary for Atlas POS
//!
//! Persistence for Atlas POS is a durable key-value map of string key →
//! JSON document, reached only through the [`DocumentStore`] trait. The
//! engine never sees SQL, pools, or files — just get/set/delete/scan.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Atlas POS Data Flow                              │
//! │                                                                         │
//! │  atlas-engine (stock ledger, transactions, orders, ...)                 │
//! │       │                                                                 │
//! │       ▼  Arc<dyn DocumentStore>                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     atlas-store (THIS CRATE)                    │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │    │
//! │  │   │ DocumentStore │    │  SqliteStore  │    │ MemoryStore  │    │    │
//! │  │   │   (trait)     │◄───│  (durable)    │    │   (tests)    │    │    │
//! │  │   │ get/set/      │    │  WAL, pooled  │    │  BTreeMap    │    │    │
//! │  │   │ delete/scan   │    │               │    │              │    │    │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘    │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Contract
//!
//! - The store is assumed reliable and durable; it offers **no**
//!   transactions and **no** compare-and-swap. Anything stronger (per-key
//!   serialization, rollback) is the engine's job.
//! - `scan_prefix` returns documents in key order, but callers re-sort by
//!   their own timestamp fields; scan order is not a semantic contract.
//! - Store failures surface as [`StoreError`] and are never retried here.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod keys;
pub mod memory;
pub mod sqlite;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, StoreConfig};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

// =============================================================================
// The Store Trait
// =============================================================================

/// A durable key-value map of string key → JSON document.
///
/// Implementations must be safe for concurrent use; they do NOT need to
/// serialize concurrent read-modify-write sequences — that discipline
/// lives in the engine's per-key locks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read. `None` when the key is absent.
    async fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Point write (upsert).
    async fn set(&self, key: &str, document: Value) -> StoreResult<()>;

    /// Point delete. Absent keys are a no-op.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// All documents whose key starts with `prefix`, in key order.
    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<Value>>;
}

// =============================================================================
// Typed Helpers
// =============================================================================

/// Reads a document and deserializes it into `T`.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    key: &str,
) -> StoreResult<Option<T>> {
    match store.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Serializes `value` and writes it under `key`.
pub async fn put_typed<T: Serialize>(
    store: &dyn DocumentStore,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    store.set(key, serde_json::to_value(value)?).await
}

/// Scans a prefix and deserializes every document into `T`.
pub async fn scan_typed<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    prefix: &str,
) -> StoreResult<Vec<T>> {
    let documents = store.scan_prefix(prefix).await?;
    documents
        .into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
