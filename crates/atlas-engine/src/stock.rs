//! # Stock Ledger
//!
//! The single path through which any product's stock is mutated, and the
//! only writer of stock history entries.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     adjust(product, delta, ...)                         │
//! │                                                                         │
//! │  1. lock(product:<id>)        ← per-product serialization               │
//! │  2. load product              ← NotFound if absent                      │
//! │  3. target = stock + delta                                              │
//! │       │                                                                 │
//! │       ├── target ≥ 0 ──────────────────► new_stock = target             │
//! │       │                                                                 │
//! │       └── target < 0 ─┬── transaction/order ──► InsufficientStock       │
//! │                       └── adjustment ─────────► new_stock = 0 (clamp)   │
//! │                                                                         │
//! │  4. write product (stock, updated_at)                                   │
//! │  5. append history entry (applied delta, type, actor, timestamp)        │
//! │       └── on failure: compensating rewrite of step 4, then error        │
//! │                                                                         │
//! │  Invariants:                                                            │
//! │  • stock never negative                                                 │
//! │  • initial stock + Σ(history.change) = current stock                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The history entry records the delta actually *applied*: a clamped
//! correction that moved stock from 2 to 0 is recorded as −2 even if −5
//! was requested, so reconciliation always balances.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use atlas_core::validation::{validate_actor, validate_id};
use atlas_core::{generate_id, Actor, Product, StockChangeType, StockHistoryEntry};
use atlas_store::keys::{product_key, stock_history_key, STOCK_HISTORY_PREFIX};
use atlas_store::{get_typed, put_typed, scan_typed, DocumentStore};

use crate::error::{EngineError, EngineResult};
use crate::locks::KeyLocks;

/// Result of a stock mutation.
#[derive(Debug, Clone)]
pub struct StockAdjustment {
    /// Stock level after the mutation.
    pub new_stock: i64,
    /// The appended audit entry.
    pub entry: StockHistoryEntry,
}

/// Owns stock mutation and the append-only audit history.
#[derive(Clone)]
pub struct StockLedger {
    store: Arc<dyn DocumentStore>,
    locks: Arc<KeyLocks>,
}

impl StockLedger {
    /// Creates a new ledger over the given store and lock registry.
    pub fn new(store: Arc<dyn DocumentStore>, locks: Arc<KeyLocks>) -> Self {
        StockLedger { store, locks }
    }

    /// Mutates a product's stock and appends the matching history entry.
    ///
    /// ## Availability Policy
    /// Derived from `change_type` (see [`StockChangeType::clamps_to_zero`]):
    /// - `transaction` / `order`: a decrement below zero fails with
    ///   `InsufficientStock` and nothing is written
    /// - `adjustment`: the result is clamped to zero (manual corrections
    ///   must always be recordable)
    ///
    /// ## Concurrency
    /// Takes the product's lock for the whole read-modify-write. Callers
    /// already holding it (multi-line sale commit, order shipment) use
    /// [`StockLedger::apply_locked`] instead.
    pub async fn adjust(
        &self,
        product_id: &str,
        delta: i64,
        change_type: StockChangeType,
        actor: &Actor,
        reason: Option<&str>,
    ) -> EngineResult<StockAdjustment> {
        validate_id(product_id)?;
        validate_actor(actor)?;

        let _guard = self.locks.lock(&product_key(product_id)).await;
        self.apply_locked(product_id, delta, change_type, actor, reason)
            .await
    }

    /// The unlocked mutation body. The caller MUST hold the product's lock.
    pub(crate) async fn apply_locked(
        &self,
        product_id: &str,
        delta: i64,
        change_type: StockChangeType,
        actor: &Actor,
        reason: Option<&str>,
    ) -> EngineResult<StockAdjustment> {
        let key = product_key(product_id);

        let previous: Product = get_typed(self.store.as_ref(), &key)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", product_id))?;

        let target = previous.stock + delta;
        let new_stock = if target >= 0 {
            target
        } else if change_type.clamps_to_zero() {
            0
        } else {
            return Err(EngineError::InsufficientStock {
                product_id: previous.id.clone(),
                product_name: previous.name.clone(),
                available: previous.stock,
                requested: -delta,
            });
        };

        // The applied delta can differ from the requested one when clamped
        let applied = new_stock - previous.stock;
        let now = Utc::now();

        let mut updated = previous.clone();
        updated.stock = new_stock;
        updated.updated_at = now;
        put_typed(self.store.as_ref(), &key, &updated).await?;

        let entry = StockHistoryEntry {
            id: generate_id(),
            product_id: previous.id.clone(),
            product_name: previous.name.clone(),
            change: applied,
            change_type,
            timestamp: now,
            actor: actor.stamp(),
            reason: reason.map(str::to_string),
        };

        // Stock write and history append are one logical unit: if the
        // append fails, compensate the stock write before surfacing the
        // error so no mutation is left without its audit record.
        if let Err(err) = put_typed(self.store.as_ref(), &stock_history_key(&entry.id), &entry).await
        {
            if let Err(rollback_err) = put_typed(self.store.as_ref(), &key, &previous).await {
                warn!(
                    product_id = %product_id,
                    error = %rollback_err,
                    "Compensating stock rewrite failed; stock and history disagree"
                );
            }
            return Err(err.into());
        }

        debug!(
            product_id = %product_id,
            delta = %applied,
            change_type = ?change_type,
            new_stock = %new_stock,
            "Stock adjusted"
        );

        Ok(StockAdjustment { new_stock, entry })
    }

    /// Current stock level. A pure read, no side effects.
    pub async fn availability(&self, product_id: &str) -> EngineResult<i64> {
        validate_id(product_id)?;

        let product: Product = get_typed(self.store.as_ref(), &product_key(product_id))
            .await?
            .ok_or_else(|| EngineError::not_found("Product", product_id))?;

        Ok(product.stock)
    }

    /// Fetches history entries, newest first.
    ///
    /// ## Arguments
    /// * `product_id` - restrict to one product, or `None` for all
    /// * `limit` - maximum entries returned
    pub async fn history(
        &self,
        product_id: Option<&str>,
        limit: usize,
    ) -> EngineResult<Vec<StockHistoryEntry>> {
        let mut entries: Vec<StockHistoryEntry> =
            scan_typed(self.store.as_ref(), STOCK_HISTORY_PREFIX).await?;

        if let Some(id) = product_id {
            entries.retain(|e| e.product_id == id);
        }

        // Scan order is key order; the contract is newest-first by our own
        // timestamps
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);

        info!(
            count = entries.len(),
            filtered = product_id.is_some(),
            "Stock history fetched"
        );
        Ok(entries)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
