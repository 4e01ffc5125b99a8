//! # Transaction Engine
//!
//! Validates and commits a multi-line sale as a single receipt plus the
//! corresponding stock decrements.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   commit(lines, discount, ...)                          │
//! │                                                                         │
//! │  1. validate input (non-empty, qty > 0, discount ≥ 0, actor)            │
//! │  2. lock every distinct product, sorted key order                       │
//! │  3. load products, pre-validate availability per product                │
//! │       │                                                                 │
//! │       ├── any line short ──► InsufficientStock, NOTHING written         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  4. per line, input order: ledger decrement (type=transaction)          │
//! │  5. subtotal = Σ price×qty     cogs = Σ cost×qty                        │
//! │     total = max(0, subtotal − discount)   profit = total − cogs         │
//! │  6. persist receipt (fresh id, timestamp)                               │
//! │                                                                         │
//! │  All-or-nothing: because availability is pre-validated while every      │
//! │  product lock is held, step 4 cannot fail halfway — no receipt is       │
//! │  ever persisted that disagrees with the deltas actually applied.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use atlas_core::validation::{
    validate_actor, validate_discount_cents, validate_id, validate_line_count, validate_quantity,
};
use atlas_core::{
    generate_id, Actor, Money, Product, StockChangeType, Transaction, TransactionLine,
};
use atlas_store::keys::{product_key, transaction_key, TRANSACTION_PREFIX};
use atlas_store::{get_typed, put_typed, scan_typed, DocumentStore};

use crate::error::{EngineError, EngineResult};
use crate::locks::KeyLocks;
use crate::stock::StockLedger;

/// One requested sale line.
#[derive(Debug, Clone)]
pub struct SaleLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Commits sales against the stock ledger.
#[derive(Clone)]
pub struct TransactionEngine {
    store: Arc<dyn DocumentStore>,
    locks: Arc<KeyLocks>,
    ledger: StockLedger,
}

impl TransactionEngine {
    /// Creates a new engine sharing the ledger's store and locks.
    pub fn new(store: Arc<dyn DocumentStore>, locks: Arc<KeyLocks>) -> Self {
        let ledger = StockLedger::new(store.clone(), locks.clone());
        TransactionEngine {
            store,
            locks,
            ledger,
        }
    }

    /// Commits a sale.
    ///
    /// ## Arguments
    /// * `lines` - requested items in display order (duplicates allowed;
    ///   availability is checked against the aggregate per product)
    /// * `discount_cents` - receipt-level discount, ≥ 0
    /// * `payment_method` - free-form label ("cash", "card", ...)
    /// * `actor` - the cashier, for audit attribution
    pub async fn commit(
        &self,
        lines: Vec<SaleLine>,
        discount_cents: i64,
        payment_method: Option<String>,
        actor: &Actor,
    ) -> EngineResult<Transaction> {
        validate_actor(actor)?;
        validate_line_count(lines.len())?;
        validate_discount_cents(discount_cents)?;
        for line in &lines {
            validate_id(&line.product_id)?;
            validate_quantity(line.quantity)?;
        }

        debug!(lines = lines.len(), discount = discount_cents, "Committing sale");

        // Hold every product lock for the whole validate-then-apply window
        let keys: Vec<String> = lines.iter().map(|l| product_key(&l.product_id)).collect();
        let _guards = self.locks.lock_many(keys).await;

        // Load each distinct product once; prices are frozen from this read
        let mut products: HashMap<String, Product> = HashMap::new();
        for line in &lines {
            if !products.contains_key(&line.product_id) {
                let product: Product =
                    get_typed(self.store.as_ref(), &product_key(&line.product_id))
                        .await?
                        .ok_or_else(|| EngineError::not_found("Product", &line.product_id))?;
                products.insert(line.product_id.clone(), product);
            }
        }

        // Pre-validate availability against the aggregate quantity per
        // product, before anything is written
        let mut requested: HashMap<&str, i64> = HashMap::new();
        for line in &lines {
            *requested.entry(line.product_id.as_str()).or_default() += line.quantity;
        }
        for (product_id, quantity) in &requested {
            let product = &products[*product_id];
            if !product.has_stock(*quantity) {
                return Err(EngineError::InsufficientStock {
                    product_id: product.id.clone(),
                    product_name: product.name.clone(),
                    available: product.stock,
                    requested: *quantity,
                });
            }
        }

        // Apply the decrements, one ledger entry per line, in input order
        for line in &lines {
            self.ledger
                .apply_locked(
                    &line.product_id,
                    -line.quantity,
                    StockChangeType::Transaction,
                    actor,
                    Some("Sales transaction"),
                )
                .await?;
        }

        // Assemble the receipt from the frozen snapshots
        let mut items = Vec::with_capacity(lines.len());
        let mut subtotal = Money::zero();
        let mut cogs = Money::zero();
        for line in &lines {
            let product = &products[&line.product_id];
            let line_total = product.selling_price().multiply_quantity(line.quantity);
            let line_cost = product.cost_price().multiply_quantity(line.quantity);
            subtotal += line_total;
            cogs += line_cost;

            items.push(TransactionLine {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                quantity: line.quantity,
                selling_price_cents: product.selling_price_cents,
                cost_price_cents: product.cost_price_cents,
                line_total_cents: line_total.cents(),
                line_cost_cents: line_cost.cents(),
            });
        }

        let discount = Money::from_cents(discount_cents);
        let total = subtotal.sub_floor_zero(discount);
        let profit = total - cogs;
        let now = Utc::now();

        let transaction = Transaction {
            id: generate_id(),
            items,
            subtotal_cents: subtotal.cents(),
            discount_cents,
            total_cents: total.cents(),
            cogs_cents: cogs.cents(),
            profit_cents: profit.cents(),
            payment_method,
            cashier: actor.stamp(),
            timestamp: now,
            date: now.date_naive().to_string(),
        };

        put_typed(
            self.store.as_ref(),
            &transaction_key(&transaction.id),
            &transaction,
        )
        .await?;

        info!(
            id = %transaction.id,
            total = %total,
            profit = %profit,
            lines = transaction.items.len(),
            "Sale committed"
        );

        Ok(transaction)
    }

    /// Lists receipts, newest first.
    pub async fn list(&self, limit: usize) -> EngineResult<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> =
            scan_typed(self.store.as_ref(), TRANSACTION_PREFIX).await?;

        transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        transactions.truncate(limit);

        Ok(transactions)
    }

    /// Gets a receipt by id.
    pub async fn get(&self, id: &str) -> EngineResult<Transaction> {
        validate_id(id)?;

        get_typed(self.store.as_ref(), &transaction_key(id))
            .await?
            .ok_or_else(|| EngineError::not_found("Transaction", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
