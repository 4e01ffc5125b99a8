//! # atlas-engine: Inventory Ledger and Fulfillment Engine
//!
//! The core of Atlas POS: the logic that keeps product stock counts, their
//! audit trail, and multi-step order/transaction state consistent under
//! concurrent writes, plus the login rate limiter.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Atlas POS Engine                                 │
//! │                                                                         │
//! │  Boundary (routing, auth — excluded) dispatches into:                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌────────────┐   │
//! │  │ Transaction  │  │ Fulfillment  │  │   Catalog    │  │  Purchase  │   │
//! │  │   Engine     │  │    Desk      │  │              │  │    Log     │   │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘  └─────┬──────┘   │
//! │         │ decrements      │ decrements      │                │          │
//! │         ▼                 ▼                 │                │          │
//! │  ┌─────────────────────────────────┐        │                │          │
//! │  │        Stock Ledger             │        │                │          │
//! │  │  single mutation path + audit   │        │                │          │
//! │  └──────────────┬──────────────────┘        │                │          │
//! │                 │          ┌────────────────┘                │          │
//! │                 ▼          ▼                                 ▼          │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │            Arc<dyn DocumentStore>  (atlas-store)                │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │                                                                         │
//! │  Shared KeyLocks serialize same-key writes; different keys run in       │
//! │  parallel. The LoginRateLimiter is process state beside the store.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`stock`] - the stock ledger: single mutation path + audit history
//! - [`catalog`] - product CRUD (stock excluded)
//! - [`transaction`] - sale commit: receipt + decrements
//! - [`orders`] - delivery order state machine
//! - [`purchases`] - supplier purchase log
//! - [`ratelimit`] - login rate limiter
//! - [`reports`] - day-bucketed sales rollups
//! - [`locks`] - per-key write serialization
//! - [`error`] - the operation failure contract

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod error;
pub mod locks;
pub mod orders;
pub mod purchases;
pub mod ratelimit;
pub mod reports;
pub mod stock;
pub mod transaction;

#[cfg(test)]
mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use catalog::{NewProduct, ProductCatalog, ProductPatch};
pub use error::{EngineError, EngineResult};
pub use locks::KeyLocks;
pub use orders::{FulfillmentDesk, NewOrder, NewOrderLine, OrderPatch};
pub use purchases::{NewPurchase, NewPurchaseLine, PurchaseLog};
pub use ratelimit::{Clock, LoginGate, LoginRateLimiter, RateLimiterConfig, SystemClock};
pub use reports::{SalesReports, SalesSummary};
pub use stock::{StockAdjustment, StockLedger};
pub use transaction::{SaleLine, TransactionEngine};

use std::sync::Arc;

use atlas_store::DocumentStore;

// =============================================================================
// Engine Facade
// =============================================================================

/// Main engine handle bundling the store, the shared lock registry, and
/// the rate limiter.
///
/// ## Usage
/// ```rust,ignore
/// let store = Arc::new(SqliteStore::connect(StoreConfig::new("atlas.db")).await?);
/// let engine = Engine::new(store);
///
/// let receipt = engine.transactions().commit(lines, 0, None, &actor).await?;
/// let gate = engine.login_limiter().check("amira@example.com");
/// ```
///
/// Components are cheap handles over shared state; `engine.stock()` etc.
/// can be called per request.
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn DocumentStore>,
    locks: Arc<KeyLocks>,
    limiter: Arc<LoginRateLimiter>,
}

impl Engine {
    /// Creates an engine with the default rate limiter.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Engine {
            store,
            locks: Arc::new(KeyLocks::new()),
            limiter: Arc::new(LoginRateLimiter::new()),
        }
    }

    /// Creates an engine with an explicit rate limiter (custom config or
    /// test clock).
    pub fn with_rate_limiter(store: Arc<dyn DocumentStore>, limiter: LoginRateLimiter) -> Self {
        Engine {
            store,
            locks: Arc::new(KeyLocks::new()),
            limiter: Arc::new(limiter),
        }
    }

    /// The stock ledger.
    pub fn stock(&self) -> StockLedger {
        StockLedger::new(self.store.clone(), self.locks.clone())
    }

    /// The product catalog.
    pub fn catalog(&self) -> ProductCatalog {
        ProductCatalog::new(self.store.clone(), self.locks.clone())
    }

    /// The transaction engine.
    pub fn transactions(&self) -> TransactionEngine {
        TransactionEngine::new(self.store.clone(), self.locks.clone())
    }

    /// The order fulfillment desk.
    pub fn orders(&self) -> FulfillmentDesk {
        FulfillmentDesk::new(self.store.clone(), self.locks.clone())
    }

    /// The purchase log.
    pub fn purchases(&self) -> PurchaseLog {
        PurchaseLog::new(self.store.clone())
    }

    /// Sales reports.
    pub fn reports(&self) -> SalesReports {
        SalesReports::new(self.store.clone())
    }

    /// The login rate limiter.
    pub fn login_limiter(&self) -> &LoginRateLimiter {
        &self.limiter
    }
}

// =============================================================================
// Integration Tests
// =============================================================================
