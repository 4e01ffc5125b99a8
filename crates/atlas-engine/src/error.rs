//! # Engine Error Types
//!
//! The failure contract of every core operation.
//!
//! ## Error Kinds
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         EngineError                                     │
//! │                                                                         │
//! │  Validation        caller input is malformed; fix input and retry       │
//! │  NotFound          unknown product/order/purchase id                    │
//! │  InsufficientStock decrement exceeds available stock; aborts the        │
//! │                    enclosing multi-line operation, no partial retry     │
//! │  PermissionDenied  role check failed (enforced at the boundary)         │
//! │  RateLimited       login lockout active; carries the expiry             │
//! │  Store             the persistence call itself failed; surfaced as-is,  │
//! │                    never silently swallowed, never retried here         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Propagation Policy
//! Operations report failure explicitly rather than leave ambiguous partial
//! state. Multi-step mutations pre-validate under per-key locks so that a
//! failure aborts before anything is written.

use chrono::{DateTime, Utc};
use thiserror::Error;

use atlas_core::ValidationError;
use atlas_store::StoreError;

/// Core operation failures.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or missing input. Always recoverable by the caller
    /// correcting input; never retried internally.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Unknown entity id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Requested quantity exceeds available stock at decrement time.
    ///
    /// ## User Workflow
    /// ```text
    /// Commit sale (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Rice 5kg", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 Rice 5kg in stock"
    /// ```
    #[error("Insufficient stock for {product_name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        product_name: String,
        available: i64,
        requested: i64,
    },

    /// Role check failed. Enforced at the boundary, before core logic runs;
    /// the variant exists so the boundary speaks the same error language.
    #[error("Permission denied: {role} may not {action}")]
    PermissionDenied { role: String, action: String },

    /// Login lockout active. Carries the expiry so the caller can present
    /// a wait time.
    #[error("Too many login attempts; locked until {locked_until}")]
    RateLimited { locked_until: DateTime<Utc> },

    /// The underlying persistence call failed.
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convenience type alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
