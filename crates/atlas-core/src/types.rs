//! # Domain Types
//!
//! Core domain types used throughout Atlas POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │    Product      │   │  Transaction    │   │     Order       │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id             │   │  id             │   │  id             │        │
//! │  │  stock ≥ 0      │   │  lines[]        │   │  lines[]        │        │
//! │  │  selling_price  │   │  total, profit  │   │  status         │        │
//! │  │  cost_price     │   │  cashier        │   │  stock_reduced  │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │StockHistoryEntry│   │    Purchase     │   │   Actor/Role    │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  change (±n)    │   │  supplier       │   │  Admin          │        │
//! │  │  type, actor    │   │  funding_source │   │  Manager        │        │
//! │  │  append-only    │   │  lines[]        │   │  Cashier        │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Line items and history entries carry denormalized copies of product data
//! (name, prices) frozen at the time of the action. History must stay
//! accurate even if the product record changes later, so readers never
//! re-join against current product state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Actor & Role
// =============================================================================

/// Role of an authenticated user.
///
/// Role *gating* happens at the request boundary, before core operations
/// run. The predicates here are the single source of truth the boundary
/// consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Cashier,
}

impl Role {
    /// Stock adjustments and report reads require admin or manager.
    #[inline]
    pub const fn can_adjust_stock(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    /// Reports are visible to admin and manager.
    #[inline]
    pub const fn can_view_reports(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    /// Purchase deletion and user edits are manager-only.
    #[inline]
    pub const fn can_delete_purchases(&self) -> bool {
        matches!(self, Role::Manager)
    }
}

/// A resolved, authenticated caller.
///
/// Every mutating core operation takes an `Actor` so the audit trail can
/// attribute the change. Authentication itself (sessions, tokens) is an
/// external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub user_id: String,
    pub user_name: String,
    pub role: Role,
}

impl Actor {
    /// The attribution pair persisted on history entries and receipts.
    pub fn stamp(&self) -> ActorStamp {
        ActorStamp {
            user_id: self.user_id.clone(),
            user_name: self.user_name.clone(),
        }
    }
}

/// Attribution snapshot persisted on audit records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorStamp {
    pub user_id: String,
    pub user_name: String,
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// The `stock` field is owned exclusively by the stock ledger: nothing else
/// may write it, and every write is paired with a history entry.
/// Invariant: `stock >= 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (stable key).
    pub id: String,

    /// Display name shown to cashier and on receipts.
    pub name: String,

    /// Category for catalog grouping.
    pub category: String,

    /// Selling price in cents. Never negative.
    pub selling_price_cents: i64,

    /// Cost price in cents (for profit calculations). Never negative.
    pub cost_price_cents: i64,

    /// Current stock level. Never negative.
    pub stock: i64,

    /// Optional description for product details.
    pub description: Option<String>,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as Money.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Returns the cost price as Money.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// Checks whether `quantity` units can be taken from stock.
    #[inline]
    pub fn has_stock(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Stock History
// =============================================================================

/// What caused a stock mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockChangeType {
    /// Decrement from a committed sale.
    Transaction,
    /// Decrement from shipping a delivery order.
    Order,
    /// Manual correction by staff.
    Adjustment,
}

impl StockChangeType {
    /// Availability policy for decrements.
    ///
    /// Sales and shipments must refuse when stock is insufficient; manual
    /// corrections clamp the result to zero instead of failing.
    #[inline]
    pub const fn clamps_to_zero(&self) -> bool {
        matches!(self, StockChangeType::Adjustment)
    }
}

/// One immutable entry in the append-only stock ledger.
///
/// Created exactly once per stock mutation, never updated or deleted.
/// Reconciliation invariant: for any product,
/// `initial stock + Σ(change) = current stock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockHistoryEntry {
    pub id: String,
    pub product_id: String,
    /// Product name frozen at mutation time.
    pub product_name: String,
    /// Signed stock delta actually applied.
    pub change: i64,
    pub change_type: StockChangeType,
    pub timestamp: DateTime<Utc>,
    pub actor: ActorStamp,
    pub reason: Option<String>,
}

// =============================================================================
// Transaction (sale receipt)
// =============================================================================

/// A line item on a receipt. Prices are frozen at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLine {
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    /// Quantity sold. Always positive.
    pub quantity: i64,
    /// Unit selling price in cents at time of sale (frozen).
    pub selling_price_cents: i64,
    /// Unit cost price in cents at time of sale (frozen).
    pub cost_price_cents: i64,
    /// selling_price × quantity.
    pub line_total_cents: i64,
    /// cost_price × quantity.
    pub line_cost_cents: i64,
}

/// A committed sale. Immutable once created.
///
/// Arithmetic contract:
/// - `subtotal = Σ line_total`
/// - `total = max(0, subtotal − discount)`
/// - `cogs = Σ line_cost`
/// - `profit = total − cogs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    /// Line items in input order.
    pub items: Vec<TransactionLine>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub cogs_cents: i64,
    pub profit_cents: i64,
    pub payment_method: Option<String>,
    pub cashier: ActorStamp,
    pub timestamp: DateTime<Utc>,
    /// ISO date component of `timestamp` (e.g. "2026-08-07"), denormalized
    /// for day-bucketed reporting.
    pub date: String,
}

impl Transaction {
    /// Total units across all lines.
    pub fn units_sold(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

// =============================================================================
// Order (delivery fulfillment)
// =============================================================================

/// Delivery order lifecycle state.
///
/// ```text
/// pending ──► shipped ──► delivered (terminal)
/// ```
///
/// Transitions are forward-only. Re-requesting the current state is allowed
/// (shipping twice is an explicit stock no-op); nothing leaves `delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// Whether the machine permits moving from `self` to `next`.
    ///
    /// Relies on declaration order: Pending < Shipped < Delivered.
    #[inline]
    pub fn allows(self, next: OrderStatus) -> bool {
        self != OrderStatus::Delivered && next >= self
    }
}

/// A line item on a delivery order. Price frozen at order creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    /// Unit selling price in cents at order creation (frozen).
    pub selling_price_cents: i64,
    pub line_total_cents: i64,
}

/// A delivery order.
///
/// `stock_reduced` is monotonic false→true and flips exactly once, coupled
/// to the pending→shipped transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub items: Vec<OrderLine>,
    pub total_amount_cents: i64,
    pub delivery_date: NaiveDate,
    pub delivery_time: Option<String>,
    pub status: OrderStatus,
    pub stock_reduced: bool,
    pub notes: Option<String>,
    pub creator: ActorStamp,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub shipped_by: Option<ActorStamp>,
    pub delivered_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Purchase (supplier intake)
// =============================================================================

/// Default funding source when none is supplied.
pub const DEFAULT_FUNDING_SOURCE: &str = "company";

/// A line item on a supplier purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLine {
    pub item_name: String,
    pub quantity: i64,
    pub purchase_price_cents: i64,
    /// Unit of measure ("kg", "box", "pcs", ...).
    pub unit: String,
    pub line_total_cents: i64,
}

/// A supplier purchase. Immutable once created, except for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: String,
    pub supplier: Option<String>,
    /// Where the money came from; defaults to [`DEFAULT_FUNDING_SOURCE`].
    pub funding_source: String,
    pub funding_owner: Option<String>,
    pub items: Vec<PurchaseLine>,
    pub total_amount_cents: i64,
    pub purchase_date: NaiveDate,
    pub creator: ActorStamp,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_gates() {
        assert!(Role::Admin.can_adjust_stock());
        assert!(Role::Manager.can_adjust_stock());
        assert!(!Role::Cashier.can_adjust_stock());

        assert!(Role::Manager.can_delete_purchases());
        assert!(!Role::Admin.can_delete_purchases());
    }

    #[test]
    fn test_order_status_forward_only() {
        use OrderStatus::*;

        assert!(Pending.allows(Shipped));
        assert!(Pending.allows(Delivered));
        assert!(Shipped.allows(Delivered));

        // Re-requesting the current state is permitted
        assert!(Pending.allows(Pending));
        assert!(Shipped.allows(Shipped));

        // Backward and out-of-terminal are not
        assert!(!Shipped.allows(Pending));
        assert!(!Delivered.allows(Delivered));
        assert!(!Delivered.allows(Shipped));
        assert!(!Delivered.allows(Pending));
    }

    #[test]
    fn test_change_type_policy() {
        assert!(StockChangeType::Adjustment.clamps_to_zero());
        assert!(!StockChangeType::Transaction.clamps_to_zero());
        assert!(!StockChangeType::Order.clamps_to_zero());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");

        let parsed: OrderStatus = serde_json::from_str("\"delivered\"").unwrap();
        assert_eq!(parsed, OrderStatus::Delivered);

        // Status values outside the three are rejected
        assert!(serde_json::from_str::<OrderStatus>("\"cancelled\"").is_err());
    }

    #[test]
    fn test_product_has_stock() {
        let product = Product {
            id: "p1".to_string(),
            name: "Rice 5kg".to_string(),
            category: "staples".to_string(),
            selling_price_cents: 1200,
            cost_price_cents: 900,
            stock: 3,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(product.has_stock(3));
        assert!(!product.has_stock(4));
    }
}
