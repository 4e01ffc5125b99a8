//! # Key Shapes
//!
//! Persisted key shapes for the document store. These are a stable
//! contract: prefix scans depend on them, and changing a prefix orphans
//! every existing document of that kind.
//!
//! ```text
//! product:<id>          catalog entries
//! transaction:<id>      committed sale receipts
//! stock_history:<id>    append-only stock ledger entries
//! order:<id>            delivery orders
//! purchase:<id>         supplier purchases
//! ```

/// Prefix for product documents.
pub const PRODUCT_PREFIX: &str = "product:";

/// Prefix for transaction (receipt) documents.
pub const TRANSACTION_PREFIX: &str = "transaction:";

/// Prefix for stock history documents.
pub const STOCK_HISTORY_PREFIX: &str = "stock_history:";

/// Prefix for delivery order documents.
pub const ORDER_PREFIX: &str = "order:";

/// Prefix for purchase documents.
pub const PURCHASE_PREFIX: &str = "purchase:";

/// Key for a product document.
pub fn product_key(id: &str) -> String {
    format!("{PRODUCT_PREFIX}{id}")
}

/// Key for a transaction document.
pub fn transaction_key(id: &str) -> String {
    format!("{TRANSACTION_PREFIX}{id}")
}

/// Key for a stock history document.
pub fn stock_history_key(id: &str) -> String {
    format!("{STOCK_HISTORY_PREFIX}{id}")
}

/// Key for an order document.
pub fn order_key(id: &str) -> String {
    format!("{ORDER_PREFIX}{id}")
}

/// Key for a purchase document.
pub fn purchase_key(id: &str) -> String {
    format!("{PURCHASE_PREFIX}{id}")
}
