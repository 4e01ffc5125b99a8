//! Shared helpers for engine tests.

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use atlas_core::{Actor, Product, Role};
use atlas_store::keys::product_key;
use atlas_store::{put_typed, DocumentStore};

/// Writes a product document directly, bypassing the catalog.
pub async fn seed_product(store: &dyn DocumentStore, id: &str, name: &str, stock: i64) {
    seed_product_priced(store, id, name, stock, 1000, 400).await;
}

/// Writes a product document with explicit prices.
pub async fn seed_product_priced(
    store: &dyn DocumentStore,
    id: &str,
    name: &str,
    stock: i64,
    selling_price_cents: i64,
    cost_price_cents: i64,
) {
    let now = Utc::now();
    let product = Product {
        id: id.to_string(),
        name: name.to_string(),
        category: "general".to_string(),
        selling_price_cents,
        cost_price_cents,
        stock,
        description: None,
        created_at: now,
        updated_at: now,
    };
    put_typed(store, &product_key(id), &product).await.unwrap();
}

/// Installs a test subscriber so `RUST_LOG=debug cargo test` shows engine
/// activity. Safe to call from multiple tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// A cashier actor.
pub fn staff() -> Actor {
    Actor {
        user_id: "u-cashier".to_string(),
        user_name: "Amira".to_string(),
        role: Role::Cashier,
    }
}

/// A manager actor.
pub fn manager() -> Actor {
    Actor {
        user_id: "u-manager".to_string(),
        user_name: "Jonas".to_string(),
        role: Role::Manager,
    }
}
