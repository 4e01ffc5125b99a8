//! # Product Catalog
//!
//! Catalog CRUD for products.
//!
//! The `stock` field is out of bounds here: creation sets the initial
//! level (the reconciliation baseline), and every later movement funnels
//! through the stock ledger so it lands in the audit history. A catalog
//! update that could silently rewrite stock would bypass the ledger.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use atlas_core::validation::{validate_actor, validate_id, validate_name, validate_price_cents, validate_stock_level};
use atlas_core::{generate_id, Actor, Product};
use atlas_store::keys::{product_key, PRODUCT_PREFIX};
use atlas_store::{get_typed, put_typed, scan_typed, DocumentStore};

use crate::error::{EngineError, EngineResult};
use crate::locks::KeyLocks;

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub selling_price_cents: i64,
    pub cost_price_cents: i64,
    /// Initial stock level; the baseline the history ledger reconciles from.
    pub initial_stock: i64,
    pub description: Option<String>,
}

/// Patchable product fields. `None` leaves a field unchanged.
///
/// There is intentionally no `stock` field.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub selling_price_cents: Option<i64>,
    pub cost_price_cents: Option<i64>,
    pub description: Option<String>,
}

/// Catalog operations.
#[derive(Clone)]
pub struct ProductCatalog {
    store: Arc<dyn DocumentStore>,
    locks: Arc<KeyLocks>,
}

impl ProductCatalog {
    /// Creates a new catalog over the given store and lock registry.
    pub fn new(store: Arc<dyn DocumentStore>, locks: Arc<KeyLocks>) -> Self {
        ProductCatalog { store, locks }
    }

    /// Creates a product.
    pub async fn create(&self, new: NewProduct, actor: &Actor) -> EngineResult<Product> {
        validate_actor(actor)?;
        validate_name(&new.name)?;
        validate_price_cents(new.selling_price_cents)?;
        validate_price_cents(new.cost_price_cents)?;
        validate_stock_level(new.initial_stock)?;

        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            name: new.name.trim().to_string(),
            category: new.category.trim().to_string(),
            selling_price_cents: new.selling_price_cents,
            cost_price_cents: new.cost_price_cents,
            stock: new.initial_stock,
            description: new.description,
            created_at: now,
            updated_at: now,
        };

        put_typed(self.store.as_ref(), &product_key(&product.id), &product).await?;

        info!(id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Lists all products, sorted by name.
    pub async fn list(&self) -> EngineResult<Vec<Product>> {
        let mut products: Vec<Product> = scan_typed(self.store.as_ref(), PRODUCT_PREFIX).await?;
        products.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(count = products.len(), "Products listed");
        Ok(products)
    }

    /// Gets a product by id.
    pub async fn get(&self, id: &str) -> EngineResult<Product> {
        validate_id(id)?;

        get_typed(self.store.as_ref(), &product_key(id))
            .await?
            .ok_or_else(|| EngineError::not_found("Product", id))
    }

    /// Updates catalog fields of a product.
    ///
    /// Takes the product's lock: the update is a read-modify-write of the
    /// same document the stock ledger mutates, and an unserialized write
    /// would clobber a concurrent stock movement.
    pub async fn update(&self, id: &str, patch: ProductPatch, actor: &Actor) -> EngineResult<Product> {
        validate_id(id)?;
        validate_actor(actor)?;

        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if let Some(cents) = patch.selling_price_cents {
            validate_price_cents(cents)?;
        }
        if let Some(cents) = patch.cost_price_cents {
            validate_price_cents(cents)?;
        }

        let key = product_key(id);
        let _guard = self.locks.lock(&key).await;

        let mut product: Product = get_typed(self.store.as_ref(), &key)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", id))?;

        if let Some(name) = patch.name {
            product.name = name.trim().to_string();
        }
        if let Some(category) = patch.category {
            product.category = category.trim().to_string();
        }
        if let Some(cents) = patch.selling_price_cents {
            product.selling_price_cents = cents;
        }
        if let Some(cents) = patch.cost_price_cents {
            product.cost_price_cents = cents;
        }
        if let Some(description) = patch.description {
            product.description = Some(description);
        }
        product.updated_at = Utc::now();

        put_typed(self.store.as_ref(), &key, &product).await?;

        info!(id = %id, "Product updated");
        Ok(product)
    }

    /// Deletes a product.
    ///
    /// History entries referencing it are retained: they carry their own
    /// name/price snapshots and stay meaningful.
    pub async fn delete(&self, id: &str, actor: &Actor) -> EngineResult<()> {
        validate_id(id)?;
        validate_actor(actor)?;

        let key = product_key(id);
        let _guard = self.locks.lock(&key).await;

        // Confirm existence so deletion of an unknown id reports NotFound
        let _: Product = get_typed(self.store.as_ref(), &key)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", id))?;

        self.store.delete(&key).await?;

        info!(id = %id, "Product deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::manager;
    use atlas_store::MemoryStore;

    fn catalog(store: &Arc<MemoryStore>) -> ProductCatalog {
        ProductCatalog::new(store.clone() as Arc<dyn DocumentStore>, Arc::new(KeyLocks::new()))
    }

    fn new_product(name: &str, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            category: "staples".to_string(),
            selling_price_cents: 1200,
            cost_price_cents: 900,
            initial_stock: stock,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = Arc::new(MemoryStore::new());
        let catalog = catalog(&store);
        let actor = manager();

        let created = catalog.create(new_product("Rice 5kg", 10), &actor).await.unwrap();
        assert_eq!(created.stock, 10);

        let fetched = catalog.get(&created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let store = Arc::new(MemoryStore::new());
        let catalog = catalog(&store);
        let actor = manager();

        let mut bad = new_product("", 10);
        assert!(matches!(
            catalog.create(bad, &actor).await.unwrap_err(),
            EngineError::Validation(_)
        ));

        bad = new_product("Rice 5kg", -1);
        assert!(matches!(
            catalog.create(bad, &actor).await.unwrap_err(),
            EngineError::Validation(_)
        ));

        bad = new_product("Rice 5kg", 10);
        bad.selling_price_cents = -5;
        assert!(matches!(
            catalog.create(bad, &actor).await.unwrap_err(),
            EngineError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let store = Arc::new(MemoryStore::new());
        let catalog = catalog(&store);
        let actor = manager();

        catalog.create(new_product("Sugar 1kg", 5), &actor).await.unwrap();
        catalog.create(new_product("Rice 5kg", 5), &actor).await.unwrap();

        let listed = catalog.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "Rice 5kg");
        assert_eq!(listed[1].name, "Sugar 1kg");
    }

    #[tokio::test]
    async fn test_update_patches_fields_but_never_stock() {
        let store = Arc::new(MemoryStore::new());
        let catalog = catalog(&store);
        let actor = manager();

        let created = catalog.create(new_product("Rice 5kg", 10), &actor).await.unwrap();

        let patch = ProductPatch {
            name: Some("Rice 10kg".to_string()),
            selling_price_cents: Some(2200),
            ..Default::default()
        };
        let updated = catalog.update(&created.id, patch, &actor).await.unwrap();

        assert_eq!(updated.name, "Rice 10kg");
        assert_eq!(updated.selling_price_cents, 2200);
        assert_eq!(updated.category, "staples");
        // Stock untouched by catalog updates
        assert_eq!(updated.stock, 10);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let catalog = catalog(&store);
        let actor = manager();

        let created = catalog.create(new_product("Rice 5kg", 10), &actor).await.unwrap();
        catalog.delete(&created.id, &actor).await.unwrap();

        assert!(matches!(
            catalog.get(&created.id).await.unwrap_err(),
            EngineError::NotFound { .. }
        ));
        assert!(matches!(
            catalog.delete(&created.id, &actor).await.unwrap_err(),
            EngineError::NotFound { .. }
        ));
    }
}
