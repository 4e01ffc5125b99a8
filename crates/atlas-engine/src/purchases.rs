//! # Purchase Log
//!
//! Records supplier purchases: what was bought, from whom, and which funds
//! paid for it. Purchases are financial records only — received goods enter
//! inventory through a manual stock adjustment, so the movement lands in
//! the audit history with an actor and reason.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use atlas_core::validation::{
    validate_actor, validate_id, validate_line_count, validate_name, validate_price_cents,
    validate_quantity,
};
use atlas_core::{generate_id, Actor, Money, Purchase, PurchaseLine, DEFAULT_FUNDING_SOURCE};
use atlas_store::keys::{purchase_key, PURCHASE_PREFIX};
use atlas_store::{get_typed, put_typed, scan_typed, DocumentStore};

use crate::error::{EngineError, EngineResult};

/// One requested purchase line.
#[derive(Debug, Clone)]
pub struct NewPurchaseLine {
    pub item_name: String,
    pub quantity: i64,
    pub purchase_price_cents: i64,
    pub unit: String,
}

/// Input for recording a purchase.
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub supplier: Option<String>,
    /// Defaults to [`DEFAULT_FUNDING_SOURCE`] when `None`.
    pub funding_source: Option<String>,
    pub funding_owner: Option<String>,
    pub items: Vec<NewPurchaseLine>,
    pub purchase_date: NaiveDate,
}

/// Purchase record operations.
#[derive(Clone)]
pub struct PurchaseLog {
    store: Arc<dyn DocumentStore>,
}

impl PurchaseLog {
    /// Creates a new log over the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        PurchaseLog { store }
    }

    /// Records a purchase.
    pub async fn create(&self, new: NewPurchase, actor: &Actor) -> EngineResult<Purchase> {
        validate_actor(actor)?;
        validate_line_count(new.items.len())?;
        for item in &new.items {
            validate_name(&item.item_name)?;
            validate_quantity(item.quantity)?;
            validate_price_cents(item.purchase_price_cents)?;
        }

        let mut items = Vec::with_capacity(new.items.len());
        let mut total = Money::zero();
        for item in new.items {
            let line_total =
                Money::from_cents(item.purchase_price_cents).multiply_quantity(item.quantity);
            total += line_total;
            items.push(PurchaseLine {
                item_name: item.item_name.trim().to_string(),
                quantity: item.quantity,
                purchase_price_cents: item.purchase_price_cents,
                unit: item.unit,
                line_total_cents: line_total.cents(),
            });
        }

        let now = Utc::now();
        let purchase = Purchase {
            id: generate_id(),
            supplier: new.supplier,
            funding_source: new
                .funding_source
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FUNDING_SOURCE.to_string()),
            funding_owner: new.funding_owner,
            items,
            total_amount_cents: total.cents(),
            purchase_date: new.purchase_date,
            creator: actor.stamp(),
            created_at: now,
            updated_at: now,
        };

        put_typed(self.store.as_ref(), &purchase_key(&purchase.id), &purchase).await?;

        info!(id = %purchase.id, total = %total, "Purchase recorded");
        Ok(purchase)
    }

    /// Lists purchases, newest purchase date first.
    pub async fn list(&self) -> EngineResult<Vec<Purchase>> {
        let mut purchases: Vec<Purchase> = scan_typed(self.store.as_ref(), PURCHASE_PREFIX).await?;
        purchases.sort_by(|a, b| {
            b.purchase_date
                .cmp(&a.purchase_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        debug!(count = purchases.len(), "Purchases listed");
        Ok(purchases)
    }

    /// Gets a purchase by id.
    pub async fn get(&self, id: &str) -> EngineResult<Purchase> {
        validate_id(id)?;

        get_typed(self.store.as_ref(), &purchase_key(id))
            .await?
            .ok_or_else(|| EngineError::not_found("Purchase", id))
    }

    /// Deletes a purchase. Manager-gated at the boundary.
    pub async fn delete(&self, id: &str, actor: &Actor) -> EngineResult<()> {
        validate_id(id)?;
        validate_actor(actor)?;

        let key = purchase_key(id);
        let _: Purchase = get_typed(self.store.as_ref(), &key)
            .await?
            .ok_or_else(|| EngineError::not_found("Purchase", id))?;

        self.store.delete(&key).await?;

        info!(id = %id, "Purchase deleted");
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

    fn log(store: &Arc<MemoryStore>) -> PurchaseLog {
        PurchaseLog::new(store.clone() as Arc<dyn DocumentStore>)
    }

    fn new_purchase() -> NewPurchase {
        NewPurchase {
            supplier: Some("Hill Farm Co-op".to_string()),
            funding_source: None,
            funding_owner: None,
            items: vec![
                NewPurchaseLine {
                    item_name: "Rice".to_string(),
                    quantity: 20,
                    purchase_price_cents: 850,
                    unit: "kg".to_string(),
                },
                NewPurchaseLine {
                    item_name: "Sugar".to_string(),
                    quantity: 10,
                    purchase_price_cents: 120,
                    unit: "kg".to_string(),
                },
            ],
            purchase_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_computes_totals_and_defaults_funding() {
        let store = Arc::new(MemoryStore::new());
        let log = log(&store);
        let actor = manager();

        let purchase = log.create(new_purchase(), &actor).await.unwrap();

        assert_eq!(purchase.funding_source, "company");
        assert_eq!(purchase.items[0].line_total_cents, 17000);
        assert_eq!(purchase.items[1].line_total_cents, 1200);
        assert_eq!(purchase.total_amount_cents, 18200);
        assert_eq!(purchase.creator.user_id, actor.user_id);
    }

    #[tokio::test]
    async fn test_explicit_funding_source_kept() {
        let store = Arc::new(MemoryStore::new());
        let log = log(&store);
        let actor = manager();

        let mut input = new_purchase();
        input.funding_source = Some("personal".to_string());
        input.funding_owner = Some("Jonas".to_string());

        let purchase = log.create(input, &actor).await.unwrap();
        assert_eq!(purchase.funding_source, "personal");
        assert_eq!(purchase.funding_owner.as_deref(), Some("Jonas"));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_lines() {
        let store = Arc::new(MemoryStore::new());
        let log = log(&store);
        let actor = manager();

        let mut input = new_purchase();
        input.items.clear();
        assert!(matches!(
            log.create(input, &actor).await.unwrap_err(),
            EngineError::Validation(_)
        ));

        let mut input = new_purchase();
        input.items[0].quantity = 0;
        assert!(matches!(
            log.create(input, &actor).await.unwrap_err(),
            EngineError::Validation(_)
        ));

        let mut input = new_purchase();
        input.items[0].purchase_price_cents = -1;
        assert!(matches!(
            log.create(input, &actor).await.unwrap_err(),
            EngineError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_get_list_delete() {
        let store = Arc::new(MemoryStore::new());
        let log = log(&store);
        let actor = manager();

        let purchase = log.create(new_purchase(), &actor).await.unwrap();

        let fetched = log.get(&purchase.id).await.unwrap();
        assert_eq!(fetched.id, purchase.id);

        assert_eq!(log.list().await.unwrap().len(), 1);

        log.delete(&purchase.id, &actor).await.unwrap();
        assert!(matches!(
            log.get(&purchase.id).await.unwrap_err(),
            EngineError::NotFound { .. }
        ));
        assert!(matches!(
            log.delete(&purchase.id, &actor).await.unwrap_err(),
            EngineError::NotFound { .. }
        ));
    }
}
