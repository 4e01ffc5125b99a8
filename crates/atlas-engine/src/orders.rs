//! # Order Fulfillment
//!
//! Tracks delivery orders through `pending → shipped → delivered` and
//! couples the one-time stock decrement to the shipment transition.
//!
//! ## The Shipment Transition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 transition(order, shipped, ...)                         │
//! │                                                                         │
//! │  lock(order:<id>)                                                       │
//! │       │                                                                 │
//! │       ├── stock_reduced already true ──► stock no-op (idempotent)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lock every line's product (sorted) ──► pre-validate availability       │
//! │       │                                                                 │
//! │       ├── any line short ──► InsufficientStock                          │
//! │       │                      order stays pending, stock untouched       │
//! │       ▼                                                                 │
//! │  decrement each line (type=order, reason=customer)                      │
//! │  stock_reduced = true, shipped_at, shipped_by                           │
//! │                                                                         │
//! │  Invariant: stock_reduced ⟺ the order passed through shipped;           │
//! │  items are decremented AT MOST ONCE however often shipped is            │
//! │  re-requested.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lock ordering is `order:` before `product:` everywhere, so shipment
//! cannot deadlock against sale commits (which take product locks only).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use atlas_core::validation::{
    validate_actor, validate_id, validate_line_count, validate_quantity,
};
use atlas_core::{
    generate_id, Actor, Money, Order, OrderLine, OrderStatus, Product, StockChangeType,
    ValidationError,
};
use atlas_store::keys::{order_key, product_key, ORDER_PREFIX};
use atlas_store::{get_typed, put_typed, scan_typed, DocumentStore};

use crate::error::{EngineError, EngineResult};
use crate::locks::KeyLocks;
use crate::stock::StockLedger;

/// One requested order line.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Input for creating a delivery order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub items: Vec<NewOrderLine>,
    pub delivery_date: NaiveDate,
    pub delivery_time: Option<String>,
    pub notes: Option<String>,
}

/// Patchable order fields, applied independent of status.
/// `status` itself always funnels through [`FulfillmentDesk::transition`].
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<String>,
    pub notes: Option<String>,
}

/// The order fulfillment state machine.
#[derive(Clone)]
pub struct FulfillmentDesk {
    store: Arc<dyn DocumentStore>,
    locks: Arc<KeyLocks>,
    ledger: StockLedger,
}

impl FulfillmentDesk {
    /// Creates a new desk sharing the ledger's store and locks.
    pub fn new(store: Arc<dyn DocumentStore>, locks: Arc<KeyLocks>) -> Self {
        let ledger = StockLedger::new(store.clone(), locks.clone());
        FulfillmentDesk {
            store,
            locks,
            ledger,
        }
    }

    /// Creates an order in `pending`. Stock is untouched until shipment.
    pub async fn create(&self, new: NewOrder, actor: &Actor) -> EngineResult<Order> {
        validate_actor(actor)?;
        validate_line_count(new.items.len())?;
        for item in &new.items {
            validate_id(&item.product_id)?;
            validate_quantity(item.quantity)?;
        }

        // Freeze name and price snapshots from the current catalog
        let mut items = Vec::with_capacity(new.items.len());
        let mut total = Money::zero();
        for item in &new.items {
            let product: Product =
                get_typed(self.store.as_ref(), &product_key(&item.product_id))
                    .await?
                    .ok_or_else(|| EngineError::not_found("Product", &item.product_id))?;

            let line_total = product.selling_price().multiply_quantity(item.quantity);
            total += line_total;
            items.push(OrderLine {
                product_id: product.id,
                product_name: product.name,
                quantity: item.quantity,
                selling_price_cents: product.selling_price_cents,
                line_total_cents: line_total.cents(),
            });
        }

        let now = Utc::now();
        let order = Order {
            id: generate_id(),
            customer_name: new.customer_name,
            customer_phone: new.customer_phone,
            customer_address: new.customer_address,
            items,
            total_amount_cents: total.cents(),
            delivery_date: new.delivery_date,
            delivery_time: new.delivery_time,
            status: OrderStatus::Pending,
            stock_reduced: false,
            notes: new.notes,
            creator: actor.stamp(),
            created_at: now,
            updated_at: now,
            shipped_at: None,
            shipped_by: None,
            delivered_at: None,
        };

        put_typed(self.store.as_ref(), &order_key(&order.id), &order).await?;

        info!(id = %order.id, total = %total, "Order created");
        Ok(order)
    }

    /// Moves an order through the state machine, applying `patch` alongside.
    ///
    /// ## Transitions
    /// - `pending → shipped`: decrements stock for every line exactly once
    ///   (guarded by `stock_reduced`); on any insufficiency the whole
    ///   transition fails and nothing is written
    /// - `* → delivered`: stamps `delivered_at`; never touches stock
    /// - backward moves and anything out of `delivered`: rejected
    pub async fn transition(
        &self,
        order_id: &str,
        new_status: OrderStatus,
        patch: OrderPatch,
        actor: &Actor,
    ) -> EngineResult<Order> {
        validate_id(order_id)?;
        validate_actor(actor)?;

        let key = order_key(order_id);
        let _order_guard = self.locks.lock(&key).await;

        let mut order: Order = get_typed(self.store.as_ref(), &key)
            .await?
            .ok_or_else(|| EngineError::not_found("Order", order_id))?;

        if !order.status.allows(new_status) {
            return Err(ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: format!("cannot move from {:?} to {:?}", order.status, new_status),
            }
            .into());
        }

        apply_patch(&mut order, patch);

        let now = Utc::now();
        if new_status == OrderStatus::Shipped && !order.stock_reduced {
            // One-time stock decrement, coupled to this transition
            self.reduce_stock(&order, actor).await?;
            order.stock_reduced = true;
            order.shipped_at = Some(now);
            order.shipped_by = Some(actor.stamp());
        }
        if new_status == OrderStatus::Delivered && order.delivered_at.is_none() {
            order.delivered_at = Some(now);
        }

        order.status = new_status;
        order.updated_at = now;

        put_typed(self.store.as_ref(), &key, &order).await?;

        info!(
            id = %order_id,
            status = ?new_status,
            stock_reduced = order.stock_reduced,
            "Order transitioned"
        );
        Ok(order)
    }

    /// Decrements stock for every line, all-or-nothing.
    async fn reduce_stock(&self, order: &Order, actor: &Actor) -> EngineResult<()> {
        let keys: Vec<String> = order
            .items
            .iter()
            .map(|item| product_key(&item.product_id))
            .collect();
        let _guards = self.locks.lock_many(keys).await;

        // Pre-validate the aggregate per product before touching anything
        let mut requested: HashMap<&str, i64> = HashMap::new();
        for item in &order.items {
            *requested.entry(item.product_id.as_str()).or_default() += item.quantity;
        }
        for (product_id, quantity) in &requested {
            let product: Product = get_typed(self.store.as_ref(), &product_key(product_id))
                .await?
                .ok_or_else(|| EngineError::not_found("Product", *product_id))?;
            if !product.has_stock(*quantity) {
                return Err(EngineError::InsufficientStock {
                    product_id: product.id,
                    product_name: product.name,
                    available: product.stock,
                    requested: *quantity,
                });
            }
        }

        let reason = order
            .customer_name
            .clone()
            .unwrap_or_else(|| "Delivery order".to_string());
        for item in &order.items {
            self.ledger
                .apply_locked(
                    &item.product_id,
                    -item.quantity,
                    StockChangeType::Order,
                    actor,
                    Some(reason.as_str()),
                )
                .await?;
        }

        debug!(id = %order.id, lines = order.items.len(), "Order stock reduced");
        Ok(())
    }

    /// Lists orders, newest first.
    pub async fn list(&self) -> EngineResult<Vec<Order>> {
        let mut orders: Vec<Order> = scan_typed(self.store.as_ref(), ORDER_PREFIX).await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Gets an order by id.
    pub async fn get(&self, id: &str) -> EngineResult<Order> {
        validate_id(id)?;

        get_typed(self.store.as_ref(), &order_key(id))
            .await?
            .ok_or_else(|| EngineError::not_found("Order", id))
    }

    /// Deletes an order.
    ///
    /// Deletion never credits stock back; returned goods go through a
    /// manual adjustment so the movement is audited.
    pub async fn delete(&self, id: &str, actor: &Actor) -> EngineResult<()> {
        validate_id(id)?;
        validate_actor(actor)?;

        let key = order_key(id);
        let _guard = self.locks.lock(&key).await;

        let _: Order = get_typed(self.store.as_ref(), &key)
            .await?
            .ok_or_else(|| EngineError::not_found("Order", id))?;

        self.store.delete(&key).await?;

        info!(id = %id, "Order deleted");
        Ok(())
    }
}

/// Applies non-status patch fields.
fn apply_patch(order: &mut Order, patch: OrderPatch) {
    if let Some(name) = patch.customer_name {
        order.customer_name = Some(name);
    }
    if let Some(phone) = patch.customer_phone {
        order.customer_phone = Some(phone);
    }
    if let Some(address) = patch.customer_address {
        order.customer_address = Some(address);
    }
    if let Some(date) = patch.delivery_date {
        order.delivery_date = date;
    }
    if let Some(time) = patch.delivery_time {
        order.delivery_time = Some(time);
    }
    if let Some(notes) = patch.notes {
        order.notes = Some(notes);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
