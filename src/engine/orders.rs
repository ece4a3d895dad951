// Order placement and fulfillment workflow
//
// This is the one genuinely stateful operation in the service. Placement
// runs in three phases:
//
// 1. **Validate and price** (read-only): resolve the customer, resolve
//    every product, reject bad quantities and short stock, snapshot unit
//    prices into line subtotals, resolve tax from the shipping country.
//    Any failure here aborts before a single row has been touched.
// 2. **Atomic commit**: hand the fully priced draft to storage, which
//    re-checks stock under exclusive access and writes order + items +
//    stock decrements as one unit. Concurrent placements against the same
//    product serialize here - two requests that would jointly oversell
//    can never both succeed.
// 3. **Notify** (fire-and-forget): publish the order event on the global
//    created topic and the per-order updated topic. Subscriber trouble
//    can never fail or roll back the placement.
//
// No retry is attempted anywhere; a failed placement is simply resubmitted
// by the caller.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::engine::events::{topic_order_created, topic_order_updated, EventBus};
use crate::engine::storage::{OrderDraft, OrderLine, StoreStorage};
use crate::engine::tax::TaxTable;
use crate::models::{Order, OrderEvent, OrderItem, OrderItemRequest, OrderStatus};
use crate::{Result, StorefrontError};

/// The order placement and status-update workflow
///
/// Owns no state of its own - storage, bus, and tax table are all handed
/// in at construction, so the engine is cheap to clone and trivial to wire
/// up against test doubles.
#[derive(Clone)]
pub struct OrderEngine {
    storage: Arc<dyn StoreStorage>,
    events: EventBus,
    tax: TaxTable,
}

impl OrderEngine {
    /// Create an engine with the built-in tax table
    pub fn new(storage: Arc<dyn StoreStorage>, events: EventBus) -> Self {
        Self {
            storage,
            events,
            tax: TaxTable::default(),
        }
    }

    /// Replace the tax table (used by tests and custom deployments)
    pub fn with_tax_table(mut self, tax: TaxTable) -> Self {
        self.tax = tax;
        self
    }

    /// Place an order for a customer
    ///
    /// Validates every requested item against current inventory, computes
    /// totals with the unit price snapshotted at this moment, applies tax
    /// resolved from the shipping country (zero when unmapped or absent),
    /// persists atomically, decrements stock, and publishes two
    /// notifications.
    ///
    /// ## Errors
    /// - `InvalidInput`: empty item list or a non-positive quantity
    /// - `NotFound`: unknown customer or product id
    /// - `InsufficientStock`: a quantity exceeds available stock, at
    ///   validation time or at commit time under concurrency
    /// - `Persistence`: the commit itself failed; nothing was written
    pub async fn place_order(
        &self,
        customer_id: i64,
        items: &[OrderItemRequest],
        shipping_country: Option<&str>,
    ) -> Result<(Order, Vec<OrderItem>)> {
        if items.is_empty() {
            return Err(StorefrontError::InvalidInput(
                "items cannot be empty".to_string(),
            ));
        }

        self.storage
            .get_customer(customer_id)
            .await?
            .ok_or_else(|| {
                StorefrontError::NotFound(format!("customer {} not found", customer_id))
            })?;

        // Validate and price every line before any mutation. Quantities
        // for the same product accumulate across lines - sufficiency is
        // checked against the running total, so duplicate lines cannot
        // slip past a per-line check.
        let mut subtotal_cents = 0i64;
        let mut requested: HashMap<i64, i64> = HashMap::new();
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            if item.quantity <= 0 {
                return Err(StorefrontError::InvalidInput(format!(
                    "quantity must be positive, got {} for product {}",
                    item.quantity, item.product_id
                )));
            }

            let product = self
                .storage
                .get_product(item.product_id)
                .await?
                .ok_or_else(|| {
                    StorefrontError::NotFound(format!("product {} not found", item.product_id))
                })?;

            let total_requested = requested.entry(product.id).or_insert(0);
            *total_requested += item.quantity;
            if product.stock < *total_requested {
                return Err(StorefrontError::InsufficientStock {
                    product_id: product.id,
                    requested: *total_requested,
                    available: product.stock,
                });
            }

            // Snapshot the unit price - later product price changes must
            // never retroactively alter this line. Amounts are checked so
            // an absurd price/quantity pair errors instead of wrapping.
            let line_subtotal = product
                .price_cents
                .checked_mul(item.quantity)
                .ok_or_else(|| {
                    StorefrontError::InvalidInput(format!(
                        "order amount overflows for product {}",
                        item.product_id
                    ))
                })?;
            subtotal_cents = subtotal_cents.checked_add(line_subtotal).ok_or_else(|| {
                StorefrontError::InvalidInput("order amount overflows".to_string())
            })?;
            lines.push(OrderLine {
                product_id: product.id,
                quantity: item.quantity,
                unit_price_cents: product.price_cents,
                subtotal_cents: line_subtotal,
            });
        }

        let shipping_country = shipping_country.map(|c| c.to_uppercase());
        let tax_cents = self.tax.tax_cents(subtotal_cents, shipping_country.as_deref());
        let total_cents = subtotal_cents.checked_add(tax_cents).ok_or_else(|| {
            StorefrontError::InvalidInput("order amount overflows".to_string())
        })?;

        // Atomic commit: order + items + stock decrements, all or nothing.
        // Storage re-checks stock under exclusive access, so a concurrent
        // placement that got past our read-time check still cannot oversell.
        let (order, order_items) = self
            .storage
            .commit_order(OrderDraft {
                customer_id,
                subtotal_cents,
                tax_cents,
                total_cents,
                shipping_country,
                lines,
            })
            .await?;

        // Notifications go out only after the commit; they are best-effort
        // and may race with a subscriber's own read of the new order
        let event = OrderEvent::for_order(&order);
        self.events
            .publish(&topic_order_created(), event.clone())
            .await;
        self.events
            .publish(&topic_order_updated(order.id), event)
            .await;

        info!(
            order_id = order.id,
            customer_id,
            total_cents = order.total_cents,
            "order placed"
        );
        Ok((order, order_items))
    }

    /// Overwrite an order's status
    ///
    /// The status string parses case-insensitively; anything outside the
    /// enumeration is `InvalidInput` and leaves the order untouched. There
    /// is deliberately no transition-graph validation - any status may
    /// follow any other.
    pub async fn update_order_status(&self, order_id: i64, status: &str) -> Result<Order> {
        let status: OrderStatus = status.parse()?;

        let mut order = self
            .storage
            .get_order(order_id)
            .await?
            .ok_or_else(|| StorefrontError::NotFound(format!("order {} not found", order_id)))?;

        order.status = status;
        order.updated_at = chrono::Utc::now();
        let order = self.storage.update_order(order).await?;

        self.events
            .publish(&topic_order_updated(order.id), OrderEvent::for_order(&order))
            .await;

        info!(order_id = order.id, status = %order.status, "order status updated");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::storage::{InMemoryStorage, OrderFilter};
    use crate::models::{NewCustomer, NewProduct};
    use futures::{FutureExt, StreamExt};

    async fn setup() -> (OrderEngine, Arc<InMemoryStorage>, EventBus) {
        let storage = Arc::new(InMemoryStorage::new());
        let events = EventBus::new();
        let engine = OrderEngine::new(storage.clone(), events.clone());

        storage
            .create_customer(NewCustomer {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            })
            .await
            .unwrap();

        (engine, storage, events)
    }

    async fn add_product(storage: &InMemoryStorage, price_cents: i64, stock: i64) -> i64 {
        storage
            .create_product(NewProduct {
                title: "Widget".to_string(),
                description: None,
                price_cents,
                stock,
            })
            .await
            .unwrap()
            .id
    }

    fn request(product_id: i64, quantity: i64) -> OrderItemRequest {
        OrderItemRequest {
            product_id,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_placement_scenario_totals_stock_and_events() {
        // Product(price=500, stock=2), order quantity 2:
        // total 1000, stock 0, both events carry total 1000
        let (engine, storage, events) = setup().await;
        let product_id = add_product(&storage, 500, 2).await;

        let mut created = events.subscribe(&topic_order_created());
        // Fresh storage, so the first order id is deterministic
        let mut updated = events.subscribe(&topic_order_updated(1));

        let (order, items) = engine
            .place_order(1, &[request(product_id, 2)], None)
            .await
            .unwrap();

        assert_eq!(order.id, 1);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.subtotal_cents, 1000);
        assert_eq!(order.tax_cents, 0);
        assert_eq!(order.total_cents, 1000);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price_cents, 500);
        assert_eq!(items[0].subtotal_cents, 1000);

        let product = storage.get_product(product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 0);

        let created_event = created.next().await.unwrap();
        let updated_event = updated.next().await.unwrap();
        assert_eq!(created_event.total_cents, 1000);
        assert_eq!(updated_event.total_cents, 1000);
        assert_eq!(created_event.order_id, order.id);
    }

    #[tokio::test]
    async fn test_total_is_sum_of_subtotals_plus_tax() {
        let (engine, storage, _events) = setup().await;
        let first = add_product(&storage, 500, 10).await;
        let second = add_product(&storage, 333, 10).await;

        // GB rate is 20%: subtotal 1999, tax = round_half_up(399.8) = 400
        let (order, items) = engine
            .place_order(1, &[request(first, 2), request(second, 3)], Some("gb"))
            .await
            .unwrap();

        let item_sum: i64 = items.iter().map(|i| i.subtotal_cents).sum();
        assert_eq!(order.subtotal_cents, item_sum);
        assert_eq!(order.subtotal_cents, 1999);
        assert_eq!(order.tax_cents, 400);
        assert_eq!(order.total_cents, 2399);
        assert_eq!(order.shipping_country.as_deref(), Some("GB"));
    }

    #[tokio::test]
    async fn test_item_price_is_a_snapshot() {
        let (engine, storage, _events) = setup().await;
        let product_id = add_product(&storage, 500, 10).await;

        let (order, items) = engine
            .place_order(1, &[request(product_id, 1)], None)
            .await
            .unwrap();

        // Raise the live price after placement
        let mut product = storage.get_product(product_id).await.unwrap().unwrap();
        product.price_cents = 900;
        storage.update_product(product).await.unwrap();

        let stored = storage.list_order_items(order.id).await.unwrap();
        assert_eq!(stored[0].unit_price_cents, 500);
        assert_eq!(stored[0].subtotal_cents, items[0].subtotal_cents);
    }

    #[tokio::test]
    async fn test_unknown_product_leaves_nothing_behind() {
        let (engine, storage, _events) = setup().await;
        let product_id = add_product(&storage, 500, 5).await;

        let err = engine
            .place_order(1, &[request(product_id, 1), request(999, 1)], None)
            .await
            .unwrap_err();
        assert!(matches!(err, StorefrontError::NotFound(_)));

        // No order rows, no stock movement
        assert!(storage
            .list_orders(&OrderFilter::default())
            .await
            .unwrap()
            .is_empty());
        let product = storage.get_product(product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 5);
    }

    #[tokio::test]
    async fn test_insufficient_stock_fails_without_side_effects() {
        let (engine, storage, events) = setup().await;
        let product_id = add_product(&storage, 500, 0).await;

        let mut created = events.subscribe(&topic_order_created());

        let err = engine
            .place_order(1, &[request(product_id, 1)], None)
            .await
            .unwrap_err();
        match err {
            StorefrontError::InsufficientStock {
                product_id: pid,
                requested,
                available,
            } => {
                assert_eq!(pid, product_id);
                assert_eq!(requested, 1);
                assert_eq!(available, 0);
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }

        let product = storage.get_product(product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 0);
        // No notification was emitted
        assert!(created.next().now_or_never().is_none());
    }

    #[tokio::test]
    async fn test_empty_items_and_bad_quantity_are_invalid_input() {
        let (engine, storage, _events) = setup().await;
        let product_id = add_product(&storage, 500, 5).await;

        let err = engine.place_order(1, &[], None).await.unwrap_err();
        assert!(matches!(err, StorefrontError::InvalidInput(_)));

        let err = engine
            .place_order(1, &[request(product_id, 0)], None)
            .await
            .unwrap_err();
        assert!(matches!(err, StorefrontError::InvalidInput(_)));

        let err = engine
            .place_order(1, &[request(product_id, -3)], None)
            .await
            .unwrap_err();
        assert!(matches!(err, StorefrontError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unknown_customer_is_not_found() {
        let (engine, storage, _events) = setup().await;
        let product_id = add_product(&storage, 500, 5).await;

        let err = engine
            .place_order(42, &[request(product_id, 1)], None)
            .await
            .unwrap_err();
        assert!(matches!(err, StorefrontError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_placements_cannot_oversell() {
        // Stock of one, two concurrent placements for quantity one:
        // exactly one succeeds, the other sees InsufficientStock
        let (engine, storage, _events) = setup().await;
        let product_id = add_product(&storage, 500, 1).await;

        let engine_a = engine.clone();
        let engine_b = engine.clone();
        let a = tokio::spawn(async move {
            engine_a.place_order(1, &[request(product_id, 1)], None).await
        });
        let b = tokio::spawn(async move {
            engine_b.place_order(1, &[request(product_id, 1)], None).await
        });

        let results = [a.await.unwrap(), b.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one placement may win the last unit");
        assert!(results.iter().any(|r| matches!(
            r,
            Err(StorefrontError::InsufficientStock { .. })
        )));

        let product = storage.get_product(product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 0, "stock never goes negative");
        assert_eq!(
            storage.list_orders(&OrderFilter::default()).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_duplicate_lines_cannot_oversell() {
        // Stock of one, the same product requested on two lines: each
        // line alone is coverable, together they are one unit over
        let (engine, storage, _events) = setup().await;
        let product_id = add_product(&storage, 500, 1).await;

        let err = engine
            .place_order(1, &[request(product_id, 1), request(product_id, 1)], None)
            .await
            .unwrap_err();
        match err {
            StorefrontError::InsufficientStock {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }

        let product = storage.get_product(product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 1, "stock never goes negative");
        assert!(storage
            .list_orders(&OrderFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_lines_within_stock_are_fine() {
        let (engine, storage, _events) = setup().await;
        let product_id = add_product(&storage, 500, 3).await;

        let (order, items) = engine
            .place_order(1, &[request(product_id, 1), request(product_id, 2)], None)
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(order.subtotal_cents, 1500);

        let product = storage.get_product(product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 0);
    }

    #[tokio::test]
    async fn test_overflowing_amounts_are_invalid_input() {
        let (engine, storage, _events) = setup().await;
        let product_id = add_product(&storage, i64::MAX, 2).await;

        let err = engine
            .place_order(1, &[request(product_id, 2)], None)
            .await
            .unwrap_err();
        assert!(matches!(err, StorefrontError::InvalidInput(_)));

        // Nothing was committed
        assert!(storage
            .list_orders(&OrderFilter::default())
            .await
            .unwrap()
            .is_empty());
        let product = storage.get_product(product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 2);
    }

    #[tokio::test]
    async fn test_status_update_persists_and_notifies() {
        let (engine, storage, events) = setup().await;
        let product_id = add_product(&storage, 500, 2).await;
        let (order, _) = engine
            .place_order(1, &[request(product_id, 1)], None)
            .await
            .unwrap();

        let mut updated = events.subscribe(&topic_order_updated(order.id));

        let order = engine.update_order_status(order.id, "Paid").await.unwrap();
        assert_eq!(order.status, OrderStatus::Paid);

        let event = updated.next().await.unwrap();
        assert_eq!(event.order_id, order.id);
        assert_eq!(event.status, OrderStatus::Paid);

        let stored = storage.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_invalid_status_leaves_order_unchanged() {
        let (engine, storage, _events) = setup().await;
        let product_id = add_product(&storage, 500, 2).await;
        let (order, _) = engine
            .place_order(1, &[request(product_id, 1)], None)
            .await
            .unwrap();

        let err = engine
            .update_order_status(order.id, "refunded")
            .await
            .unwrap_err();
        assert!(matches!(err, StorefrontError::InvalidInput(_)));

        let stored = storage.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert_eq!(stored.updated_at, order.updated_at);
    }

    #[tokio::test]
    async fn test_status_update_on_unknown_order_is_not_found() {
        let (engine, _storage, _events) = setup().await;
        let err = engine.update_order_status(99, "paid").await.unwrap_err();
        assert!(matches!(err, StorefrontError::NotFound(_)));
    }
}
