// Storage abstraction for the order service
// This defines the interface for persisting products, customers, and orders

//! # Storage Abstraction Layer
//!
//! This module provides a storage abstraction that allows the order engine
//! to persist its records using different backends. The abstraction
//! separates business logic from storage implementation details.
//!
//! ## Storage Architecture
//!
//! The storage layer follows the **Repository Pattern**:
//! - **StoreStorage trait**: Defines the interface for all storage operations
//! - **InMemoryStorage**: Default implementation for development/testing
//! - **Future implementations**: PostgreSQL, SQLite, etc.
//!
//! ## The One Transactional Operation
//!
//! Most of the trait is plain CRUD, but [`StoreStorage::commit_order`] is
//! special: it must write the order row, every line item, and every stock
//! decrement as a **single atomic unit**, re-checking stock sufficiency
//! under exclusive access. Either all rows exist afterward or none do, and
//! two concurrent placements can never jointly drive a product's stock
//! negative. A SQL backend would implement this as one serializable
//! transaction; the in-memory backend implements it under one write lock.
//!
//! ## Rust Learning Notes:
//!
//! ### Async Traits
//! Rust doesn't natively support async functions in traits yet.
//! The `async-trait` crate provides a macro to enable async trait methods.
//!
//! ### Trait Bounds
//! - `Send`: Type can be safely moved between threads
//! - `Sync`: Type can be safely shared between threads via references
//! These bounds are required for async trait objects.
//!
//! ### Generic Return Types
//! The trait uses return types like `Result<Option<T>>`:
//! - `Ok(Some(value))`: Found the record
//! - `Ok(None)`: No record with that id (not an error)
//! - `Err(error)`: Operation failed (storage error, etc.)

use std::collections::HashMap;

use chrono::Utc;

use crate::models::{
    Customer, NewCustomer, NewProduct, Order, OrderItem, OrderStatus, Product,
};
use crate::{Result, StorefrontError};

/// Hard cap on page sizes, matching the API contract
const MAX_PAGE_SIZE: usize = 100;

/// Filter for product listings
///
/// `search` does a case-insensitive substring match on title and
/// description. `in_stock` only filters when `Some(true)` - asking for
/// out-of-stock products is not a supported query shape.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub in_stock: Option<bool>,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// Filter for order listings
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub customer_id: Option<i64>,
    pub status: Option<OrderStatus>,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// One validated line of an order about to be committed
///
/// Produced by the order engine after validation and pricing;
/// `unit_price_cents` is already the snapshot the item row will carry.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

/// Everything the storage needs to materialize an order atomically
///
/// Totals are computed by the engine before commit; the storage's only
/// job is to re-check stock and write all rows or none.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub customer_id: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub shipping_country: Option<String>,
    pub lines: Vec<OrderLine>,
}

/// Storage trait for the order service
///
/// All operations are async to support non-blocking backends, and all
/// return `Result` because any storage can fail.
#[async_trait::async_trait]
pub trait StoreStorage: Send + Sync {
    /// Create a new product, assigning its id and timestamps
    ///
    /// The payload is assumed validated (`NewProduct::validate`).
    async fn create_product(&self, new: NewProduct) -> Result<Product>;

    /// Get a product by id
    ///
    /// Returns `Ok(None)` when the id does not resolve.
    async fn get_product(&self, id: i64) -> Result<Option<Product>>;

    /// List products, newest id first, honoring the filter
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>>;

    /// Replace a stored product with an updated version
    ///
    /// Used after applying a `ProductUpdate` patch. Fails with `NotFound`
    /// if the product was deleted meanwhile.
    async fn update_product(&self, product: Product) -> Result<Product>;

    /// Create a new customer, enforcing email uniqueness
    async fn create_customer(&self, new: NewCustomer) -> Result<Customer>;

    /// Get a customer by id
    async fn get_customer(&self, id: i64) -> Result<Option<Customer>>;

    /// List customers, newest id first
    async fn list_customers(&self, limit: Option<usize>, offset: usize) -> Result<Vec<Customer>>;

    /// Atomically persist an order with its items and decrement stock
    ///
    /// Re-checks stock sufficiency under exclusive access and fails with
    /// `InsufficientStock` (leaving everything untouched) if any line can
    /// no longer be covered. On success every row exists and every
    /// decrement has happened; on failure none have.
    async fn commit_order(&self, draft: OrderDraft) -> Result<(Order, Vec<OrderItem>)>;

    /// Get an order by id
    async fn get_order(&self, id: i64) -> Result<Option<Order>>;

    /// List the line items of an order, in insertion order
    async fn list_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>>;

    /// List orders, newest id first, honoring the filter
    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>>;

    /// Replace a stored order with an updated version (status changes)
    async fn update_order(&self, order: Order) -> Result<Order>;
}

/// The tables behind the in-memory backend
///
/// Ids are allocated from per-table monotonic counters, mirroring the
/// autoincrement keys a SQL backend would produce.
#[derive(Default)]
struct Tables {
    products: HashMap<i64, Product>,
    customers: HashMap<i64, Customer>,
    orders: HashMap<i64, Order>,
    order_items: HashMap<i64, OrderItem>,
    next_product_id: i64,
    next_customer_id: i64,
    next_order_id: i64,
    next_order_item_id: i64,
}

impl Tables {
    fn next_product_id(&mut self) -> i64 {
        self.next_product_id += 1;
        self.next_product_id
    }

    fn next_customer_id(&mut self) -> i64 {
        self.next_customer_id += 1;
        self.next_customer_id
    }

    fn next_order_id(&mut self) -> i64 {
        self.next_order_id += 1;
        self.next_order_id
    }

    fn next_order_item_id(&mut self) -> i64 {
        self.next_order_item_id += 1;
        self.next_order_item_id
    }
}

/// In-memory storage implementation for development and testing
///
/// This provides a simple in-memory implementation of the StoreStorage
/// trait. It's perfect for:
/// - Development and testing
/// - Demos and prototypes
/// - Unit tests
/// - Single-process deployments
///
/// ## Limitations
///
/// - **Not persistent**: Data is lost when the process restarts
/// - **Not distributed**: Cannot share data across multiple processes
/// - **Memory bound**: Limited by available RAM
///
/// ## Thread Safety
///
/// Uses `RwLock` for thread-safe concurrent access:
/// - Multiple readers can access data simultaneously
/// - Only one writer can modify data at a time
/// - `commit_order` runs entirely under the write lock, which is what
///   makes the check-then-decrement sequence lost-update free
#[derive(Default)]
pub struct InMemoryStorage {
    inner: std::sync::RwLock<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    // Lock poisoning (a writer panicked mid-mutation) surfaces as a
    // persistence error rather than a cascading panic.
    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| StorefrontError::Persistence("storage lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| StorefrontError::Persistence("storage lock poisoned".to_string()))
    }
}

/// Clamp a requested page size to the hard cap
fn page_size(limit: Option<usize>) -> usize {
    limit.unwrap_or(20).min(MAX_PAGE_SIZE)
}

#[async_trait::async_trait]
impl StoreStorage for InMemoryStorage {
    async fn create_product(&self, new: NewProduct) -> Result<Product> {
        let mut tables = self.write()?;
        let now = Utc::now();
        let product = Product {
            id: tables.next_product_id(),
            title: new.title,
            description: new.description,
            price_cents: new.price_cents,
            stock: new.stock,
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: i64) -> Result<Option<Product>> {
        let tables = self.read()?;
        Ok(tables.products.get(&id).cloned())
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let tables = self.read()?;
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());

        let mut rows: Vec<Product> = tables
            .products
            .values()
            .filter(|p| {
                let matches_search = needle.as_ref().map_or(true, |n| {
                    p.title.to_lowercase().contains(n)
                        || p.description
                            .as_ref()
                            .map_or(false, |d| d.to_lowercase().contains(n))
                });
                let matches_stock = filter.in_stock != Some(true) || p.stock > 0;
                matches_search && matches_stock
            })
            .cloned()
            .collect();

        // Newest first, then paginate
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows
            .into_iter()
            .skip(filter.offset)
            .take(page_size(filter.limit))
            .collect())
    }

    async fn update_product(&self, product: Product) -> Result<Product> {
        let mut tables = self.write()?;
        if !tables.products.contains_key(&product.id) {
            return Err(StorefrontError::NotFound(format!(
                "product {} not found",
                product.id
            )));
        }
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn create_customer(&self, new: NewCustomer) -> Result<Customer> {
        let mut tables = self.write()?;

        // Email is unique across customers
        let email = new.email.to_lowercase();
        if tables
            .customers
            .values()
            .any(|c| c.email.to_lowercase() == email)
        {
            return Err(StorefrontError::InvalidInput(format!(
                "email already registered: {}",
                new.email
            )));
        }

        let customer = Customer {
            id: tables.next_customer_id(),
            name: new.name,
            email: new.email,
            created_at: Utc::now(),
        };
        tables.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn get_customer(&self, id: i64) -> Result<Option<Customer>> {
        let tables = self.read()?;
        Ok(tables.customers.get(&id).cloned())
    }

    async fn list_customers(&self, limit: Option<usize>, offset: usize) -> Result<Vec<Customer>> {
        let tables = self.read()?;
        let mut rows: Vec<Customer> = tables.customers.values().cloned().collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows.into_iter().skip(offset).take(page_size(limit)).collect())
    }

    async fn commit_order(&self, draft: OrderDraft) -> Result<(Order, Vec<OrderItem>)> {
        let mut tables = self.write()?;

        // Re-validate under the exclusive lock before touching anything.
        // Stock may have moved since the engine's read-time check, and
        // partial mutation is never acceptable. The same product may
        // appear on several lines, so sufficiency is checked against the
        // aggregated quantity per product, not per line.
        let mut requested: HashMap<i64, i64> = HashMap::new();
        for line in &draft.lines {
            *requested.entry(line.product_id).or_insert(0) += line.quantity;
        }
        for (&product_id, &quantity) in &requested {
            let product = tables.products.get(&product_id).ok_or_else(|| {
                StorefrontError::NotFound(format!("product {} not found", product_id))
            })?;
            if product.stock < quantity {
                return Err(StorefrontError::InsufficientStock {
                    product_id,
                    requested: quantity,
                    available: product.stock,
                });
            }
        }

        let now = Utc::now();
        let order = Order {
            id: tables.next_order_id(),
            customer_id: draft.customer_id,
            status: OrderStatus::Pending,
            subtotal_cents: draft.subtotal_cents,
            tax_cents: draft.tax_cents,
            total_cents: draft.total_cents,
            shipping_country: draft.shipping_country,
            created_at: now,
            updated_at: now,
        };

        let mut items = Vec::with_capacity(draft.lines.len());
        for line in &draft.lines {
            let item = OrderItem {
                id: tables.next_order_item_id(),
                order_id: order.id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                subtotal_cents: line.subtotal_cents,
            };
            items.push(item);
        }

        // All checks passed - now mutate. Everything below is infallible,
        // which is what makes this commit all-or-nothing.
        for line in &draft.lines {
            if let Some(product) = tables.products.get_mut(&line.product_id) {
                product.stock -= line.quantity;
                product.updated_at = now;
            }
        }
        for item in &items {
            tables.order_items.insert(item.id, item.clone());
        }
        tables.orders.insert(order.id, order.clone());

        Ok((order, items))
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>> {
        let tables = self.read()?;
        Ok(tables.orders.get(&id).cloned())
    }

    async fn list_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>> {
        let tables = self.read()?;
        let mut items: Vec<OrderItem> = tables
            .order_items
            .values()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.id);
        Ok(items)
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let tables = self.read()?;
        let mut rows: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| {
                filter.customer_id.map_or(true, |id| o.customer_id == id)
                    && filter.status.map_or(true, |s| o.status == s)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows
            .into_iter()
            .skip(filter.offset)
            .take(page_size(filter.limit))
            .collect())
    }

    async fn update_order(&self, order: Order) -> Result<Order> {
        let mut tables = self.write()?;
        if !tables.orders.contains_key(&order.id) {
            return Err(StorefrontError::NotFound(format!(
                "order {} not found",
                order.id
            )));
        }
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(price_cents: i64, stock: i64) -> NewProduct {
        NewProduct {
            title: "Widget".to_string(),
            description: Some("A fine widget".to_string()),
            price_cents,
            stock,
        }
    }

    fn draft_for(product: &Product, quantity: i64) -> OrderDraft {
        let subtotal = product.price_cents * quantity;
        OrderDraft {
            customer_id: 1,
            subtotal_cents: subtotal,
            tax_cents: 0,
            total_cents: subtotal,
            shipping_country: None,
            lines: vec![OrderLine {
                product_id: product.id,
                quantity,
                unit_price_cents: product.price_cents,
                subtotal_cents: subtotal,
            }],
        }
    }

    #[tokio::test]
    async fn test_product_ids_are_monotonic() {
        let storage = InMemoryStorage::new();
        let first = storage.create_product(widget(100, 1)).await.unwrap();
        let second = storage.create_product(widget(200, 1)).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let storage = InMemoryStorage::new();
        storage
            .create_customer(NewCustomer {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            })
            .await
            .unwrap();

        let err = storage
            .create_customer(NewCustomer {
                name: "Imposter".to_string(),
                email: "Ada@Example.com".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorefrontError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_commit_order_decrements_stock() {
        let storage = InMemoryStorage::new();
        let product = storage.create_product(widget(500, 2)).await.unwrap();

        let (order, items) = storage.commit_order(draft_for(&product, 2)).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_cents, 1000);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].subtotal_cents, 1000);

        let product = storage.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 0);
    }

    #[tokio::test]
    async fn test_commit_order_is_all_or_nothing() {
        let storage = InMemoryStorage::new();
        let in_stock = storage.create_product(widget(500, 5)).await.unwrap();
        let scarce = storage.create_product(widget(300, 1)).await.unwrap();

        // Second line cannot be covered, so the first must not commit either
        let draft = OrderDraft {
            customer_id: 1,
            subtotal_cents: 500 * 2 + 300 * 3,
            tax_cents: 0,
            total_cents: 500 * 2 + 300 * 3,
            shipping_country: None,
            lines: vec![
                OrderLine {
                    product_id: in_stock.id,
                    quantity: 2,
                    unit_price_cents: 500,
                    subtotal_cents: 1000,
                },
                OrderLine {
                    product_id: scarce.id,
                    quantity: 3,
                    unit_price_cents: 300,
                    subtotal_cents: 900,
                },
            ],
        };

        let err = storage.commit_order(draft).await.unwrap_err();
        assert!(matches!(err, StorefrontError::InsufficientStock { .. }));

        // No order rows, no item rows, no stock movement
        assert!(storage.list_orders(&OrderFilter::default()).await.unwrap().is_empty());
        let in_stock = storage.get_product(in_stock.id).await.unwrap().unwrap();
        let scarce = storage.get_product(scarce.id).await.unwrap().unwrap();
        assert_eq!(in_stock.stock, 5);
        assert_eq!(scarce.stock, 1);
    }

    #[tokio::test]
    async fn test_commit_order_aggregates_duplicate_lines() {
        let storage = InMemoryStorage::new();
        let product = storage.create_product(widget(500, 1)).await.unwrap();

        // Two lines for the same product, each individually coverable,
        // jointly one unit over stock
        let draft = OrderDraft {
            customer_id: 1,
            subtotal_cents: 1000,
            tax_cents: 0,
            total_cents: 1000,
            shipping_country: None,
            lines: vec![
                OrderLine {
                    product_id: product.id,
                    quantity: 1,
                    unit_price_cents: 500,
                    subtotal_cents: 500,
                },
                OrderLine {
                    product_id: product.id,
                    quantity: 1,
                    unit_price_cents: 500,
                    subtotal_cents: 500,
                },
            ],
        };

        let err = storage.commit_order(draft).await.unwrap_err();
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

        let product = storage.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 1, "stock never goes negative");
    }

    #[tokio::test]
    async fn test_list_products_filters_and_paginates() {
        let storage = InMemoryStorage::new();
        for i in 0..5 {
            storage
                .create_product(NewProduct {
                    title: format!("Widget {}", i),
                    description: None,
                    price_cents: 100,
                    stock: i % 2,
                })
                .await
                .unwrap();
        }

        let in_stock = storage
            .list_products(&ProductFilter {
                in_stock: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(in_stock.len(), 2);
        assert!(in_stock.iter().all(|p| p.stock > 0));

        let search = storage
            .list_products(&ProductFilter {
                search: Some("widget 3".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].title, "Widget 3");

        // Newest id first
        let page = storage
            .list_products(&ProductFilter {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert!(page[0].id > page[1].id);
    }

    #[tokio::test]
    async fn test_list_orders_by_customer_and_status() {
        let storage = InMemoryStorage::new();
        let product = storage.create_product(widget(100, 10)).await.unwrap();

        let (first, _) = storage.commit_order(draft_for(&product, 1)).await.unwrap();
        let (_second, _) = storage
            .commit_order(OrderDraft {
                customer_id: 2,
                ..draft_for(&product, 1)
            })
            .await
            .unwrap();

        let mut paid = first.clone();
        paid.status = OrderStatus::Paid;
        storage.update_order(paid).await.unwrap();

        let for_customer = storage
            .list_orders(&OrderFilter {
                customer_id: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_customer.len(), 1);
        assert_eq!(for_customer[0].id, first.id);

        let pending = storage
            .list_orders(&OrderFilter {
                status: Some(OrderStatus::Pending),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].customer_id, 2);
    }
}
