// GraphQL API for the Storefront engine
// This provides the query/mutation/subscription surface over the order workflow

use std::sync::Arc;

use async_graphql::{Context, InputObject, Object, Schema, SimpleObject, Subscription, ID};
use futures::StreamExt;

use crate::engine::events::{topic_order_created, topic_order_updated, EventBus};
use crate::engine::orders::OrderEngine;
use crate::engine::storage::{InMemoryStorage, OrderFilter, ProductFilter, StoreStorage};
use crate::models::{
    Customer, NewCustomer, NewProduct, Order, OrderEvent, OrderItem, OrderItemRequest,
    OrderStatus, Product, ProductUpdate,
};

// GraphQL types - these are the API representations of our domain models.
// Money stays in integer cents on the wire; timestamps are RFC 3339 strings.

#[derive(SimpleObject, Debug, Clone)]
pub struct ProductGQL {
    pub id: ID,
    pub title: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Product> for ProductGQL {
    fn from(p: &Product) -> Self {
        Self {
            id: ID(p.id.to_string()),
            title: p.title.clone(),
            description: p.description.clone(),
            price_cents: p.price_cents,
            stock: p.stock,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

#[derive(SimpleObject, Debug, Clone)]
pub struct CustomerGQL {
    pub id: ID,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

impl From<&Customer> for CustomerGQL {
    fn from(c: &Customer) -> Self {
        Self {
            id: ID(c.id.to_string()),
            name: c.name.clone(),
            email: c.email.clone(),
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

#[derive(SimpleObject, Debug, Clone)]
pub struct OrderItemGQL {
    pub id: ID,
    pub product_id: ID,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl From<&OrderItem> for OrderItemGQL {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: ID(item.id.to_string()),
            product_id: ID(item.product_id.to_string()),
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
            subtotal_cents: item.subtotal_cents,
        }
    }
}

#[derive(SimpleObject, Debug, Clone)]
pub struct OrderGQL {
    pub id: ID,
    pub customer_id: ID,
    pub status: String,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub shipping_country: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub items: Vec<OrderItemGQL>,
}

impl OrderGQL {
    fn from_parts(order: &Order, items: &[OrderItem]) -> Self {
        Self {
            id: ID(order.id.to_string()),
            customer_id: ID(order.customer_id.to_string()),
            status: order.status.to_string(),
            subtotal_cents: order.subtotal_cents,
            tax_cents: order.tax_cents,
            total_cents: order.total_cents,
            shipping_country: order.shipping_country.clone(),
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
            items: items.iter().map(OrderItemGQL::from).collect(),
        }
    }
}

/// Payload delivered on the orderCreated / orderUpdated subscriptions
#[derive(SimpleObject, Debug, Clone)]
pub struct OrderEventGQL {
    pub order_id: ID,
    pub status: String,
    pub total_cents: i64,
    pub emitted_at: String,
}

impl From<OrderEvent> for OrderEventGQL {
    fn from(event: OrderEvent) -> Self {
        Self {
            order_id: ID(event.order_id.to_string()),
            status: event.status.to_string(),
            total_cents: event.total_cents,
            emitted_at: event.emitted_at.to_rfc3339(),
        }
    }
}

// Input types for GraphQL mutations

#[derive(InputObject, Debug, Clone)]
pub struct ProductCreateInput {
    pub title: String,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
}

#[derive(InputObject, Debug, Clone)]
pub struct ProductUpdateInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
}

#[derive(InputObject, Debug, Clone)]
pub struct CustomerCreateInput {
    pub name: String,
    pub email: String,
}

#[derive(InputObject, Debug, Clone)]
pub struct OrderItemInput {
    pub product_id: ID,
    pub quantity: Option<i64>,
}

// Helpers shared by the resolvers

/// Parse a GraphQL ID into a storage id
fn parse_id(id: &ID, kind: &str) -> async_graphql::Result<i64> {
    id.parse::<i64>()
        .map_err(|_| async_graphql::Error::new(format!("Invalid {} ID format", kind)))
}

/// Clamp an optional page argument into a usize
fn page_arg(value: Option<i32>, default: i32) -> usize {
    value.unwrap_or(default).max(0) as usize
}

/// Load an order's items and assemble the full GraphQL shape
async fn materialize_order(
    storage: &Arc<dyn StoreStorage>,
    order: &Order,
) -> async_graphql::Result<OrderGQL> {
    match storage.list_order_items(order.id).await {
        Ok(items) => Ok(OrderGQL::from_parts(order, &items)),
        Err(e) => Err(async_graphql::Error::new(format!(
            "Failed to load order items: {}",
            e
        ))),
    }
}

// GraphQL Query root

pub struct Query;

#[Object]
impl Query {
    /// List products, newest first, with optional search and stock filters
    async fn products(
        &self,
        ctx: &Context<'_>,
        search: Option<String>,
        in_stock: Option<bool>,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> async_graphql::Result<Vec<ProductGQL>> {
        let storage = ctx.data::<Arc<dyn StoreStorage>>()?;
        let filter = ProductFilter {
            search,
            in_stock,
            limit: Some(page_arg(limit, 20)),
            offset: page_arg(offset, 0),
        };

        match storage.list_products(&filter).await {
            Ok(products) => Ok(products.iter().map(ProductGQL::from).collect()),
            Err(e) => Err(async_graphql::Error::new(format!(
                "Failed to list products: {}",
                e
            ))),
        }
    }

    /// Get a product by ID
    async fn product(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<Option<ProductGQL>> {
        let storage = ctx.data::<Arc<dyn StoreStorage>>()?;
        let product_id = parse_id(&id, "product")?;

        match storage.get_product(product_id).await {
            Ok(Some(product)) => Ok(Some(ProductGQL::from(&product))),
            Ok(None) => Ok(None),
            Err(e) => Err(async_graphql::Error::new(format!(
                "Failed to get product: {}",
                e
            ))),
        }
    }

    /// List customers, newest first
    async fn customers(
        &self,
        ctx: &Context<'_>,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> async_graphql::Result<Vec<CustomerGQL>> {
        let storage = ctx.data::<Arc<dyn StoreStorage>>()?;

        match storage
            .list_customers(Some(page_arg(limit, 20)), page_arg(offset, 0))
            .await
        {
            Ok(customers) => Ok(customers.iter().map(CustomerGQL::from).collect()),
            Err(e) => Err(async_graphql::Error::new(format!(
                "Failed to list customers: {}",
                e
            ))),
        }
    }

    /// List orders, newest first, optionally filtered by customer and status
    async fn orders(
        &self,
        ctx: &Context<'_>,
        customer_id: Option<ID>,
        status: Option<String>,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> async_graphql::Result<Vec<OrderGQL>> {
        let storage = ctx.data::<Arc<dyn StoreStorage>>()?;

        let customer_id = match &customer_id {
            Some(id) => Some(parse_id(id, "customer")?),
            None => None,
        };
        let status = match status.as_deref() {
            Some(s) => Some(
                s.parse::<OrderStatus>()
                    .map_err(|e| async_graphql::Error::new(e.to_string()))?,
            ),
            None => None,
        };

        let filter = OrderFilter {
            customer_id,
            status,
            limit: Some(page_arg(limit, 20)),
            offset: page_arg(offset, 0),
        };

        let orders = match storage.list_orders(&filter).await {
            Ok(orders) => orders,
            Err(e) => {
                return Err(async_graphql::Error::new(format!(
                    "Failed to list orders: {}",
                    e
                )))
            }
        };

        let mut result = Vec::with_capacity(orders.len());
        for order in &orders {
            result.push(materialize_order(storage, order).await?);
        }
        Ok(result)
    }

    /// Get an order (with its items) by ID
    async fn order(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<Option<OrderGQL>> {
        let storage = ctx.data::<Arc<dyn StoreStorage>>()?;
        let order_id = parse_id(&id, "order")?;

        match storage.get_order(order_id).await {
            Ok(Some(order)) => Ok(Some(materialize_order(storage, &order).await?)),
            Ok(None) => Ok(None),
            Err(e) => Err(async_graphql::Error::new(format!(
                "Failed to get order: {}",
                e
            ))),
        }
    }
}

// GraphQL Mutation root

pub struct Mutation;

#[Object]
impl Mutation {
    /// Create a product (price and stock must be non-negative)
    async fn create_product(
        &self,
        ctx: &Context<'_>,
        input: ProductCreateInput,
    ) -> async_graphql::Result<ProductGQL> {
        let storage = ctx.data::<Arc<dyn StoreStorage>>()?;

        let new = NewProduct {
            title: input.title,
            description: input.description,
            price_cents: input.price_cents.unwrap_or(0),
            stock: input.stock.unwrap_or(0),
        };
        new.validate()
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        match storage.create_product(new).await {
            Ok(product) => Ok(ProductGQL::from(&product)),
            Err(e) => Err(async_graphql::Error::new(format!(
                "Failed to create product: {}",
                e
            ))),
        }
    }

    /// Patch a product - only fields present in the input are changed
    async fn update_product(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: ProductUpdateInput,
    ) -> async_graphql::Result<ProductGQL> {
        let storage = ctx.data::<Arc<dyn StoreStorage>>()?;
        let product_id = parse_id(&id, "product")?;

        let patch = ProductUpdate {
            title: input.title,
            description: input.description,
            price_cents: input.price_cents,
            stock: input.stock,
        };
        patch
            .validate()
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        let mut product = match storage.get_product(product_id).await {
            Ok(Some(product)) => product,
            Ok(None) => {
                return Err(async_graphql::Error::new(format!(
                    "Not found: product {} not found",
                    product_id
                )))
            }
            Err(e) => {
                return Err(async_graphql::Error::new(format!(
                    "Failed to get product: {}",
                    e
                )))
            }
        };

        product.apply(patch);
        match storage.update_product(product).await {
            Ok(product) => Ok(ProductGQL::from(&product)),
            Err(e) => Err(async_graphql::Error::new(format!(
                "Failed to update product: {}",
                e
            ))),
        }
    }

    /// Create a customer (email must be unique)
    async fn create_customer(
        &self,
        ctx: &Context<'_>,
        input: CustomerCreateInput,
    ) -> async_graphql::Result<CustomerGQL> {
        let storage = ctx.data::<Arc<dyn StoreStorage>>()?;

        let new = NewCustomer {
            name: input.name,
            email: input.email,
        };
        new.validate()
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        match storage.create_customer(new).await {
            Ok(customer) => Ok(CustomerGQL::from(&customer)),
            Err(e) => Err(async_graphql::Error::new(format!(
                "Failed to create customer: {}",
                e
            ))),
        }
    }

    /// Place an order: validate, price, tax, commit atomically, notify
    async fn place_order(
        &self,
        ctx: &Context<'_>,
        customer_id: ID,
        items: Vec<OrderItemInput>,
        shipping_country: Option<String>,
    ) -> async_graphql::Result<OrderGQL> {
        let engine = ctx.data::<OrderEngine>()?;

        let customer_id = parse_id(&customer_id, "customer")?;
        let mut requests = Vec::with_capacity(items.len());
        for item in &items {
            requests.push(OrderItemRequest {
                product_id: parse_id(&item.product_id, "product")?,
                quantity: item.quantity.unwrap_or(1),
            });
        }

        match engine
            .place_order(customer_id, &requests, shipping_country.as_deref())
            .await
        {
            Ok((order, items)) => Ok(OrderGQL::from_parts(&order, &items)),
            // Validation errors reach the caller verbatim, offending
            // identifier included
            Err(e) => Err(async_graphql::Error::new(e.to_string())),
        }
    }

    /// Overwrite an order's status and notify its update feed
    async fn update_order_status(
        &self,
        ctx: &Context<'_>,
        order_id: ID,
        status: String,
    ) -> async_graphql::Result<OrderGQL> {
        let engine = ctx.data::<OrderEngine>()?;
        let storage = ctx.data::<Arc<dyn StoreStorage>>()?;
        let order_id = parse_id(&order_id, "order")?;

        match engine.update_order_status(order_id, &status).await {
            Ok(order) => materialize_order(storage, &order).await,
            Err(e) => Err(async_graphql::Error::new(e.to_string())),
        }
    }
}

// GraphQL Subscription root (for real-time updates)

pub struct Subscription;

#[Subscription]
impl Subscription {
    /// Stream every newly created order
    async fn order_created(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<impl futures::Stream<Item = OrderEventGQL>> {
        let events = ctx.data::<EventBus>()?;
        Ok(events
            .subscribe(&topic_order_created())
            .map(OrderEventGQL::from))
    }

    /// Stream status/total changes for one order
    async fn order_updated(
        &self,
        ctx: &Context<'_>,
        order_id: ID,
    ) -> async_graphql::Result<impl futures::Stream<Item = OrderEventGQL>> {
        let events = ctx.data::<EventBus>()?;
        let order_id = parse_id(&order_id, "order")?;
        Ok(events
            .subscribe(&topic_order_updated(order_id))
            .map(OrderEventGQL::from))
    }
}

// Schema type alias
pub type StorefrontSchema = Schema<Query, Mutation, Subscription>;

/// Create the GraphQL schema with fresh in-memory storage and a new bus
pub fn create_schema() -> StorefrontSchema {
    create_schema_with_storage(Arc::new(InMemoryStorage::new()), EventBus::new())
}

/// Create schema with a storage backend and event bus
///
/// The same storage and bus handed here back the whole schema: mutations
/// commit through the storage, subscriptions listen on the bus, and the
/// order engine bridges the two.
pub fn create_schema_with_storage(
    storage: Arc<dyn StoreStorage>,
    events: EventBus,
) -> StorefrontSchema {
    let engine = OrderEngine::new(storage.clone(), events.clone());
    Schema::build(Query, Mutation, Subscription)
        .data(storage)
        .data(events)
        .data(engine)
        .finish()
}
