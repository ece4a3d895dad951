// Order, line item, and order event models
//
// ## Order Model Overview
//
// An [`Order`] is created exactly once by a successful placement and then
// only ever changes status. Its [`OrderItem`]s are written in the same
// atomic commit and are **never mutated afterward** - each one snapshots
// the product's unit price at order time, so later price changes cannot
// retroactively alter history.
//
// ### Status Lifecycle
//
// ```
//   pending -> paid -> shipped -> delivered
//      \---------------------------> cancelled
// ```
//
// The enumeration is closed but the transition graph is deliberately
// **unconstrained**: status updates overwrite freely (a dashboard fixing a
// mis-click may move `shipped` back to `paid`). Tightening this would be a
// contract change for every existing caller.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::StorefrontError;

/// The closed set of order statuses
///
/// Parsing is case-insensitive (`"Paid"`, `"PAID"`, and `"paid"` all
/// resolve); anything outside the set is an `InvalidInput` error that
/// lists the accepted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order - used for error messages
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Get the status as its canonical lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = StorefrontError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => {
                let valid: Vec<&str> = OrderStatus::ALL.iter().map(|s| s.as_str()).collect();
                Err(StorefrontError::InvalidInput(format!(
                    "invalid status '{}'. valid: {}",
                    other,
                    valid.join(", ")
                )))
            }
        }
    }
}

/// An order with its monetary totals
///
/// ## Invariants
///
/// - `total_cents == subtotal_cents + tax_cents`
/// - `subtotal_cents` equals the sum of the line item subtotals
/// - all three amounts are non-negative
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Storage-assigned identifier, immutable
    pub id: i64,
    /// Owning customer reference
    pub customer_id: i64,
    pub status: OrderStatus,
    /// Sum of line item subtotals, before tax
    pub subtotal_cents: i64,
    /// Tax resolved from the shipping country, zero when unmapped
    pub tax_cents: i64,
    /// `subtotal_cents + tax_cents`
    pub total_cents: i64,
    /// Upper-cased ISO country code the tax rate was resolved from
    pub shipping_country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single line of an order, created atomically with it
///
/// `unit_price_cents` is a **snapshot** of the product price at placement
/// time. The row is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    /// Owning order reference
    pub order_id: i64,
    /// Product reference - the live product may have changed since
    pub product_id: i64,
    /// Always positive
    pub quantity: i64,
    /// Product unit price at order time
    pub unit_price_cents: i64,
    /// `unit_price_cents * quantity`
    pub subtotal_cents: i64,
}

/// One (product, quantity) pair in a placement request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: i64,
    pub quantity: i64,
}

/// The small record published to subscribers on order changes
///
/// Emitted on the global `order_created` topic when a placement commits,
/// and on the per-order `order_updated:{id}` topic on every change
/// (including the initial creation). Delivery is best-effort: a
/// subscriber may observe this event before its own read of the
/// persisted order returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub order_id: i64,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub emitted_at: DateTime<Utc>,
}

impl OrderEvent {
    /// Build the event for an order's current state, stamped now
    pub fn for_order(order: &Order) -> Self {
        Self {
            order_id: order.id,
            status: order.status,
            total_cents: order.total_cents,
            emitted_at: Utc::now(),
        }
    }
}
