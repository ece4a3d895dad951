// Storefront - Rust Edition
// A real-time e-commerce order engine exposed over GraphQL

//! # Storefront Library
//!
//! This is the main library crate for Storefront, a small e-commerce service
//! whose heart is the **order placement and fulfillment workflow**: validate
//! the requested items, check stock, compute totals (with optional tax),
//! persist the order atomically with its line items, decrement inventory,
//! and publish change notifications for live subscribers. This file serves
//! as the **library root** and defines the public API that external crates
//! can use.
//!
//! ## Core Components
//!
//! ### Domain Models
//! - [`Product`]: A catalog item with a unit price (minor currency units) and stock
//! - [`Customer`]: The owner of orders, immutable after creation
//! - [`Order`] / [`OrderItem`]: An order with price-snapshotted line items
//! - [`OrderEvent`]: The small record published on order creation and updates
//!
//! ### Order Engine
//!
//! #### [`OrderEngine`] - The Placement and Fulfillment Workflow
//!
//! The **authoritative** component for mutating orders. Placement runs as a
//! single logical unit:
//!
//! - **Validation**: customer exists, items non-empty, quantities positive,
//!   stock sufficient - all checked before any mutation
//! - **Totals**: line subtotals snapshot the current unit price; an optional
//!   tax rate is resolved from the shipping country code
//! - **Atomic commit**: order, line items, and stock decrements either all
//!   happen or none do - concurrent placements can never jointly oversell
//! - **Notifications**: one event on the global created feed, one on the
//!   per-order updated feed
//!
//! ### GraphQL Engine
//! Provides a language-agnostic API: queries, mutations, and real-time
//! subscriptions over WebSocket.
//!
//! ### Storage Layer
//! Abstracts persistence with pluggable storage backends.
//!
//! ## Rust Learning Notes:
//!
//! ### Module System
//! Rust organizes code into modules. Each `mod` declaration tells Rust to include
//! code from either a `.rs` file or a directory with a `mod.rs` file.
//!
//! ### Re-exports
//! `pub use` statements create shortcuts so users don't need to know the internal
//! module structure. Instead of `use storefront::models::order::Order`,
//! users can write `use storefront::Order`.

// Core domain models (language-agnostic)
// The `pub` keyword makes this module accessible to external crates
pub mod models;

// Engine implementations (order workflow, storage, events, GraphQL)
pub mod engine;

// Server implementations
// This contains HTTP server and GraphQL server setup
pub mod server;

// Re-export core domain types for easy access
// This creates a "flat" API - users can import directly from the crate root
// instead of navigating the module hierarchy
pub use models::{
    Customer,         // Order owner
    NewCustomer,      // Customer creation payload
    NewProduct,       // Product creation payload
    Order,            // An order with monetary totals
    OrderEvent,       // Notification payload for order changes
    OrderItem,        // Price-snapshotted line item
    OrderItemRequest, // (product, quantity) pair in a placement request
    OrderStatus,      // pending / paid / shipped / delivered / cancelled
    Product,          // Catalog item with price and stock
    ProductUpdate,    // Explicit optional-field patch for products
};

// Re-export engine types for convenience
// These are the workflow, storage, and GraphQL implementations
pub use engine::{
    events::{topic_order_created, topic_order_updated, EventBus, EventStream},
    graphql::{
        create_schema_with_storage,
        CustomerGQL,
        OrderEventGQL,
        OrderGQL,
        OrderItemGQL,
        ProductGQL,
        // Schema type for the API
        StorefrontSchema,
    },
    orders::OrderEngine,                      // The placement/status workflow
    storage::{InMemoryStorage, StoreStorage}, // Storage abstraction and implementation
    tax::TaxTable,                            // Country-code tax resolution
};

// Re-export server types for convenience
pub use server::graphql::GraphQLServerBuilder;

// Core error types
// Using the `thiserror` crate to make error handling easier
use thiserror::Error;

/// Custom error types for Storefront operations
///
/// ## Rust Learning Notes:
///
/// ### Error Handling in Rust
/// Rust doesn't have exceptions. Instead, it uses `Result<T, E>` types where:
/// - `Ok(value)` represents success
/// - `Err(error)` represents failure
///
/// ### The `thiserror` Crate
/// This crate provides macros to make error types easier to write:
/// - `#[derive(Error)]` implements the `std::error::Error` trait
/// - `#[error("...")]` provides human-readable error messages
/// - `{field}` in error messages allows string interpolation
/// - `#[from]` enables automatic conversion from other error types
#[derive(Error, Debug)]
pub enum StorefrontError {
    /// A customer, product, or order identifier did not resolve
    /// The message always names the offending identifier
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input from the caller: empty item list, non-positive
    /// quantity, negative price/stock, or an unrecognized status value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A requested quantity exceeds the available stock
    /// Carries enough detail for the caller to adjust and resubmit
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: i64, // Product that could not cover the request
        requested: i64,  // Quantity the caller asked for
        available: i64,  // Stock on hand at commit time
    },

    /// Transactional commit failure - the order was rolled back and the
    /// caller sees it as never having been created (no retry is attempted)
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// JSON serialization/deserialization errors
    /// Uses `#[from]` for automatic conversion
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// GraphQL-specific errors
    #[error("GraphQL error: {0}")]
    GraphQL(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for StorefrontError {
    fn from(err: std::io::Error) -> Self {
        StorefrontError::Internal(err.to_string())
    }
}

/// Type alias for Results that use our custom error type
///
/// ## Rust Learning Notes:
///
/// ### Type Aliases
/// This creates a shorthand for a commonly-used type. Instead of writing
/// `std::result::Result<Order, StorefrontError>` everywhere, we can
/// just write `Result<Order>`.
pub type Result<T> = std::result::Result<T, StorefrontError>;
