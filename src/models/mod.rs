// Core domain models for Storefront
// These are the generic, storage-agnostic data structures

//! # Domain Models Module
//!
//! This module contains the core domain models for Storefront. These are
//! plain data structures with their validation rules - no storage, no
//! GraphQL, no transport concerns. Money is always stored in **minor
//! currency units** (cents) as integers; floating point never touches a
//! stored amount.
//!
//! ## Rust Learning Notes:
//!
//! ### Module Organization
//! This `mod.rs` file serves as the **module root** for the `models`
//! directory. When you have a directory with a `mod.rs` file, Rust treats
//! the directory as a module, and `mod.rs` acts as the entry point.
//!
//! ### Re-exports for Clean APIs
//! The `pub use` statements at the bottom create a clean, flat API.
//! Users can import `use storefront::models::Order` instead of
//! `use storefront::models::order::Order`.

// Declares the `product` submodule from `product.rs`
// Contains Product, NewProduct, and the ProductUpdate patch type
pub mod product;

// Declares the `customer` submodule from `customer.rs`
// Contains Customer and NewCustomer
pub mod customer;

// Declares the `order` submodule from `order.rs`
// Contains Order, OrderItem, OrderStatus, and the OrderEvent payload
pub mod order;

// Re-export main types for convenience
// This creates shortcuts so users don't need to know the internal structure

/// Re-export product types
/// - Product: catalog item with unit price and stock
/// - NewProduct: creation payload with validation
/// - ProductUpdate: explicit optional-field patch (absent means unchanged)
pub use product::{NewProduct, Product, ProductUpdate};

/// Re-export customer types
pub use customer::{Customer, NewCustomer};

/// Re-export order types
/// - Order: monetary totals plus status
/// - OrderItem: price-snapshotted line item, never mutated after creation
/// - OrderItemRequest: (product, quantity) pair in a placement request
/// - OrderStatus: the status enumeration with case-insensitive parsing
/// - OrderEvent: the record published on creation and status changes
pub use order::{Order, OrderEvent, OrderItem, OrderItemRequest, OrderStatus};
