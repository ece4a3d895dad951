// Storefront Engine
// This contains the order workflow, storage, events, and API interfaces

//! # Storefront Engine Module
//!
//! This module contains the components that power the Storefront order
//! service. The engine is the layer between the domain models and the
//! external world.
//!
//! ## Architecture Overview
//!
//! The engine follows a layered pattern:
//! - **Domain Models**: Pure data and validation (in `models/`)
//! - **Engine Layer**: Workflow execution and API interfaces (this module)
//! - **Server Layer**: HTTP server and GraphQL endpoint (in `server/`)
//!
//! ## Engine Components
//!
//! ### Order Workflow (`orders` module)
//! - `OrderEngine` runs the placement workflow: validate, price, tax,
//!   atomic commit, notify
//! - Also owns the status-update operation
//!
//! ### Storage Engine (`storage` module)
//! - Abstracts storage operations behind the `StoreStorage` trait
//! - Provides an in-memory implementation for development/testing
//! - The `commit_order` operation is the one atomic multi-row write
//!
//! ### Tax Resolution (`tax` module)
//! - Maps shipping country codes to percentage rates
//! - Rounds half-up on cents, never on stored amounts twice
//!
//! ### Event System (`events` module)
//! - `EventBus`: topic-keyed in-process publish/subscribe
//! - Backs the GraphQL subscriptions with per-subscriber queues
//!
//! ### GraphQL Engine (`graphql` module)
//! - Query/Mutation/Subscription roots and schema builders
//! - Translates between GraphQL types and domain models

/// Order placement and status-update workflow
pub mod orders;

/// Storage abstraction layer
///
/// Contains:
/// - `StoreStorage` trait definition
/// - In-memory storage implementation
/// - The atomic `commit_order` contract
pub mod storage;

/// Tax rate resolution by shipping country
pub mod tax;

/// Event system for order change notifications
///
/// Contains:
/// - `EventBus` for publishing and subscribing to order events
/// - Topic helpers for the created/updated channels
pub mod events;

/// GraphQL engine for the API interface
///
/// Contains:
/// - GraphQL schema definitions and resolvers
/// - Input/output type mappings
/// - Schema building functions
pub mod graphql;

// Re-export main engine types for clean API access
// Users can import directly from engine instead of navigating submodules

/// Re-export the order workflow engine
pub use orders::OrderEngine;

/// Re-export storage types for the persistence layer
///
/// - StoreStorage: trait defining storage operations
/// - InMemoryStorage: default in-memory implementation
pub use storage::{InMemoryStorage, OrderDraft, OrderLine, StoreStorage};

/// Re-export tax resolution
pub use tax::TaxTable;

/// Re-export event system types
///
/// - EventBus: topic-keyed publish/subscribe registry
/// - EventStream: a live subscription, deregistered on drop
pub use events::{topic_order_created, topic_order_updated, EventBus, EventStream};

/// Re-export GraphQL types for the external API
pub use graphql::{create_schema_with_storage, StorefrontSchema};
