// Storefront server implementations
// This contains the server types that expose the order engine

//! # Storefront Server Module
//!
//! This module contains server implementations that expose the Storefront
//! order engine to external clients. The server layer sits on top of the
//! engine layer and provides network-accessible APIs.
//!
//! ## Server Architecture
//!
//! The server follows a **layered architecture**:
//! ```text
//! Client (Any Language)
//!        ↓ HTTP/GraphQL
//! Server Layer (this module) ← HTTP server, GraphQL endpoints
//!        ↓ Function calls
//! Engine Layer ← GraphQL schema, order workflow, storage abstraction
//!        ↓ Function calls
//! Domain Layer ← Products, customers, orders
//! ```
//!
//! ## GraphQL Server (`graphql` module)
//!
//! - HTTP server with GraphQL endpoint
//! - Built on Axum web framework
//! - Provides GraphiQL interface for development
//! - WebSocket endpoint for order subscriptions
//! - Handles CORS for browser access
//! - Integrates with any storage backend
//!
//! ## Rust Learning Notes:
//!
//! This module demonstrates:
//! - Web server architecture patterns
//! - Async HTTP handling
//! - Integration between web frameworks and business logic
//! - Configuration and builder patterns

/// GraphQL HTTP server implementation
///
/// Contains:
/// - Axum-based HTTP server
/// - GraphQL endpoint configuration
/// - CORS and middleware setup
/// - Builder pattern for server configuration
pub mod graphql;

// Re-export main server types for easy access
// This allows users to import server types directly from the server module

/// Re-export GraphQL server types
///
/// These types enable HTTP server setup:
/// - GraphQLServer: The main server instance
/// - GraphQLServerConfig: Configuration options
/// - GraphQLServerBuilder: Builder pattern for easy setup
pub use graphql::{GraphQLServer, GraphQLServerBuilder, GraphQLServerConfig};
