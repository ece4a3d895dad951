// Storefront - Main GraphQL Server
// The production server for order placement and fulfillment
// Run with: cargo run --bin server

//! # Storefront Main Server Binary
//!
//! This is the main executable that starts the Storefront HTTP server.
//! It demonstrates how all the pieces come together to create a running
//! order engine that clients can connect to via GraphQL.
//!
//! ## What This Server Provides
//!
//! - **GraphQL API**: Catalog, customer, and order management via GraphQL
//! - **GraphiQL Interface**: Interactive GraphQL explorer at http://localhost:4000
//! - **Order Subscriptions**: Live orderCreated/orderUpdated feeds over WebSocket
//! - **In-Memory Storage**: Simple storage for development (no database needed)
//! - **CORS Support**: Allows browser-based clients to connect
//!
//! ## Architecture Demonstration
//!
//! This binary shows the complete Storefront architecture:
//! ```text
//! main() function
//!   ↓ builds
//! GraphQLServerBuilder
//!   ↓ creates
//! HTTP Server (Axum)
//!   ↓ serves
//! GraphQL Schema
//!   ↓ resolves via
//! Order Engine + Storage Layer (InMemoryStorage)
//!   ↓ operates on
//! Domain Models (Products, Customers, Orders)
//! ```
//!
//! ## Usage Examples
//!
//! Once running, you can:
//! - Visit http://localhost:4000 for GraphiQL interface
//! - Send GraphQL queries from any language
//! - Create products and customers, place orders
//! - Subscribe to order events over the /ws endpoint
//!
//! ## Rust Learning Notes:
//!
//! This file demonstrates several important Rust concepts:
//! - Binary crate vs library crate organization
//! - Async main functions with tokio
//! - Builder pattern for configuration
//! - Error handling with ? operator and Box<dyn Error>
//! - External crate integration (tracing, tokio)

use dotenv::dotenv; // Environment variable loading
use std::env; // Environment variable access
use storefront::GraphQLServerBuilder; // Import from our library crate
use tracing::info; // For structured logging
use tracing_subscriber; // Logging framework

/// Main entry point for the Storefront server
///
/// ## Rust Learning Notes:
///
/// ### Async Main Function
/// `#[tokio::main]` is a macro that transforms the async main function into
/// a synchronous main that sets up the tokio async runtime. This allows us
/// to use `.await` in the main function.
///
/// ### Error Handling with Box<dyn Error>
/// `Box<dyn std::error::Error>` is a common pattern for main functions.
/// It can hold any error type that implements the Error trait, making it
/// flexible for different kinds of errors that might occur.
///
/// ### The ? Operator
/// The `?` operator is used for error propagation:
/// - If the operation succeeds, extract the value and continue
/// - If the operation fails, return the error immediately
/// - Much cleaner than explicit match statements for error handling
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    // In production, these would typically be set by the deployment system
    if let Err(e) = dotenv() {
        // Only warn if .env file is missing - it's optional
        eprintln!("Warning: Could not load .env file: {}", e);
        eprintln!("Environment variables must be set manually or via system configuration");
    }

    // Initialize structured logging for the application
    tracing_subscriber::fmt::init();

    // Print startup banner - helps identify server startup in logs
    info!("🚀 Starting Storefront Server...");
    info!("=====================================");

    // Log environment configuration
    let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "localhost".to_string());
    let server_port = env::var("SERVER_PORT")
        .unwrap_or_else(|_| "4000".to_string())
        .parse::<u16>()
        .unwrap_or(4000);
    let seed_demo = env::var("SEED_DEMO_CATALOG")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    info!("Environment: {}", environment);
    info!("Log Level: {}", log_level);
    info!("Server: {}:{}", server_host, server_port);
    if seed_demo {
        info!("✅ Demo catalog seeding enabled");
    }

    // Build and start the production server
    //
    // ## Rust Learning Notes:
    //
    // ### Builder Pattern
    // The builder pattern is common in Rust for complex object construction.
    // Each method returns `self` so you can chain calls:
    // - `.with_port(4000)` sets the port and returns the builder
    // - `.build_and_run()` consumes the builder and starts the server
    let mut builder = GraphQLServerBuilder::new().with_port(server_port);
    if seed_demo {
        builder = builder.with_demo_catalog();
    }
    builder.build_and_run().await?;

    // If we reach here, the server started successfully
    // In practice, the server runs indefinitely, so this line rarely executes
    Ok(())
}
