// GraphQL server implementation for Storefront
// This creates a standalone GraphQL server over the order engine

use std::sync::Arc;

use async_graphql_axum::{GraphQLRequest, GraphQLResponse, GraphQLSubscription};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Router, Server,
};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::engine::{
    events::EventBus,
    graphql::{create_schema_with_storage, StorefrontSchema},
    storage::{InMemoryStorage, StoreStorage},
};
use crate::models::{NewCustomer, NewProduct};

/// GraphQL server configuration
#[derive(Clone)]
pub struct GraphQLServerConfig {
    pub port: u16,
    pub cors_enabled: bool,
}

impl Default for GraphQLServerConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            cors_enabled: true,
        }
    }
}

/// GraphQL server
pub struct GraphQLServer {
    config: GraphQLServerConfig,
    storage: Arc<dyn StoreStorage>,
    events: EventBus,
    seed_demo_catalog: bool,
}

impl GraphQLServer {
    pub fn new() -> Self {
        Self {
            config: GraphQLServerConfig::default(),
            storage: Arc::new(InMemoryStorage::new()),
            events: EventBus::new(),
            seed_demo_catalog: false,
        }
    }

    pub fn with_config(mut self, config: GraphQLServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn StoreStorage>) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Preload a small demo catalog so GraphiQL has something to query
    pub fn with_demo_catalog(mut self) -> Self {
        self.seed_demo_catalog = true;
        self
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        if self.seed_demo_catalog {
            self.add_demo_catalog().await?;
        }

        info!("🛒 Starting server with in-process order engine");
        let schema = create_schema_with_storage(self.storage, self.events);

        let app = build_router(schema, self.config.cors_enabled);

        let addr = format!("0.0.0.0:{}", self.config.port);

        info!(
            "🚀 GraphQL server running on http://localhost:{}",
            self.config.port
        );
        info!(
            "📊 GraphiQL interface: http://localhost:{}",
            self.config.port
        );
        info!(
            "🔗 GraphQL endpoint: http://localhost:{}/graphql",
            self.config.port
        );
        info!(
            "📡 GraphQL WebSocket: ws://localhost:{}/ws",
            self.config.port
        );

        // Use axum 0.6 syntax
        Server::bind(&addr.parse()?)
            .serve(app.into_make_service())
            .await?;
        Ok(())
    }

    async fn add_demo_catalog(&self) -> Result<(), Box<dyn std::error::Error>> {
        let products = [
            ("Mechanical Keyboard", Some("Tenkeyless, hot-swappable"), 8900_i64, 25_i64),
            ("USB-C Dock", Some("Dual display, 100W passthrough"), 14900, 10),
            ("Desk Mat", None, 1900, 50),
        ];
        for (title, description, price_cents, stock) in products {
            self.storage
                .create_product(NewProduct {
                    title: title.to_string(),
                    description: description.map(String::from),
                    price_cents,
                    stock,
                })
                .await?;
        }

        self.storage
            .create_customer(NewCustomer {
                name: "Demo Customer".to_string(),
                email: "demo@example.com".to_string(),
            })
            .await?;

        debug!("✅ Seeded demo catalog:");
        debug!("   📦 3 products");
        debug!("   👤 1 customer");

        Ok(())
    }
}

impl Default for GraphQLServer {
    fn default() -> Self {
        Self::new()
    }
}

fn build_router(schema: StorefrontSchema, cors_enabled: bool) -> Router {
    let app_state = Arc::new(RwLock::new(schema.clone()));

    let subscription_service = GraphQLSubscription::new(schema);

    let mut app = Router::new()
        .route("/", get(graphiql).post(graphql_handler))
        .route("/graphql", post(graphql_handler))
        .route_service("/ws", subscription_service)
        .route("/health", get(health_check))
        .with_state(app_state);

    if cors_enabled {
        app = app.layer(CorsLayer::permissive());
    }

    app
}

/// Builder pattern for server configuration
pub struct GraphQLServerBuilder {
    server: GraphQLServer,
}

impl GraphQLServerBuilder {
    pub fn new() -> Self {
        Self {
            server: GraphQLServer::new(),
        }
    }

    pub fn with_storage(mut self, storage: Arc<dyn StoreStorage>) -> Self {
        self.server = self.server.with_storage(storage);
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.server = self.server.with_events(events);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        let mut config = self.server.config.clone();
        config.port = port;
        self.server = self.server.with_config(config);
        self
    }

    pub fn with_demo_catalog(mut self) -> Self {
        self.server = self.server.with_demo_catalog();
        self
    }

    pub async fn build_and_run(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server.run().await
    }
}

impl Default for GraphQLServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// GraphQL handler
async fn graphql_handler(
    State(schema): State<Arc<RwLock<StorefrontSchema>>>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let schema = schema.read().await;
    schema.execute(req.into_inner()).await.into()
}

// GraphiQL interface with WebSocket support
async fn graphiql() -> impl IntoResponse {
    Html(
        r#"
<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta name="robots" content="noindex">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="referrer" content="origin">
    <title>GraphiQL IDE</title>
    <style>
      body {
        height: 100%;
        margin: 0;
        width: 100%;
        overflow: hidden;
      }
      #graphiql {
        height: 100vh;
      }
    </style>
    <script crossorigin src="https://unpkg.com/react@18/umd/react.development.js"></script>
    <script crossorigin src="https://unpkg.com/react-dom@18/umd/react-dom.development.js"></script>
    <link rel="icon" href="https://graphql.org/favicon.ico">
    <link rel="stylesheet" href="https://unpkg.com/graphiql@3/graphiql.min.css" />
  </head>
  <body>
    <div id="graphiql">Loading...</div>
    <script src="https://unpkg.com/graphiql@3/graphiql.min.js" type="application/javascript"></script>
    <script>
      const root = ReactDOM.createRoot(document.getElementById('graphiql'));

      const fetcher = GraphiQL.createFetcher({
        url: '/graphql',
        subscriptionUrl: 'ws://localhost:4000/ws',
      });

      root.render(React.createElement(GraphiQL, {
        fetcher: fetcher,
        defaultEditorToolsVisibility: true,
      }));
    </script>
  </body>
</html>
"#,
    )
}

// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Storefront GraphQL Server is running!")
}
