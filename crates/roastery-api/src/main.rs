// Roastery API server
// Decision: Schema is bootstrapped on startup with IF NOT EXISTS DDL, no migration engine
// Decision: CORS is off unless CORS_ALLOWED_ORIGINS is set

mod coffees;
mod common;
mod config;
mod error;
mod events;
mod services;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Json, Router};
use roastery_core::{Coffee, Event, Flavor, FlavorLookup, RecommendationWorkflow};
use roastery_storage::Database;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::common::ListResponse;
use crate::config::ServerConfig;
use crate::services::{CoffeeService, EventService};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        coffees::create_coffee,
        coffees::list_coffees,
        coffees::get_coffee,
        coffees::update_coffee,
        coffees::delete_coffee,
        coffees::recommend_coffee,
        events::list_events,
        events::get_event,
    ),
    components(
        schemas(
            Coffee, Flavor, Event,
            coffees::CreateCoffeeRequest,
            coffees::UpdateCoffeeRequest,
            ListResponse<Coffee>,
            ListResponse<Event>,
        )
    ),
    tags(
        (name = "coffees", description = "Coffee catalogue and recommendations"),
        (name = "events", description = "Recorded domain events")
    ),
    info(
        title = "Roastery API",
        version = "0.1.0",
        description = "API for managing coffees, their flavors, and recommendation events",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roastery_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("roastery-api starting...");

    let config = ServerConfig::from_env();

    // Initialize database
    let connect_options = config
        .database
        .connect_options()
        .context("Invalid database configuration")?;
    let db = Database::connect(
        connect_options,
        config.database.max_connections,
        config.database.acquire_timeout,
    )
    .await
    .context("Failed to connect to database")?;
    db.ensure_schema()
        .await
        .context("Failed to create database schema")?;
    tracing::info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let db = Arc::new(db);
    let coffee_service = Arc::new(CoffeeService::new(
        db.clone(),
        FlavorLookup::new(db.clone()),
        RecommendationWorkflow::new(db.clone()),
    ));
    let event_service = Arc::new(EventService::new(db));

    let app = build_router(
        coffees::AppState::new(coffee_service),
        events::AppState::new(event_service),
        config.request_timeout,
    );

    let cors_origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    // Add CORS layer only if origins are configured
    let app = if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
        app
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]),
        )
    };

    // Start server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Assemble the full application router (extracted for testing)
fn build_router(
    coffees_state: coffees::AppState,
    events_state: events::AppState,
    request_timeout: Duration,
) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(coffees::routes(coffees_state))
        .merge(events::routes(events_state))
        .merge(SwaggerUi::new("/api").url("/api-json", ApiDoc::openapi()))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{coffee_service, event_service, send};
    use async_trait::async_trait;
    use roastery_core::error::Result as StoreResult;
    use roastery_core::{CoffeeId, InMemoryStore, NewEvent, TransactionFactory, UnitOfWork};
    use serde_json::json;

    fn test_app(store: &InMemoryStore) -> Router {
        build_router(
            coffees::AppState::new(coffee_service(store)),
            events::AppState::new(event_service(store)),
            Duration::from_secs(3),
        )
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app(&InMemoryStore::new());

        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let app = test_app(&InMemoryStore::new());

        let (status, body) = send(&app, "GET", "/api-json", None).await;
        assert_eq!(status, 200);
        assert_eq!(body["info"]["title"], "Roastery API");
        assert!(body["paths"]["/coffees/{id}/recommend"]["post"].is_object());
        assert!(body["paths"]["/events"]["get"].is_object());
        assert!(body["components"]["schemas"]["Coffee"].is_object());
    }

    #[tokio::test]
    async fn test_recommendation_is_visible_in_event_log() {
        let app = test_app(&InMemoryStore::new());
        let coffee = json!({ "name": "Roast", "brand": "Brew", "flavors": ["nutty"] });
        send(&app, "POST", "/coffees", Some(coffee)).await;

        let (status, _) = send(&app, "POST", "/coffees/1/recommend", None).await;
        assert_eq!(status, 200);

        let (status, body) = send(&app, "GET", "/events?name=recommend_coffee", None).await;
        assert_eq!(status, 200);
        assert_eq!(body["data"][0]["payload"], json!({ "coffeeId": 1 }));
    }

    /// Units of work that hang on the event append
    struct StalledTransactions(InMemoryStore);

    struct StalledUnitOfWork(Box<dyn UnitOfWork>);

    #[async_trait]
    impl TransactionFactory for StalledTransactions {
        async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
            Ok(Box::new(StalledUnitOfWork(self.0.begin().await?)))
        }
    }

    #[async_trait]
    impl UnitOfWork for StalledUnitOfWork {
        async fn increment_recommendations(&mut self, id: CoffeeId) -> StoreResult<Coffee> {
            self.0.increment_recommendations(id).await
        }

        async fn append_event(&mut self, _event: NewEvent) -> StoreResult<Event> {
            std::future::pending().await
        }

        async fn commit(self: Box<Self>) -> StoreResult<()> {
            self.0.commit().await
        }

        async fn rollback(self: Box<Self>) -> StoreResult<()> {
            self.0.rollback().await
        }
    }

    #[tokio::test]
    async fn test_timed_out_recommendation_is_rolled_back() {
        let store = InMemoryStore::new();
        let coffees = Arc::new(CoffeeService::new(
            Arc::new(store.clone()),
            FlavorLookup::new(Arc::new(store.clone())),
            RecommendationWorkflow::new(Arc::new(StalledTransactions(store.clone()))),
        ));
        let app = build_router(
            coffees::AppState::new(coffees),
            events::AppState::new(event_service(&store)),
            Duration::from_millis(50),
        );
        let coffee = json!({ "name": "Roast", "brand": "Brew", "flavors": [] });
        send(&app, "POST", "/coffees", Some(coffee)).await;

        let (status, _) = send(&app, "POST", "/coffees/1/recommend", None).await;
        assert_eq!(status, 408);

        let (status, coffee) = send(&app, "GET", "/coffees/1", None).await;
        assert_eq!(status, 200);
        assert_eq!(coffee["recommendations"], 0);
        assert_eq!(store.event_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = test_app(&InMemoryStore::new());

        let (status, _) = send(&app, "GET", "/teas", None).await;
        assert_eq!(status, 404);
    }
}
