//! Tour Lifecycle Backend
//!
//! REST backend with SQLite persistence that archives a finished tour and
//! purges it when the next one starts.

mod api;
mod auth;
mod blob;
mod config;
mod db;
mod errors;
mod models;
mod tour;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use sqlx::SqlitePool;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use blob::HttpBlobStore;
use config::{Config, LogFormat};
use db::{
    SqliteEventDayStore, SqliteEventStore, SqliteMapAggregator, SqliteParticipantStore,
    SqliteTourStatusStore,
};
use tour::{
    AssetCleaner, BlobStore, ManagedUrlPattern, MapSnapshotBuilder, TourLifecycleOrchestrator,
    TourStores, TransitionSettings,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub tour: Arc<TourLifecycleOrchestrator>,
    pub map_view: MapSnapshotBuilder,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the SQLite stores and the blob store into an orchestrator.
    pub fn build(pool: SqlitePool, blob: Arc<dyn BlobStore>, config: Config) -> Self {
        let map = Arc::new(SqliteMapAggregator::new(pool.clone()));
        let stores = TourStores {
            participants: Arc::new(SqliteParticipantStore::new(pool.clone())),
            events: Arc::new(SqliteEventStore::new(pool.clone())),
            event_days: Arc::new(SqliteEventDayStore::new(pool.clone())),
            map: map.clone(),
            status: Arc::new(SqliteTourStatusStore::new(pool)),
        };

        let pattern = config.blob_base_url.as_deref().and_then(|base| {
            let pattern = ManagedUrlPattern::new(base);
            if pattern.is_none() {
                tracing::warn!("TOUR_BLOB_BASE_URL {:?} is not an absolute URL; image cleanup disabled", base);
            }
            pattern
        });
        let assets = AssetCleaner::new(blob, pattern, config.step_timeout);
        let settings = TransitionSettings {
            step_timeout: config.step_timeout,
            status_write_retries: config.status_write_retries,
        };

        Self {
            tour: Arc::new(TourLifecycleOrchestrator::new(stores, assets, settings)),
            map_view: MapSnapshotBuilder::new(map),
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }

    tracing::info!("Starting Tour Lifecycle Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.admin_psk.is_none() {
        tracing::warn!("No admin PSK configured (TOUR_ADMIN_PSK). Authentication is disabled!");
    }
    if config.blob_base_url.is_none() {
        tracing::warn!("No blob store configured (TOUR_BLOB_BASE_URL). Event images will not be cleaned up");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;

    let blob_base = config.blob_base_url.clone().unwrap_or_default();
    let blob = Arc::new(HttpBlobStore::new(
        reqwest::Client::new(),
        &blob_base,
        config.blob_service_key.clone(),
    ));

    let bind_addr = config.bind_addr;
    let state = AppState::build(pool, blob, config);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.admin_psk.clone();

    // API routes
    let api_routes = Router::new()
        .route("/tour-status", get(api::get_tour_status))
        .route("/tour-status", put(api::update_tour_status))
        .route("/map", get(api::get_map))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
