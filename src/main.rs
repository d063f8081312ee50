use axum::extract::State;
use axum::{http::Method, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod config;
mod database;
mod dtos;
mod engine;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod state;

use config::{AppConfig, StoreBackend};
use database::connection::get_db_client;
use database::memory_store::MemoryStore;
use database::mongo_store::MongoStore;
use database::Store;
use errors::AppError;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        "⚽ Season {} with {} gameweeks",
        config.season.season,
        config.season.total_gameweeks
    );

    let store = initialize_store(&config).await?;
    let app_state = AppState::new(store, config.season.clone());

    let app = build_router(app_state);
    start_server(app, &config).await
}

async fn initialize_store(config: &AppConfig) -> errors::Result<Arc<dyn Store>> {
    match config.store_backend {
        StoreBackend::Mongo => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| AppError::configuration("DATABASE_URL is not set"))?;
            let (client, db) = get_db_client(url, &config.database_name).await?;
            Ok(Arc::new(MongoStore::new(client, db)))
        }
        StoreBackend::Memory => {
            let store = match &config.seed_file {
                Some(path) => {
                    tracing::info!("🌱 Seeding in-memory store from {}", path);
                    MemoryStore::from_seed_file(path).await?
                }
                None => MemoryStore::new(),
            };
            tracing::warn!("⚠️ Using in-memory store, data is lost on restart");
            Ok(Arc::new(store))
        }
    }
}

fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_credentials(false);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/api/health", get(api_health_check))
        .nest("/api/gameweeks", routes::gameweeks::routes())
        .nest("/api/leagues", routes::leagues::routes())
        .nest("/api/admin", routes::admin::admin_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

async fn start_server(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("🚀 Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind to {}: {}", addr, e);
        e
    })?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn root_handler() -> &'static str {
    "⚽ Predictor Scoring API"
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn api_health_check(State(state): State<AppState>) -> Json<Value> {
    let db_status = match state.store.ping().await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!("Store ping failed: {}", e);
            "disconnected"
        }
    };

    Json(json!({
        "status": "healthy",
        "database": db_status,
        "season": state.season.season,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
