use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod query;
pub mod repository;

use config::AppConfig;
use handlers::{cards, health};
use repository::CardRepository;

#[derive(Clone)]
pub struct AppState {
    pub repo: CardRepository,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(repo: CardRepository, config: AppConfig) -> Self {
        Self {
            repo,
            config: Arc::new(config),
        }
    }
}

/// Full application router with tracing and CORS layers.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/api/health", get(health::health_check))
        .merge(cards::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let base = if config.debug_mode {
        info!("🔓 Development mode: Using permissive CORS");
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("⚠️ Ignoring unparsable origin '{}': {}", origin, e);
                    None
                }
            })
            .collect();
        info!("🔒 CORS configured for {} origin(s)", origins.len());
        CorsLayer::new().allow_origin(origins)
    };

    base.allow_methods([
        axum::http::Method::GET,
        axum::http::Method::POST,
        axum::http::Method::OPTIONS,
    ])
    .allow_headers([
        axum::http::header::CONTENT_TYPE,
        axum::http::header::ACCEPT,
    ])
}
