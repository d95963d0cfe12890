use axum::{extract::State, response::Json};

use crate::AppState;

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = match state.repo.ping().await {
        Ok(()) => "up",
        Err(e) => {
            tracing::warn!("⚠️ Health check could not reach the database: {}", e);
            "down"
        }
    };

    Json(serde_json::json!({
        "status": if database == "up" { "healthy" } else { "degraded" },
        "service": "cardcatalog-backend",
        "timestamp": chrono::Utc::now(),
        "database": database,
        "endpoints": {
            "list": "/cards/",
            "filter": "/cards/filter/",
            "card": "/cards/:id",
            "load": "/cards/load",
            "health": "/api/health"
        }
    }))
}
