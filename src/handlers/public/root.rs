use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::AppState;

/// GET / - service description
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Cardamon API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "users": "POST /api/users (public)",
            "tokens": "POST /api/tokens (public)",
            "access_tokens": "POST /api/access_tokens (refresh token), DELETE /api/access_tokens (access token)",
            "refresh_tokens": "DELETE /api/refresh_tokens (refresh token)",
            "auth": "GET /api/auth (access token)",
            "images": "/api/images[/:id] (access token)",
            "imagefiles": "GET /api/imagefiles/:name (public)",
            "games": "/api/games[/:id] (access token)",
            "cardsets": "/api/cardsets[/:id] (access token)",
        }
    }))
}

/// GET /api - welcome message
pub async fn api_root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Cardamon API!" }))
}

/// GET /health - store liveness
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
