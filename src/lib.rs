pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod images;
pub mod middleware;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{AuthError, TokenCodec};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::Store;
use crate::handlers::{protected, public};
use crate::middleware::{require_access_token, require_refresh_token};

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenCodec>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Result<Self, AuthError> {
        let tokens = TokenCodec::from_config(&config.security)?;
        Ok(Self {
            store,
            tokens: Arc::new(tokens),
            config: Arc::new(config),
        })
    }
}

/// The full HTTP surface
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/api", get(public::api_root))
        .route("/health", get(public::health))
        .route("/api/users", post(public::users_post))
        .route("/api/tokens", post(public::tokens_post))
        .route("/api/imagefiles/:name", get(public::imagefile_get))
        // Token exchange and logout; one path, a different guard per method
        .route(
            "/api/access_tokens",
            post(protected::access_tokens::access_tokens_post)
                .route_layer(from_fn_with_state(state.clone(), require_refresh_token))
                .merge(
                    delete(protected::access_tokens::access_tokens_delete)
                        .route_layer(from_fn_with_state(state.clone(), require_access_token)),
                ),
        )
        .merge(refresh_routes(state.clone()))
        .merge(access_routes(state.clone()))
        // Global middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Routes behind the refresh guard
fn refresh_routes(state: AppState) -> Router<AppState> {
    use protected::refresh_tokens;

    Router::new()
        .route("/api/refresh_tokens", delete(refresh_tokens::refresh_tokens_delete))
        .route_layer(from_fn_with_state(state, require_refresh_token))
}

/// Routes behind the access guard
fn access_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, cardsets, games, images};

    Router::new()
        .route("/api/auth", get(auth::auth_get))
        .route("/api/images", post(images::images_post).get(images::images_get))
        .route("/api/images/:id", get(images::image_get).delete(images::image_delete))
        .route("/api/games", post(games::games_post).get(games::games_get))
        .route(
            "/api/games/:id",
            get(games::game_get).put(games::game_put).delete(games::game_delete),
        )
        .route("/api/cardsets", post(cardsets::cardsets_post))
        .route(
            "/api/cardsets/:id",
            get(cardsets::cardset_get)
                .put(cardsets::cardset_put)
                .delete(cardsets::cardset_delete),
        )
        .route_layer(from_fn_with_state(state, require_access_token))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
