use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{AccessPrincipal, ApiResponse, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GameRequest {
    pub name: Option<String>,
}

impl GameRequest {
    fn required_name(self) -> Result<String, ApiError> {
        self.name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ApiError::missing_field("name"))
    }
}

/// POST /api/games - create a game owned by the caller
pub async fn games_post(
    State(state): State<AppState>,
    Extension(principal): Extension<AccessPrincipal>,
    Json(body): Json<GameRequest>,
) -> ApiResult<Value> {
    let name = body.required_name()?;
    let game = state.store.create_game(principal.user_id, &name).await?;

    Ok(ApiResponse::created(json!({ "message": "Game created", "gameId": game.id })))
}

/// GET /api/games - the caller's games
pub async fn games_get(
    State(state): State<AppState>,
    Extension(principal): Extension<AccessPrincipal>,
) -> ApiResult<Value> {
    let games = state.store.list_games(principal.user_id).await?;
    let games: Vec<Value> = games.iter().map(|g| json!({ "id": g.id, "name": g.name })).collect();

    Ok(ApiResponse::success(json!({ "games": games })))
}

/// GET /api/games/:id - one game with its cardsets
pub async fn game_get(
    State(state): State<AppState>,
    Extension(principal): Extension<AccessPrincipal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    let game = state
        .store
        .find_game(id, principal.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Game not found"))?;

    let cardsets = state.store.list_cardsets(game.id).await?;
    let cardsets: Vec<Value> = cardsets.iter().map(|c| json!({ "id": c.id, "name": c.name })).collect();

    Ok(ApiResponse::success(json!({
        "id": game.id,
        "name": game.name,
        "cardsets": cardsets,
    })))
}

/// PUT /api/games/:id - rename
pub async fn game_put(
    State(state): State<AppState>,
    Extension(principal): Extension<AccessPrincipal>,
    Path(id): Path<Uuid>,
    Json(body): Json<GameRequest>,
) -> ApiResult<Value> {
    let name = body.required_name()?;

    if !state.store.rename_game(id, principal.user_id, &name).await? {
        return Err(ApiError::not_found("Game not found"));
    }

    Ok(ApiResponse::success(json!({ "message": "Game updated" })))
}

/// DELETE /api/games/:id - delete with its cardsets and images
pub async fn game_delete(
    State(state): State<AppState>,
    Extension(principal): Extension<AccessPrincipal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    if !state.store.delete_game(id, principal.user_id).await? {
        return Err(ApiError::not_found("Game not found"));
    }

    Ok(ApiResponse::success(json!({ "message": "Game deleted" })))
}
