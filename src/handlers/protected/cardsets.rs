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
#[serde(rename_all = "camelCase")]
pub struct CardsetRequest {
    pub name: Option<String>,
    pub data: Option<Value>,
    pub game_id: Option<Uuid>,
}

/// POST /api/cardsets - create a cardset in one of the caller's games
pub async fn cardsets_post(
    State(state): State<AppState>,
    Extension(principal): Extension<AccessPrincipal>,
    Json(body): Json<CardsetRequest>,
) -> ApiResult<Value> {
    let name = body
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::missing_field("name"))?;
    let data = body.data.ok_or_else(|| ApiError::missing_field("data"))?;
    let game_id = body.game_id.ok_or_else(|| ApiError::missing_field("gameId"))?;

    if state.store.find_game(game_id, principal.user_id).await?.is_none() {
        return Err(ApiError::not_found("Game not found"));
    }

    let cardset = state
        .store
        .create_cardset(principal.user_id, game_id, &name, &data)
        .await?;

    Ok(ApiResponse::created(json!({ "message": "Card Set created", "cardsetId": cardset.id })))
}

/// GET /api/cardsets/:id
pub async fn cardset_get(
    State(state): State<AppState>,
    Extension(principal): Extension<AccessPrincipal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    let cardset = state
        .store
        .find_cardset(id, principal.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Card Set not found"))?;

    Ok(ApiResponse::success(json!({
        "id": cardset.id,
        "name": cardset.name,
        "data": cardset.data,
        "gameId": cardset.game_id,
    })))
}

/// PUT /api/cardsets/:id - replace name and/or data
pub async fn cardset_put(
    State(state): State<AppState>,
    Extension(principal): Extension<AccessPrincipal>,
    Path(id): Path<Uuid>,
    Json(body): Json<CardsetRequest>,
) -> ApiResult<Value> {
    let name = body.name.filter(|n| !n.trim().is_empty());

    let updated = state
        .store
        .update_cardset(id, principal.user_id, name.as_deref(), body.data.as_ref())
        .await?;

    if !updated {
        return Err(ApiError::not_found("Card Set not found"));
    }

    Ok(ApiResponse::success(json!({ "message": "Card Set updated" })))
}

/// DELETE /api/cardsets/:id
pub async fn cardset_delete(
    State(state): State<AppState>,
    Extension(principal): Extension<AccessPrincipal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    if !state.store.delete_cardset(id, principal.user_id).await? {
        return Err(ApiError::not_found("Card Set not found"));
    }

    Ok(ApiResponse::success(json!({ "message": "Card Set deleted" })))
}
