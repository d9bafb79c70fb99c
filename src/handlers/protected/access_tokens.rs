use axum::{extract::State, Extension};
use serde_json::{json, Value};
use tracing::info;

use crate::middleware::{AccessPrincipal, ApiResponse, ApiResult, RefreshPrincipal};
use crate::AppState;

/// POST /api/access_tokens - exchange a refresh token for a new access token
pub async fn access_tokens_post(
    State(state): State<AppState>,
    Extension(principal): Extension<RefreshPrincipal>,
) -> ApiResult<Value> {
    let access_token = state.tokens.issue_access_token(principal.user_id, principal.admin)?;
    Ok(ApiResponse::success(json!({ "accessToken": access_token })))
}

/// DELETE /api/access_tokens - revoke the presented access token
pub async fn access_tokens_delete(
    State(state): State<AppState>,
    Extension(principal): Extension<AccessPrincipal>,
) -> ApiResult<Value> {
    state.store.revoke(&principal.token, principal.expires_at).await?;
    info!(user_id = %principal.user_id, "Access token revoked");

    Ok(ApiResponse::success(json!({ "message": "Access token has been revoked." })))
}
