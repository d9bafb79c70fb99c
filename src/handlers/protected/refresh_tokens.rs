use axum::{extract::State, Extension};
use serde_json::{json, Value};
use tracing::info;

use crate::middleware::{ApiResponse, ApiResult, RefreshPrincipal};
use crate::AppState;

/// DELETE /api/refresh_tokens - revoke the presented refresh token
pub async fn refresh_tokens_delete(
    State(state): State<AppState>,
    Extension(principal): Extension<RefreshPrincipal>,
) -> ApiResult<Value> {
    state.store.revoke(&principal.token, principal.expires_at).await?;
    info!(user_id = %principal.user_id, "Refresh token revoked");

    Ok(ApiResponse::success(json!({ "message": "Refresh token has been revoked." })))
}
