use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::users::Credentials;
use crate::auth::password::verify_password_blocking;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::AppState;

/// POST /api/tokens - log in with username and password
pub async fn tokens_post(State(state): State<AppState>, Json(body): Json<Credentials>) -> ApiResult<Value> {
    let (username, password) = body.required()?;

    let user = state
        .store
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User {} doesn't exist.", username)))?;

    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(ApiError::bad_request("Wrong credentials."));
    }

    let pair = state.tokens.issue_pair(user.id, user.admin)?;
    info!(user_id = %user.id, "User logged in");

    Ok(ApiResponse::success(json!({
        "accessToken": pair.access_token,
        "refreshToken": pair.refresh_token,
        "message": format!("Logged in as {}.", username),
    })))
}
