use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::password::hash_password_blocking;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::AppState;

/// Username and password as posted to /api/users and /api/tokens
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    /// Both fields, non-empty, or a 400 naming the first missing one
    pub fn required(self) -> Result<(String, String), ApiError> {
        let username = self
            .username
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ApiError::missing_field("username"))?;
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::missing_field("password"))?;
        Ok((username, password))
    }
}

/// POST /api/users - register and receive a token pair
pub async fn users_post(State(state): State<AppState>, Json(body): Json<Credentials>) -> ApiResult<Value> {
    let (username, password) = body.required()?;

    if state.store.find_user_by_username(&username).await?.is_some() {
        return Err(ApiError::conflict(format!("User {} already exists.", username)));
    }

    let password_hash = hash_password_blocking(password, state.config.security.password_hash_cost).await?;

    // The lookup above is a fast path; the unique index decides races
    let user = match state.store.create_user(&username, &password_hash).await {
        Ok(user) => user,
        Err(DatabaseError::UniqueViolation(_)) => {
            return Err(ApiError::conflict(format!("User {} already exists.", username)));
        }
        Err(e) => return Err(e.into()),
    };

    let pair = state.tokens.issue_pair(user.id, user.admin)?;
    info!(user_id = %user.id, username = %user.username, "User registered");

    Ok(ApiResponse::created(json!({
        "accessToken": pair.access_token,
        "refreshToken": pair.refresh_token,
        "message": format!("User {} was created.", username),
    })))
}
