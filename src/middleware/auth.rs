use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::auth::{AuthError, TokenKind, VerifiedToken};
use crate::error::ApiError;
use crate::AppState;

/// Caller authenticated with an access token
#[derive(Clone, Debug)]
pub struct AccessPrincipal {
    pub user_id: Uuid,
    pub admin: bool,
    /// The raw token as presented, so logout can revoke exactly it
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Caller authenticated with a refresh token
#[derive(Clone, Debug)]
pub struct RefreshPrincipal {
    pub user_id: Uuid,
    pub admin: bool,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Access guard: only unrevoked access tokens pass
pub async fn require_access_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let (token, verified) = authenticate(&state, request.headers(), TokenKind::Access)
        .await
        .map_err(reject)?;

    request.extensions_mut().insert(AccessPrincipal {
        user_id: verified.user_id,
        admin: verified.admin,
        token,
        expires_at: verified.expires_at,
    });

    Ok(next.run(request).await)
}

/// Refresh guard: only unrevoked refresh tokens pass
pub async fn require_refresh_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let (token, verified) = authenticate(&state, request.headers(), TokenKind::Refresh)
        .await
        .map_err(reject)?;

    request.extensions_mut().insert(RefreshPrincipal {
        user_id: verified.user_id,
        admin: verified.admin,
        token,
        expires_at: verified.expires_at,
    });

    Ok(next.run(request).await)
}

/// Header present, signature and expiry valid, kind matches, not revoked.
async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    expected: TokenKind,
) -> Result<(String, VerifiedToken), AuthError> {
    let token = extract_bearer_token(headers)?;
    let verified = state.tokens.verify(&token)?;

    if verified.kind != expected {
        return Err(AuthError::WrongKind {
            expected,
            found: verified.kind,
        });
    }

    if state.store.is_revoked(&token).await? {
        return Err(AuthError::Revoked);
    }

    Ok((token, verified))
}

/// Extract the token from `Authorization: Bearer <token>`
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let auth_header = headers.get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::MalformedHeader("header is not visible ASCII"))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedHeader("expected Bearer scheme"))?;

    if token.trim().is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token.to_string())
}

fn reject(err: AuthError) -> Response {
    tracing::debug!("Rejected request: {}", err);

    let api_error = ApiError::from(err);
    let mut body = api_error.to_json();
    body["auth"] = json!(false);

    (api_error.status_code(), Json(body)).into_response()
}
