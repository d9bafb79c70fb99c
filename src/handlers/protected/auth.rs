use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::middleware::AccessPrincipal;

/// GET /api/auth - succeeds only for a valid, unrevoked access token
pub async fn auth_get(Extension(principal): Extension<AccessPrincipal>) -> Json<Value> {
    Json(json!({
        "auth": true,
        "userId": principal.user_id,
        "admin": principal.admin,
    }))
}
