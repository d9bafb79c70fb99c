use axum::{
    extract::{Path, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE, ETAG, IF_NONE_MATCH},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
};

use crate::database::models::Image;
use crate::error::ApiError;
use crate::images::catalog;
use crate::AppState;

/// GET /api/imagefiles/:name - image content by name, with conditional GET
pub async fn imagefile_get(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let image = catalog::get_by_name(state.store.as_ref(), &name).await?;
    Ok(image_response(image, &headers))
}

/// Full content with validator, or 304 when the caller's validator still matches
pub fn image_response(image: Image, headers: &HeaderMap) -> Response {
    let tag = catalog::etag(image.updated_at);

    let matches = headers
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| catalog::if_none_match(v, &tag));

    if matches {
        return (
            StatusCode::NOT_MODIFIED,
            [(ETAG, tag), (CACHE_CONTROL, "no-cache".to_string())],
        )
            .into_response();
    }

    let disposition = format!("attachment; filename=\"{}\"", header_safe(&image.name));

    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, image.mime_type),
            (CONTENT_DISPOSITION, disposition),
            (ETAG, tag),
            (CACHE_CONTROL, "no-cache".to_string()),
        ],
        image.data,
    )
        .into_response()
}

/// Replace anything that cannot sit inside a quoted header parameter
fn header_safe(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect()
}
