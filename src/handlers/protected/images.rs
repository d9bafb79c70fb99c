use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::{ImageQuery, ImageScope};
use crate::error::ApiError;
use crate::handlers::public::image_response;
use crate::images::{self, catalog, Upload, Uploader};
use crate::middleware::{AccessPrincipal, ApiResponse, ApiResult};
use crate::AppState;

/// Multipart fields of an upload, before validation
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<(Option<String>, Vec<u8>)>,
    name: Option<String>,
    global: bool,
    game_id: Option<Uuid>,
    metadata: Option<Value>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let field_name = field.name().unwrap_or_default().to_string();
            match field_name.as_str() {
                "file" => {
                    let filename = field.file_name().map(str::to_string);
                    let bytes = field.bytes().await?;
                    form.file = Some((filename, bytes.to_vec()));
                }
                "name" => form.name = Some(field.text().await?),
                "global" => form.global = field.text().await?.trim() == "true",
                "gameId" => {
                    let text = field.text().await?;
                    if !text.trim().is_empty() {
                        let id = Uuid::parse_str(text.trim())
                            .map_err(|_| ApiError::bad_request("gameId must be a UUID"))?;
                        form.game_id = Some(id);
                    }
                }
                "metadata" => {
                    let text = field.text().await?;
                    if !text.trim().is_empty() {
                        let value = serde_json::from_str(&text)
                            .map_err(|e| ApiError::bad_request(format!("metadata must be JSON: {}", e)))?;
                        form.metadata = Some(value);
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

/// POST /api/images - upload, or overwrite the image already holding the derived name
pub async fn images_post(
    State(state): State<AppState>,
    Extension(principal): Extension<AccessPrincipal>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let form = UploadForm::read(multipart).await?;
    let (filename, bytes) = form.file.ok_or_else(|| ApiError::missing_field("file"))?;

    if let Some(game_id) = form.game_id {
        if state.store.find_game(game_id, principal.user_id).await?.is_none() {
            return Err(ApiError::not_found("Game not found"));
        }
    }

    let scope = if form.global {
        None
    } else {
        Some(form.game_id.unwrap_or(principal.user_id))
    };
    let name = catalog::derive_name(form.name.as_deref(), filename.as_deref(), form.global, scope)?;

    let normalized = images::normalize(bytes, state.config.images.clone()).await?;

    let uploader = Uploader {
        owner: Some(principal.user_id),
        admin: principal.admin,
    };
    let upload = Upload {
        name,
        global: form.global,
        game_id: form.game_id,
        metadata: form.metadata,
        image: normalized,
    };
    let outcome = catalog::put(state.store.as_ref(), uploader, upload).await?;

    let (status, message) = if outcome.created {
        (StatusCode::CREATED, "Image uploaded successfully!")
    } else {
        (StatusCode::OK, "Image updated successfully!")
    };

    Ok(ApiResponse::with_status(
        json!({
            "message": message,
            "imageId": outcome.image.id,
            "name": outcome.image.name,
        }),
        status,
    ))
}

#[derive(Debug, Deserialize)]
pub struct ListImagesQuery {
    pub name: Option<String>,
    pub scope: Option<String>,
    #[serde(rename = "gameId")]
    pub game_id: Option<Uuid>,
}

/// GET /api/images - metadata of the images visible in the requested scope
pub async fn images_get(
    State(state): State<AppState>,
    Extension(principal): Extension<AccessPrincipal>,
    Query(query): Query<ListImagesQuery>,
) -> ApiResult<Value> {
    let requester = principal.user_id;

    let game_id = match (query.game_id, query.scope.as_deref().map(str::trim)) {
        (Some(game_id), _) => Some(game_id),
        (None, Some(scope)) if scope.starts_with("game:") => Some(
            Uuid::parse_str(&scope["game:".len()..]).map_err(|_| ApiError::bad_request("Invalid game scope"))?,
        ),
        _ => None,
    };

    let scope = match (game_id, query.scope.as_deref().map(str::trim)) {
        (Some(game_id), _) => {
            let owns_game = state.store.find_game(game_id, requester).await?.is_some();
            ImageScope::Game {
                game_id,
                requester,
                owns_game,
            }
        }
        // "+" arrives as a space when the query string is form-decoded
        (None, None | Some("") | Some("global+mine") | Some("global mine")) => {
            ImageScope::GlobalAndOwned { requester }
        }
        (None, Some("mine")) => ImageScope::Owned { requester },
        (None, Some(other)) => return Err(ApiError::bad_request(format!("Unknown scope: {}", other))),
    };

    let images = state
        .store
        .list_images(&ImageQuery {
            name_contains: query.name.filter(|n| !n.is_empty()),
            scope,
            limit: state.config.images.list_page_size,
        })
        .await?;

    Ok(ApiResponse::success(json!({ "images": images })))
}

/// GET /api/images/:id - content of a visible image, with conditional GET
pub async fn image_get(
    State(state): State<AppState>,
    Extension(principal): Extension<AccessPrincipal>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let image = catalog::get_visible(state.store.as_ref(), id, principal.user_id).await?;
    Ok(image_response(image, &headers))
}

/// DELETE /api/images/:id - owner (or anyone, for ownerless images) deletes permanently
pub async fn image_delete(
    State(state): State<AppState>,
    Extension(principal): Extension<AccessPrincipal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    catalog::delete(state.store.as_ref(), id, principal.user_id).await?;
    Ok(ApiResponse::success(json!({ "message": "Image deleted" })))
}
