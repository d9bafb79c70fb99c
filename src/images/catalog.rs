//! Name-keyed image catalog: naming, create-or-overwrite, visibility and
//! cache validators.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::pipeline::NormalizedImage;
use crate::database::models::{Image, ImageContent, NewImage};
use crate::database::{DatabaseError, GameStore, ImageStore};

/// Hex characters of the scope hash appended to non-global names.
const SCOPE_SUFFIX_LEN: usize = 12;

/// Attempts at the insert-or-overwrite race before giving up.
const PUT_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Image name is required")]
    NameRequired,

    #[error("Image {0} belongs to another user")]
    NameTaken(String),

    #[error("Image not found")]
    NotFound,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Who is uploading. `owner` is `None` for operator imports.
#[derive(Debug, Clone, Copy)]
pub struct Uploader {
    pub owner: Option<Uuid>,
    pub admin: bool,
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub global: bool,
    pub game_id: Option<Uuid>,
    pub metadata: Option<Value>,
    pub image: NormalizedImage,
}

#[derive(Debug, Clone)]
pub struct PutOutcome {
    pub image: Image,
    pub created: bool,
}

/// Storage name for an upload.
///
/// Uses the supplied name, else the original filename. Non-global images get
/// a suffix hashed from `scope` (the game id, else the owner id) so equal names
/// in different games or accounts do not collide.
pub fn derive_name(
    supplied: Option<&str>,
    filename: Option<&str>,
    global: bool,
    scope: Option<Uuid>,
) -> Result<String, CatalogError> {
    let base = supplied
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| filename.map(str::trim).filter(|s| !s.is_empty()))
        .ok_or(CatalogError::NameRequired)?;

    match (global, scope) {
        (false, Some(scope)) => Ok(format!("{}_{}", base, scope_suffix(scope))),
        _ => Ok(base.to_string()),
    }
}

fn scope_suffix(scope: Uuid) -> String {
    let mut hasher = Sha256::new();
    hasher.update(scope.to_string().as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(SCOPE_SUFFIX_LEN);
    hex
}

/// Quoted cache validator derived from the last content change.
pub fn etag(updated_at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(updated_at.to_rfc3339_opts(SecondsFormat::Nanos, true).as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(32);
    format!("\"{}\"", hex)
}

/// True when an `If-None-Match` header value matches `etag` (weak comparison).
pub fn if_none_match(header: &str, etag: &str) -> bool {
    let strip = |tag: &str| tag.trim().trim_start_matches("W/").to_string();
    let wanted = strip(etag);
    header
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || strip(candidate) == wanted)
}

fn may_overwrite(existing: &Image, uploader: &Uploader) -> bool {
    uploader.admin || existing.owner_id.is_none() || existing.owner_id == uploader.owner
}

/// Create the image, or overwrite the record already holding its name.
///
/// The initial lookup is only a fast path; a unique violation on insert means
/// someone else won the race and the upload turns into an overwrite.
pub async fn put<S>(store: &S, uploader: Uploader, upload: Upload) -> Result<PutOutcome, CatalogError>
where
    S: ImageStore + ?Sized,
{
    let content = ImageContent {
        mime_type: upload.image.format.mime_type().to_string(),
        data: upload.image.data,
        width: upload.image.width.and_then(|w| i32::try_from(w).ok()),
        height: upload.image.height.and_then(|h| i32::try_from(h).ok()),
        metadata: upload.metadata,
    };

    for _ in 0..PUT_ATTEMPTS {
        if let Some(existing) = store.find_image_by_name(&upload.name).await? {
            return overwrite(store, existing, &uploader, content).await;
        }

        let new_image = NewImage {
            name: upload.name.clone(),
            global: upload.global,
            owner_id: uploader.owner,
            game_id: upload.game_id,
            content: content.clone(),
        };

        match store.insert_image(new_image).await {
            Ok(image) => {
                info!(image = %image.name, image_id = %image.id, "Image created");
                return Ok(PutOutcome { image, created: true });
            }
            Err(DatabaseError::UniqueViolation(_)) => {
                debug!(image = %upload.name, "Concurrent insert won, retrying as overwrite");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(CatalogError::NameTaken(upload.name))
}

async fn overwrite<S: ImageStore + ?Sized>(
    store: &S,
    existing: Image,
    uploader: &Uploader,
    content: ImageContent,
) -> Result<PutOutcome, CatalogError> {
    if !may_overwrite(&existing, uploader) {
        return Err(CatalogError::NameTaken(existing.name));
    }

    let image = store
        .overwrite_image(existing.id, content)
        .await?
        .ok_or(CatalogError::NotFound)?;

    info!(image = %image.name, image_id = %image.id, "Image overwritten");
    Ok(PutOutcome { image, created: false })
}

pub async fn get_by_name<S: ImageStore + ?Sized>(store: &S, name: &str) -> Result<Image, CatalogError> {
    store.find_image_by_name(name).await?.ok_or(CatalogError::NotFound)
}

/// Fetch by id if the requester may see it: global, owned, or in one of their games.
pub async fn get_visible<S>(store: &S, id: Uuid, requester: Uuid) -> Result<Image, CatalogError>
where
    S: ImageStore + GameStore + ?Sized,
{
    let image = store.find_image(id).await?.ok_or(CatalogError::NotFound)?;

    if image.global || image.owner_id == Some(requester) {
        return Ok(image);
    }

    if let Some(game_id) = image.game_id {
        if store.find_game(game_id, requester).await?.is_some() {
            return Ok(image);
        }
    }

    Err(CatalogError::NotFound)
}

/// Permanent delete. Allowed for the owner, or anyone when the image is ownerless.
pub async fn delete<S: ImageStore + ?Sized>(store: &S, id: Uuid, requester: Uuid) -> Result<(), CatalogError> {
    let image = store.find_image(id).await?.ok_or(CatalogError::NotFound)?;

    if image.owner_id.is_some() && image.owner_id != Some(requester) {
        return Err(CatalogError::NotFound);
    }

    if !store.delete_image(id).await? {
        return Err(CatalogError::NotFound);
    }

    info!(image = %image.name, image_id = %id, "Image deleted");
    Ok(())
}
