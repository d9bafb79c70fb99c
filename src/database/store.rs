//! Storage traits the auth middleware, image catalog and handlers talk to.
//!
//! Every implementation must enforce uniqueness of usernames, image names and
//! revoked tokens itself, and must report a duplicate as
//! [`DatabaseError::UniqueViolation`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{Cardset, Game, Image, ImageContent, ImageQuery, ImageSummary, NewImage, User};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, DatabaseError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    /// Returns the updated user, or `None` if no such username exists.
    async fn set_admin(&self, username: &str, admin: bool) -> Result<Option<User>, DatabaseError>;
}

/// Denylist of raw token strings.
#[async_trait]
pub trait RevocationLedger: Send + Sync {
    async fn is_revoked(&self, token: &str) -> Result<bool, DatabaseError>;

    /// Idempotent: revoking an already revoked token is a no-op.
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), DatabaseError>;

    /// Drops entries whose token would be rejected as expired anyway.
    async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError>;
}

/// Games and cardsets. Lookups taking an `owner_id` treat foreign records as absent.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn create_game(&self, owner_id: Uuid, name: &str) -> Result<Game, DatabaseError>;

    async fn list_games(&self, owner_id: Uuid) -> Result<Vec<Game>, DatabaseError>;

    async fn find_game(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Game>, DatabaseError>;

    async fn rename_game(&self, id: Uuid, owner_id: Uuid, name: &str) -> Result<bool, DatabaseError>;

    /// Also removes the game's cardsets and images.
    async fn delete_game(&self, id: Uuid, owner_id: Uuid) -> Result<bool, DatabaseError>;

    async fn create_cardset(
        &self,
        owner_id: Uuid,
        game_id: Uuid,
        name: &str,
        data: &Value,
    ) -> Result<Cardset, DatabaseError>;

    async fn list_cardsets(&self, game_id: Uuid) -> Result<Vec<Cardset>, DatabaseError>;

    async fn find_cardset(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Cardset>, DatabaseError>;

    async fn update_cardset(
        &self,
        id: Uuid,
        owner_id: Uuid,
        name: Option<&str>,
        data: Option<&Value>,
    ) -> Result<bool, DatabaseError>;

    async fn delete_cardset(&self, id: Uuid, owner_id: Uuid) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn find_image(&self, id: Uuid) -> Result<Option<Image>, DatabaseError>;

    async fn find_image_by_name(&self, name: &str) -> Result<Option<Image>, DatabaseError>;

    /// Fails with `UniqueViolation` when the name is taken.
    async fn insert_image(&self, image: NewImage) -> Result<Image, DatabaseError>;

    /// Replaces content and strictly advances `updated_at`.
    async fn overwrite_image(&self, id: Uuid, content: ImageContent) -> Result<Option<Image>, DatabaseError>;

    /// Ordered by name, capped at `query.limit`.
    async fn list_images(&self, query: &ImageQuery) -> Result<Vec<ImageSummary>, DatabaseError>;

    async fn delete_image(&self, id: Uuid) -> Result<bool, DatabaseError>;
}

/// Everything the server needs from persistence.
#[async_trait]
pub trait Store: UserStore + RevocationLedger + GameStore + ImageStore {
    async fn health_check(&self) -> Result<(), DatabaseError>;
}
