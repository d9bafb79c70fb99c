use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Full image record including its content.
#[derive(Debug, Clone, FromRow)]
pub struct Image {
    pub id: Uuid,
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub global: bool,
    pub owner_id: Option<Uuid>,
    pub game_id: Option<Uuid>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Image {
    pub fn summary(&self) -> ImageSummary {
        ImageSummary {
            id: self.id,
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            global: self.global,
            owner_id: self.owner_id,
            game_id: self.game_id,
            width: self.width,
            height: self.height,
            metadata: self.metadata.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Image metadata as returned by listings; content excluded.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub global: bool,
    pub owner_id: Option<Uuid>,
    pub game_id: Option<Uuid>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub metadata: Option<Value>,
    pub updated_at: DateTime<Utc>,
}

/// Everything an overwrite replaces. Identity, owner, scope and visibility stay.
#[derive(Debug, Clone)]
pub struct ImageContent {
    pub mime_type: String,
    pub data: Vec<u8>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub name: String,
    pub global: bool,
    pub owner_id: Option<Uuid>,
    pub game_id: Option<Uuid>,
    pub content: ImageContent,
}

/// Which images a listing may return for a requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageScope {
    /// Global images plus the requester's own.
    GlobalAndOwned { requester: Uuid },
    /// Only images owned by the requester.
    Owned { requester: Uuid },
    /// Images attached to one game. Owners of the game see all of them,
    /// everyone else only the global ones and their own.
    Game {
        game_id: Uuid,
        requester: Uuid,
        owns_game: bool,
    },
}

impl ImageScope {
    /// The visibility rule, evaluated against one record.
    pub fn admits(&self, image: &Image) -> bool {
        match *self {
            ImageScope::GlobalAndOwned { requester } => image.global || image.owner_id == Some(requester),
            ImageScope::Owned { requester } => image.owner_id == Some(requester),
            ImageScope::Game {
                game_id,
                requester,
                owns_game,
            } => {
                image.game_id == Some(game_id)
                    && (owns_game || image.global || image.owner_id == Some(requester))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageQuery {
    pub name_contains: Option<String>,
    pub scope: ImageScope,
    pub limit: i64,
}
