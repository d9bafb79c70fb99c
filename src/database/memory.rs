use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{Cardset, Game, Image, ImageContent, ImageQuery, ImageSummary, NewImage, User};
use super::store::{GameStore, ImageStore, RevocationLedger, Store, UserStore};

/// Process-local store with the same uniqueness rules as the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    revoked: HashMap<String, DateTime<Utc>>,
    games: HashMap<Uuid, Game>,
    cardsets: HashMap<Uuid, Cardset>,
    images: HashMap<Uuid, Image>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Wall clock, but never at or before `previous`.
fn advance(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous + Duration::microseconds(1))
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, DatabaseError> {
        let mut tables = self.inner.write().await;
        if tables.users.values().any(|u| u.username == username) {
            return Err(DatabaseError::UniqueViolation("users_username_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            admin: false,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.inner.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn set_admin(&self, username: &str, admin: bool) -> Result<Option<User>, DatabaseError> {
        let mut tables = self.inner.write().await;
        let Some(user) = tables.users.values_mut().find(|u| u.username == username) else {
            return Ok(None);
        };
        user.admin = admin;
        user.updated_at = advance(user.updated_at);
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl RevocationLedger for MemoryStore {
    async fn is_revoked(&self, token: &str) -> Result<bool, DatabaseError> {
        Ok(self.inner.read().await.revoked.contains_key(token))
    }

    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), DatabaseError> {
        let mut tables = self.inner.write().await;
        tables.revoked.entry(token.to_string()).or_insert(expires_at);
        Ok(())
    }

    async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let mut tables = self.inner.write().await;
        let before = tables.revoked.len();
        tables.revoked.retain(|_, expires_at| *expires_at > now);
        Ok((before - tables.revoked.len()) as u64)
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn create_game(&self, owner_id: Uuid, name: &str) -> Result<Game, DatabaseError> {
        let now = Utc::now();
        let game = Game {
            id: Uuid::new_v4(),
            name: name.to_string(),
            owner_id,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.games.insert(game.id, game.clone());
        Ok(game)
    }

    async fn list_games(&self, owner_id: Uuid) -> Result<Vec<Game>, DatabaseError> {
        let tables = self.inner.read().await;
        let mut games: Vec<Game> = tables.games.values().filter(|g| g.owner_id == owner_id).cloned().collect();
        games.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(games)
    }

    async fn find_game(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Game>, DatabaseError> {
        let tables = self.inner.read().await;
        Ok(tables.games.get(&id).filter(|g| g.owner_id == owner_id).cloned())
    }

    async fn rename_game(&self, id: Uuid, owner_id: Uuid, name: &str) -> Result<bool, DatabaseError> {
        let mut tables = self.inner.write().await;
        match tables.games.get_mut(&id).filter(|g| g.owner_id == owner_id) {
            Some(game) => {
                game.name = name.to_string();
                game.updated_at = advance(game.updated_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_game(&self, id: Uuid, owner_id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.inner.write().await;
        if !tables.games.get(&id).is_some_and(|g| g.owner_id == owner_id) {
            return Ok(false);
        }
        tables.games.remove(&id);
        tables.cardsets.retain(|_, c| c.game_id != id);
        tables.images.retain(|_, i| i.game_id != Some(id));
        Ok(true)
    }

    async fn create_cardset(
        &self,
        owner_id: Uuid,
        game_id: Uuid,
        name: &str,
        data: &Value,
    ) -> Result<Cardset, DatabaseError> {
        let now = Utc::now();
        let cardset = Cardset {
            id: Uuid::new_v4(),
            name: name.to_string(),
            data: data.clone(),
            game_id,
            owner_id,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.cardsets.insert(cardset.id, cardset.clone());
        Ok(cardset)
    }

    async fn list_cardsets(&self, game_id: Uuid) -> Result<Vec<Cardset>, DatabaseError> {
        let tables = self.inner.read().await;
        let mut cardsets: Vec<Cardset> = tables.cardsets.values().filter(|c| c.game_id == game_id).cloned().collect();
        cardsets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(cardsets)
    }

    async fn find_cardset(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Cardset>, DatabaseError> {
        let tables = self.inner.read().await;
        Ok(tables.cardsets.get(&id).filter(|c| c.owner_id == owner_id).cloned())
    }

    async fn update_cardset(
        &self,
        id: Uuid,
        owner_id: Uuid,
        name: Option<&str>,
        data: Option<&Value>,
    ) -> Result<bool, DatabaseError> {
        let mut tables = self.inner.write().await;
        let Some(cardset) = tables.cardsets.get_mut(&id).filter(|c| c.owner_id == owner_id) else {
            return Ok(false);
        };
        if let Some(name) = name {
            cardset.name = name.to_string();
        }
        if let Some(data) = data {
            cardset.data = data.clone();
        }
        cardset.updated_at = advance(cardset.updated_at);
        Ok(true)
    }

    async fn delete_cardset(&self, id: Uuid, owner_id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.inner.write().await;
        if !tables.cardsets.get(&id).is_some_and(|c| c.owner_id == owner_id) {
            return Ok(false);
        }
        tables.cardsets.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl ImageStore for MemoryStore {
    async fn find_image(&self, id: Uuid) -> Result<Option<Image>, DatabaseError> {
        Ok(self.inner.read().await.images.get(&id).cloned())
    }

    async fn find_image_by_name(&self, name: &str) -> Result<Option<Image>, DatabaseError> {
        let tables = self.inner.read().await;
        Ok(tables.images.values().find(|i| i.name == name).cloned())
    }

    async fn insert_image(&self, image: NewImage) -> Result<Image, DatabaseError> {
        let mut tables = self.inner.write().await;
        if tables.images.values().any(|i| i.name == image.name) {
            return Err(DatabaseError::UniqueViolation("images_name_key".to_string()));
        }

        let now = Utc::now();
        let image = Image {
            id: Uuid::new_v4(),
            name: image.name,
            mime_type: image.content.mime_type,
            data: image.content.data,
            global: image.global,
            owner_id: image.owner_id,
            game_id: image.game_id,
            width: image.content.width,
            height: image.content.height,
            metadata: image.content.metadata,
            created_at: now,
            updated_at: now,
        };
        tables.images.insert(image.id, image.clone());
        Ok(image)
    }

    async fn overwrite_image(&self, id: Uuid, content: ImageContent) -> Result<Option<Image>, DatabaseError> {
        let mut tables = self.inner.write().await;
        let Some(image) = tables.images.get_mut(&id) else {
            return Ok(None);
        };
        image.mime_type = content.mime_type;
        image.data = content.data;
        image.width = content.width;
        image.height = content.height;
        image.metadata = content.metadata;
        image.updated_at = advance(image.updated_at);
        Ok(Some(image.clone()))
    }

    async fn list_images(&self, query: &ImageQuery) -> Result<Vec<ImageSummary>, DatabaseError> {
        let tables = self.inner.read().await;
        let mut images: Vec<ImageSummary> = tables
            .images
            .values()
            .filter(|i| query.scope.admits(i))
            .filter(|i| match &query.name_contains {
                Some(needle) => i.name.contains(needle.as_str()),
                None => true,
            })
            .map(Image::summary)
            .collect();
        images.sort_by(|a, b| a.name.cmp(&b.name));
        images.truncate(query.limit.max(0) as usize);
        Ok(images)
    }

    async fn delete_image(&self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.inner.write().await.images.remove(&id).is_some())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::ImageScope;

    fn content(bytes: &[u8]) -> ImageContent {
        ImageContent {
            mime_type: "image/png".to_string(),
            data: bytes.to_vec(),
            width: Some(1),
            height: Some(1),
            metadata: None,
        }
    }

    fn new_image(name: &str, owner_id: Option<Uuid>, global: bool) -> NewImage {
        NewImage {
            name: name.to_string(),
            global,
            owner_id,
            game_id: None,
            content: content(b"a"),
        }
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let store = MemoryStore::new();
        store.create_user("alice", "hash").await.unwrap();
        let err = store.create_user("alice", "other").await.unwrap_err();
        assert!(matches!(err, DatabaseError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn revoke_is_idempotent_and_prunable() {
        let store = MemoryStore::new();
        let past = Utc::now() - Duration::hours(1);
        let future = Utc::now() + Duration::hours(1);

        store.revoke("old", past).await.unwrap();
        store.revoke("old", past).await.unwrap();
        store.revoke("fresh", future).await.unwrap();
        assert!(store.is_revoked("old").await.unwrap());
        assert!(!store.is_revoked("olde").await.unwrap());

        assert_eq!(store.prune_expired(Utc::now()).await.unwrap(), 1);
        assert!(!store.is_revoked("old").await.unwrap());
        assert!(store.is_revoked("fresh").await.unwrap());
    }

    #[tokio::test]
    async fn image_names_are_unique_and_overwrite_advances_timestamp() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let first = store.insert_image(new_image("logo", Some(owner), false)).await.unwrap();

        let err = store.insert_image(new_image("logo", None, true)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::UniqueViolation(_)));

        let second = store.overwrite_image(first.id, content(b"b")).await.unwrap().unwrap();
        let third = store.overwrite_image(first.id, content(b"c")).await.unwrap().unwrap();
        assert_eq!(second.id, first.id);
        assert!(second.updated_at > first.updated_at);
        assert!(third.updated_at > second.updated_at);
        assert_eq!(third.data, b"c");
    }

    #[tokio::test]
    async fn listing_respects_scope_and_name_filter() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.insert_image(new_image("b-alice", Some(alice), false)).await.unwrap();
        store.insert_image(new_image("a-shared", None, true)).await.unwrap();
        store.insert_image(new_image("c-bob", Some(bob), false)).await.unwrap();

        let query = |scope, name: Option<&str>| ImageQuery {
            name_contains: name.map(str::to_string),
            scope,
            limit: 100,
        };

        let names = |images: Vec<ImageSummary>| images.into_iter().map(|i| i.name).collect::<Vec<_>>();

        let visible = store
            .list_images(&query(ImageScope::GlobalAndOwned { requester: alice }, None))
            .await
            .unwrap();
        assert_eq!(names(visible), vec!["a-shared", "b-alice"]);

        let mine = store.list_images(&query(ImageScope::Owned { requester: bob }, None)).await.unwrap();
        assert_eq!(names(mine), vec!["c-bob"]);

        let filtered = store
            .list_images(&query(ImageScope::GlobalAndOwned { requester: bob }, Some("alice")))
            .await
            .unwrap();
        assert!(filtered.is_empty());
    }

    #[tokio::test]
    async fn deleting_a_game_removes_its_images_and_cardsets() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let game = store.create_game(owner, "Chess").await.unwrap();
        store.create_cardset(owner, game.id, "pieces", &serde_json::json!([])).await.unwrap();

        let mut image = new_image("board", Some(owner), false);
        image.game_id = Some(game.id);
        let image = store.insert_image(image).await.unwrap();

        assert!(!store.delete_game(game.id, Uuid::new_v4()).await.unwrap());
        assert!(store.delete_game(game.id, owner).await.unwrap());
        assert!(store.find_image(image.id).await.unwrap().is_none());
        assert!(store.list_cardsets(game.id).await.unwrap().is_empty());
    }
}
