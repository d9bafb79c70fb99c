use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{
    Cardset, Game, Image, ImageContent, ImageQuery, ImageScope, ImageSummary, NewImage, User,
};
use super::store::{GameStore, ImageStore, RevocationLedger, Store, UserStore};

const IMAGE_SUMMARY_COLUMNS: &str =
    "id, name, mime_type, global, owner_id, game_id, width, height, metadata, updated_at";

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn set_admin(&self, username: &str, admin: bool) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET admin = $2, updated_at = now() WHERE username = $1 RETURNING *",
        )
        .bind(username)
        .bind(admin)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl RevocationLedger for PgStore {
    async fn is_revoked(&self, token: &str) -> Result<bool, DatabaseError> {
        let revoked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE token = $1)",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await?;
        Ok(revoked)
    }

    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO revoked_tokens (token, expires_at) VALUES ($1, $2) ON CONFLICT (token) DO NOTHING",
        )
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl GameStore for PgStore {
    async fn create_game(&self, owner_id: Uuid, name: &str) -> Result<Game, DatabaseError> {
        let game = sqlx::query_as::<_, Game>(
            "INSERT INTO games (id, name, owner_id) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(game)
    }

    async fn list_games(&self, owner_id: Uuid) -> Result<Vec<Game>, DatabaseError> {
        let games = sqlx::query_as::<_, Game>(
            "SELECT * FROM games WHERE owner_id = $1 ORDER BY created_at, id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(games)
    }

    async fn find_game(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Game>, DatabaseError> {
        let game = sqlx::query_as::<_, Game>("SELECT * FROM games WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(game)
    }

    async fn rename_game(&self, id: Uuid, owner_id: Uuid, name: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE games SET name = $3, updated_at = now() WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_game(&self, id: Uuid, owner_id: Uuid) -> Result<bool, DatabaseError> {
        // cardsets and images follow via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM games WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_cardset(
        &self,
        owner_id: Uuid,
        game_id: Uuid,
        name: &str,
        data: &Value,
    ) -> Result<Cardset, DatabaseError> {
        let cardset = sqlx::query_as::<_, Cardset>(
            "INSERT INTO cardsets (id, name, data, game_id, owner_id) VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(data.clone())
        .bind(game_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(cardset)
    }

    async fn list_cardsets(&self, game_id: Uuid) -> Result<Vec<Cardset>, DatabaseError> {
        let cardsets = sqlx::query_as::<_, Cardset>(
            "SELECT * FROM cardsets WHERE game_id = $1 ORDER BY created_at, id",
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(cardsets)
    }

    async fn find_cardset(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Cardset>, DatabaseError> {
        let cardset = sqlx::query_as::<_, Cardset>(
            "SELECT * FROM cardsets WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(cardset)
    }

    async fn update_cardset(
        &self,
        id: Uuid,
        owner_id: Uuid,
        name: Option<&str>,
        data: Option<&Value>,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE cardsets SET name = COALESCE($3, name), data = COALESCE($4, data), updated_at = now() \
             WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .bind(name)
        .bind(data.cloned())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_cardset(&self, id: Uuid, owner_id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM cardsets WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ImageStore for PgStore {
    async fn find_image(&self, id: Uuid) -> Result<Option<Image>, DatabaseError> {
        let image = sqlx::query_as::<_, Image>("SELECT * FROM images WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(image)
    }

    async fn find_image_by_name(&self, name: &str) -> Result<Option<Image>, DatabaseError> {
        let image = sqlx::query_as::<_, Image>("SELECT * FROM images WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(image)
    }

    async fn insert_image(&self, image: NewImage) -> Result<Image, DatabaseError> {
        let NewImage {
            name,
            global,
            owner_id,
            game_id,
            content,
        } = image;

        let image = sqlx::query_as::<_, Image>(
            "INSERT INTO images (id, name, mime_type, data, global, owner_id, game_id, width, height, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(content.mime_type)
        .bind(content.data)
        .bind(global)
        .bind(owner_id)
        .bind(game_id)
        .bind(content.width)
        .bind(content.height)
        .bind(content.metadata)
        .fetch_one(&self.pool)
        .await?;
        Ok(image)
    }

    async fn overwrite_image(&self, id: Uuid, content: ImageContent) -> Result<Option<Image>, DatabaseError> {
        // updated_at must move even when two writes land in the same clock tick
        let image = sqlx::query_as::<_, Image>(
            "UPDATE images SET mime_type = $2, data = $3, width = $4, height = $5, metadata = $6, \
             updated_at = GREATEST(clock_timestamp(), updated_at + interval '1 microsecond') \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(content.mime_type)
        .bind(content.data)
        .bind(content.width)
        .bind(content.height)
        .bind(content.metadata)
        .fetch_optional(&self.pool)
        .await?;
        Ok(image)
    }

    async fn list_images(&self, query: &ImageQuery) -> Result<Vec<ImageSummary>, DatabaseError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(IMAGE_SUMMARY_COLUMNS).push(" FROM images WHERE ");

        match query.scope {
            ImageScope::GlobalAndOwned { requester } => {
                qb.push("(global OR owner_id = ").push_bind(requester).push(")");
            }
            ImageScope::Owned { requester } => {
                qb.push("owner_id = ").push_bind(requester);
            }
            ImageScope::Game {
                game_id,
                requester,
                owns_game,
            } => {
                qb.push("game_id = ").push_bind(game_id);
                if !owns_game {
                    qb.push(" AND (global OR owner_id = ").push_bind(requester).push(")");
                }
            }
        }

        if let Some(name) = &query.name_contains {
            qb.push(" AND strpos(name, ").push_bind(name.clone()).push(") > 0");
        }

        qb.push(" ORDER BY name LIMIT ").push_bind(query.limit);

        let images = qb
            .build_query_as::<ImageSummary>()
            .fetch_all(&self.pool)
            .await?;
        Ok(images)
    }

    async fn delete_image(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
