use crate::model::progression::BadgeTier;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Badge {
    id: Uuid,
    name: String,
    description: String,
    min_points: i32,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct BadgeCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub min_points: i32,
}

impl ResourceTyped for Badge {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Badge
    }
}

impl Badge {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn min_points(&self) -> i32 {
        self.min_points
    }

    pub fn tier(&self) -> BadgeTier {
        BadgeTier::new(self.name.clone(), i64::from(self.min_points))
    }
}

#[async_trait]
impl CrudRepository<Badge, BadgeCreate, uuid::Uuid> for Badge {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: BadgeCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "INSERT INTO badges (id, name, description, min_points) VALUES ($1,$2,$3,$4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.min_points)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: BadgeCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE badges SET name = $1, description = $2, min_points = $3 WHERE id = $4")
            .bind(&data.name)
            .bind(&data.description)
            .bind(data.min_points)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.name = data.name;
        self.description = data.description;
        self.min_points = data.min_points;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM badges WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM badges WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM badges ORDER BY min_points LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM badges")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Badge {
    /// Every badge, ascending by threshold.
    pub async fn all(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM badges ORDER BY min_points")
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }
}
