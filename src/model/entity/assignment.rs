use crate::model::access::{HasOwner, course_owner};
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Assignment {
    id: Uuid,
    course_id: Uuid,
    title: String,
    description: String,
    due_at: Option<DateTime<Utc>>,
    max_score: i32,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AssignmentCreate {
    pub course_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_at: Option<DateTime<Utc>>,
    pub max_score: Option<i32>,
}

pub const DEFAULT_MAX_SCORE: i32 = 100;

impl ResourceTyped for Assignment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Assignment
    }
}

impl Assignment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn due_at(&self) -> Option<&DateTime<Utc>> {
        self.due_at.as_ref()
    }

    pub fn max_score(&self) -> i32 {
        self.max_score
    }
}

#[async_trait]
impl CrudRepository<Assignment, AssignmentCreate, uuid::Uuid> for Assignment {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AssignmentCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            r#"
            INSERT INTO assignments (id, course_id, title, description, due_at, max_score)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.due_at)
        .bind(data.max_score.unwrap_or(DEFAULT_MAX_SCORE))
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AssignmentCreate,
    ) -> DatabaseResult<Self> {
        let max_score = data.max_score.unwrap_or(self.max_score);
        sqlx::query(
            "UPDATE assignments SET title = $1, description = $2, due_at = $3, max_score = $4 WHERE id = $5",
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.due_at)
        .bind(max_score)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.title = data.title;
        self.description = data.description;
        self.due_at = data.due_at;
        self.max_score = max_score;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM assignments WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM assignments WHERE id = $1")
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
        let result =
            sqlx::query_as("SELECT * FROM assignments ORDER BY created_at LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assignments")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Assignment {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        course_owner(mm, self.course_id).await
    }
}

impl Assignment {
    pub async fn all_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM assignments WHERE course_id = $1 ORDER BY due_at NULLS LAST, created_at",
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}
