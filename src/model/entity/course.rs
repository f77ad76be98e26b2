use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Course {
    id: Uuid,
    instructor_id: Uuid,
    title: String,
    description: String,
    category: String,
    level: String,
    is_published: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    pub level: Option<String>,
    pub is_published: Option<bool>,
}

impl ResourceTyped for Course {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Course
    }
}

impl Course {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn instructor_id(&self) -> Uuid {
        self.instructor_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }
}

#[async_trait]
impl CrudRepository<Course, CourseCreate, uuid::Uuid> for Course {
    /// The acting user becomes the instructor.
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            r#"
            INSERT INTO courses (id, instructor_id, title, description, category, level, is_published)
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.category.as_deref().unwrap_or("general"))
        .bind(data.level.as_deref().unwrap_or("beginner"))
        .bind(data.is_published.unwrap_or(false))
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let category = data.category.unwrap_or(self.category);
        let level = data.level.unwrap_or(self.level);
        let is_published = data.is_published.unwrap_or(self.is_published);

        sqlx::query(
            "UPDATE courses SET title = $1, description = $2, category = $3, level = $4, is_published = $5 WHERE id = $6",
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(&category)
        .bind(&level)
        .bind(is_published)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.title = data.title;
        self.description = data.description;
        self.category = category;
        self.level = level;
        self.is_published = is_published;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM courses WHERE id = $1")
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
            sqlx::query_as("SELECT * FROM courses ORDER BY created_at DESC LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Course, CourseCreate, Uuid);

#[async_trait]
impl HasOwner for Course {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.instructor_id)
    }
}

impl Course {
    pub async fn all_by_instructor(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        instructor_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM courses WHERE instructor_id = $1 ORDER BY created_at DESC",
        )
        .bind(instructor_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}

// Utils

/// Catalog entry as shown to anonymous visitors.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct CourseSummaryRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub level: String,
    pub instructor_id: Uuid,
    pub instructor_name: String,
    pub lesson_count: i64,
    pub review_count: i64,
    pub average_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl CourseSummaryRow {
    const SELECT: &'static str = r#"
        SELECT
            c.id,
            c.title,
            c.description,
            c.category,
            c.level,
            c.instructor_id,
            COALESCE(NULLIF(u.full_name, ''), u.username) AS instructor_name,
            (SELECT COUNT(*) FROM lessons l WHERE l.course_id = c.id) AS lesson_count,
            (SELECT COUNT(*) FROM reviews r WHERE r.course_id = c.id) AS review_count,
            (SELECT AVG(r.rating)::float8 FROM reviews r WHERE r.course_id = c.id) AS average_rating,
            c.created_at
        FROM courses c
        JOIN users u ON u.id = c.instructor_id
        WHERE c.is_published
    "#;

    pub async fn fetch_published(
        mm: &ModelManager,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let sql = format!(
            "{} AND ($1::text IS NULL OR c.category = $1) ORDER BY c.created_at DESC LIMIT $2 OFFSET $3",
            Self::SELECT
        );
        let rows = sqlx::query_as(&sql)
            .bind(category)
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(rows)
    }

    pub async fn count_published(mm: &ModelManager, category: Option<&str>) -> DatabaseResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM courses WHERE is_published AND ($1::text IS NULL OR category = $1)",
        )
        .bind(category)
        .fetch_one(mm.executor())
        .await?;
        Ok(count)
    }

    pub async fn find_published(mm: &ModelManager, id: Uuid) -> DatabaseResult<Option<Self>> {
        let sql = format!("{} AND c.id = $1", Self::SELECT);
        let row = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(row)
    }
}
