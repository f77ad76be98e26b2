use crate::model::access::{HasOwner, course_owner};
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

pub const MAX_SESSION_MINUTES: i32 = 600;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct LiveSession {
    id: Uuid,
    course_id: Uuid,
    instructor_id: Uuid,
    title: String,
    description: String,
    starts_at: DateTime<Utc>,
    duration_minutes: i32,
    meeting_url: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LiveSessionCreate {
    pub course_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i32,
    #[serde(default)]
    pub meeting_url: String,
}

impl LiveSessionCreate {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("session title must not be empty".to_string());
        }
        if self.starts_at <= now {
            return Err("session must start in the future".to_string());
        }
        if !(1..=MAX_SESSION_MINUTES).contains(&self.duration_minutes) {
            return Err(format!(
                "duration_minutes must be between 1 and {}",
                MAX_SESSION_MINUTES
            ));
        }
        Ok(())
    }
}

impl ResourceTyped for LiveSession {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::LiveSession
    }
}

impl LiveSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn instructor_id(&self) -> Uuid {
        self.instructor_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn starts_at(&self) -> &DateTime<Utc> {
        &self.starts_at
    }

    pub fn duration_minutes(&self) -> i32 {
        self.duration_minutes
    }
}

#[async_trait]
impl CrudRepository<LiveSession, LiveSessionCreate, uuid::Uuid> for LiveSession {
    /// The session is hosted by the course instructor, even when an admin schedules it.
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LiveSessionCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            r#"
            INSERT INTO live_sessions
                (id, course_id, instructor_id, title, description, starts_at, duration_minutes, meeting_url)
            VALUES ($1, $2, (SELECT instructor_id FROM courses WHERE id = $2), $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.starts_at)
        .bind(data.duration_minutes)
        .bind(&data.meeting_url)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LiveSessionCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query(
            r#"
            UPDATE live_sessions
            SET title = $1, description = $2, starts_at = $3, duration_minutes = $4, meeting_url = $5
            WHERE id = $6
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.starts_at)
        .bind(data.duration_minutes)
        .bind(&data.meeting_url)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.title = data.title;
        self.description = data.description;
        self.starts_at = data.starts_at;
        self.duration_minutes = data.duration_minutes;
        self.meeting_url = data.meeting_url;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM live_sessions WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM live_sessions WHERE id = $1")
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
            sqlx::query_as("SELECT * FROM live_sessions ORDER BY starts_at LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM live_sessions")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

#[async_trait]
impl HasOwner for LiveSession {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        course_owner(mm, self.course_id).await
    }
}

impl LiveSession {
    pub async fn all_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM live_sessions WHERE course_id = $1 ORDER BY starts_at")
                .bind(course_id)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    /// Sessions not yet over, in courses the actor attends or teaches.
    pub async fn upcoming_for(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT ls.*
            FROM live_sessions ls
            WHERE ls.starts_at + make_interval(mins => ls.duration_minutes) > now()
            AND (
                ls.instructor_id = $1
                OR EXISTS (
                    SELECT 1 FROM enrollments e
                    WHERE e.course_id = ls.course_id AND e.user_id = $1
                )
            )
            ORDER BY ls.starts_at
            "#,
        )
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use chrono::Duration;

    use super::*;

    fn session(starts_in: Duration, minutes: i32) -> LiveSessionCreate {
        LiveSessionCreate {
            course_id: Uuid::new_v4(),
            title: "Office hours".to_string(),
            description: String::new(),
            starts_at: Utc::now() + starts_in,
            duration_minutes: minutes,
            meeting_url: String::new(),
        }
    }

    #[test]
    fn future_session_is_valid() {
        assert!(session(Duration::hours(1), 45).validate(Utc::now()).is_ok());
    }

    #[test]
    fn past_session_is_rejected() {
        let err = session(Duration::hours(-1), 45).validate(Utc::now()).unwrap_err();
        assert!(err.contains("future"));
    }

    #[test]
    fn duration_is_bounded() {
        assert!(session(Duration::hours(1), 0).validate(Utc::now()).is_err());
        assert!(session(Duration::hours(1), MAX_SESSION_MINUTES + 1).validate(Utc::now()).is_err());
        assert!(session(Duration::hours(1), MAX_SESSION_MINUTES).validate(Utc::now()).is_ok());
    }
}
