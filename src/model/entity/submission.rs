use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    model::{DatabaseResult, HasOwner, ModelManager, ResourceTyped},
    web::AuthenticatedUser,
};

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Submission {
    id: Uuid,
    assignment_id: Uuid,
    user_id: Uuid,
    content: String,
    grade: Option<i32>,
    feedback: Option<String>,
    submitted_at: DateTime<Utc>,
    graded_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for Submission {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Submission
    }
}

impl Submission {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn assignment_id(&self) -> Uuid {
        self.assignment_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn grade(&self) -> Option<i32> {
        self.grade
    }

    pub fn is_graded(&self) -> bool {
        self.grade.is_some()
    }

    /// Creates or replaces the actor's submission. `None` once it has been graded.
    pub async fn submit(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        assignment_id: Uuid,
        content: &str,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO submissions (id, assignment_id, user_id, content)
            VALUES ($1,$2,$3,$4)
            ON CONFLICT (assignment_id, user_id) DO UPDATE
                SET content = EXCLUDED.content, submitted_at = now()
                WHERE submissions.grade IS NULL
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(assignment_id)
        .bind(actor.user_id())
        .bind(content)
        .fetch_optional(mm.executor())
        .await?;
        Ok(row)
    }

    pub async fn grade_with(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        grade: i32,
        feedback: Option<String>,
    ) -> DatabaseResult<Self> {
        let graded_at: DateTime<Utc> = sqlx::query_scalar(
            "UPDATE submissions SET grade = $1, feedback = $2, graded_at = now() WHERE id = $3 RETURNING graded_at",
        )
        .bind(grade)
        .bind(&feedback)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        self.grade = Some(grade);
        self.feedback = feedback;
        self.graded_at = Some(graded_at);
        Ok(self)
    }

    pub async fn find_by_id(mm: &ModelManager, id: Uuid) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as("SELECT * FROM submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(row)
    }
}

#[async_trait]
impl HasOwner for Submission {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}

// Utils

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct SubmissionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub content: String,
    pub grade: Option<i32>,
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionRow {
    pub async fn all_by_assignment(
        mm: &ModelManager,
        assignment_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT s.id, s.user_id, u.username, s.content, s.grade, s.feedback, s.submitted_at
            FROM submissions s
            JOIN users u ON u.id = s.user_id
            WHERE s.assignment_id = $1
            ORDER BY s.submitted_at
            "#,
        )
        .bind(assignment_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
