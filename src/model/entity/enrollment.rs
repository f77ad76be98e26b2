use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    model::{DatabaseResult, ModelManager, ResourceTyped, progression::ProgressStatus},
    web::AuthenticatedUser,
};

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Enrollment {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    enrolled_at: DateTime<Utc>,
}

impl ResourceTyped for Enrollment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Enrollment
    }
}

impl Enrollment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn enrolled_at(&self) -> &DateTime<Utc> {
        &self.enrolled_at
    }

    /// Enrolls the actor and opens an empty progress row. A second enrollment in the
    /// same course surfaces as a unique violation.
    pub async fn enroll(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.begin().await?;

        let enrollment: Enrollment = sqlx::query_as(
            "INSERT INTO enrollments (id, user_id, course_id) VALUES ($1,$2,$3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(course_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO course_progress (user_id, course_id, percentage, status)
            VALUES ($1, $2, 0, $3)
            ON CONFLICT (user_id, course_id) DO NOTHING
            "#,
        )
        .bind(actor.user_id())
        .bind(course_id)
        .bind(ProgressStatus::YetToStart.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(enrollment)
    }

    pub async fn exists(mm: &ModelManager, user_id: Uuid, course_id: Uuid) -> DatabaseResult<bool> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM enrollments WHERE user_id = $1 AND course_id = $2)",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(found)
    }
}

// Utils

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct EnrolledCourseRow {
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub level: String,
    pub instructor_name: String,
    pub enrolled_at: DateTime<Utc>,
    pub percentage: i32,
    pub status: String,
}

impl EnrolledCourseRow {
    pub async fn all_for(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                c.id AS course_id,
                c.title,
                c.description,
                c.category,
                c.level,
                COALESCE(NULLIF(u.full_name, ''), u.username) AS instructor_name,
                e.enrolled_at,
                COALESCE(cp.percentage, 0) AS percentage,
                COALESCE(cp.status, 'YET_TO_START') AS status
            FROM enrollments e
            JOIN courses c ON c.id = e.course_id
            JOIN users u ON u.id = c.instructor_id
            LEFT JOIN course_progress cp
                ON cp.course_id = e.course_id AND cp.user_id = e.user_id
            WHERE e.user_id = $1
            ORDER BY e.enrolled_at DESC
            "#,
        )
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}

/// A learner enrolled in some course, as seen by that course's instructor.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct CourseStudentRow {
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub enrolled_at: DateTime<Utc>,
    pub percentage: i32,
    pub status: String,
}

impl CourseStudentRow {
    pub async fn all_by_course(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                u.id AS user_id,
                u.username,
                u.full_name,
                u.email,
                e.enrolled_at,
                COALESCE(cp.percentage, 0) AS percentage,
                COALESCE(cp.status, 'YET_TO_START') AS status
            FROM enrollments e
            JOIN users u ON u.id = e.user_id
            LEFT JOIN course_progress cp
                ON cp.course_id = e.course_id AND cp.user_id = e.user_id
            WHERE e.course_id = $1
            ORDER BY e.enrolled_at
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
