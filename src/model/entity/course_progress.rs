use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, prelude::FromRow};
use uuid::Uuid;

use crate::{
    config::Points,
    model::{
        DatabaseResult, ModelManager, ResourceTyped,
        entity::{PointsEntry, PointsReason},
        progression::{ProgressStatus, completion_percentage},
    },
    web::AuthenticatedUser,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct CourseProgress {
    user_id: Uuid,
    course_id: Uuid,
    percentage: i32,
    status: String,
    updated_at: DateTime<Utc>,
}

/// Result of marking a lesson done.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LessonCompletion {
    pub progress: CourseProgress,
    pub newly_completed: bool,
    pub points_awarded: i32,
}

impl ResourceTyped for CourseProgress {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::CourseProgress
    }
}

impl CourseProgress {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn percentage(&self) -> i32 {
        self.percentage
    }

    pub fn status(&self) -> ProgressStatus {
        ProgressStatus::from(self.status.as_str())
    }

    pub fn is_completed(&self) -> bool {
        self.status() == ProgressStatus::Completed
    }

    pub async fn find(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as("SELECT * FROM course_progress WHERE user_id = $1 AND course_id = $2")
            .bind(actor.user_id())
            .bind(course_id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(row)
    }

    /// Records the lesson as done for the actor and refreshes the course percentage.
    ///
    /// Repeated calls are harmless: the completion row is kept once, the percentage only
    /// ever grows, and each points reason is granted once per reference.
    pub async fn complete_lesson(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
        lesson_id: Uuid,
        points: Points,
    ) -> DatabaseResult<LessonCompletion> {
        let user_id = actor.user_id();
        let mut tx = mm.begin().await?;

        // Completions of one (user, course) run one at a time, so each recount sees the others.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text || ':' || $2::text, 0))")
            .bind(user_id)
            .bind(course_id)
            .execute(&mut *tx)
            .await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO lesson_completions (user_id, lesson_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, lesson_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(lesson_id)
        .execute(&mut *tx)
        .await?;
        let newly_completed = inserted.rows_affected() == 1;

        let progress = Self::recompute(&mut tx, user_id, course_id).await?;

        let mut points_awarded = 0;
        if newly_completed {
            points_awarded += PointsEntry::award(
                &mut tx,
                user_id,
                points.lesson_completed(),
                PointsReason::LessonCompleted,
                lesson_id,
            )
            .await?;
        }
        if progress.is_completed() {
            points_awarded += PointsEntry::award(
                &mut tx,
                user_id,
                points.course_completed(),
                PointsReason::CourseCompleted,
                course_id,
            )
            .await?;
        }

        tx.commit().await?;

        Ok(LessonCompletion {
            progress,
            newly_completed,
            points_awarded,
        })
    }

    async fn recompute(
        conn: &mut PgConnection,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Self> {
        let (total, completed): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(lc.lesson_id) AS completed
            FROM lessons l
            LEFT JOIN lesson_completions lc
                ON lc.lesson_id = l.id AND lc.user_id = $2
            WHERE l.course_id = $1
            "#,
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        let percentage = completion_percentage(completed, total);
        let row = sqlx::query_as(
            r#"
            INSERT INTO course_progress (user_id, course_id, percentage, status, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (user_id, course_id) DO UPDATE SET
                percentage = GREATEST(course_progress.percentage, EXCLUDED.percentage),
                status = CASE
                    WHEN GREATEST(course_progress.percentage, EXCLUDED.percentage) >= 100 THEN 'COMPLETED'
                    WHEN GREATEST(course_progress.percentage, EXCLUDED.percentage) > 0 THEN 'IN_PROGRESS'
                    ELSE 'YET_TO_START'
                END,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(percentage)
        .bind(ProgressStatus::from_percentage(percentage).as_str())
        .fetch_one(&mut *conn)
        .await?;

        Ok(row)
    }
}
