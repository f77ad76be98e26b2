use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, prelude::FromRow};
use uuid::Uuid;

use crate::model::{DatabaseResult, ModelManager, ResourceTyped};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointsReason {
    LessonCompleted,
    QuizPassed,
    CourseCompleted,
}

impl PointsReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LessonCompleted => "LESSON_COMPLETED",
            Self::QuizPassed => "QUIZ_PASSED",
            Self::CourseCompleted => "COURSE_COMPLETED",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct PointsEntry {
    id: Uuid,
    user_id: Uuid,
    points: i32,
    reason: String,
    reference_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for PointsEntry {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Points
    }
}

impl PointsEntry {
    pub fn points(&self) -> i32 {
        self.points
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn reference_id(&self) -> Option<Uuid> {
        self.reference_id
    }

    /// Awards once per `(user, reason, reference)`. Returns the points granted, zero on repeat.
    pub async fn award(
        conn: &mut PgConnection,
        user_id: Uuid,
        points: i32,
        reason: PointsReason,
        reference_id: Uuid,
    ) -> DatabaseResult<i32> {
        if points <= 0 {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO points_log (id, user_id, points, reason, reference_id)
            VALUES ($1,$2,$3,$4,$5)
            ON CONFLICT (user_id, reason, reference_id) WHERE reference_id IS NOT NULL
            DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(points)
        .bind(reason.as_str())
        .bind(reference_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 1 {
            tracing::debug!("awarded {} points to {} for {}", points, user_id, reason.as_str());
            Ok(points)
        } else {
            Ok(0)
        }
    }

    pub async fn total_for(mm: &ModelManager, user_id: Uuid) -> DatabaseResult<i64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(points), 0)::bigint FROM points_log WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(mm.executor())
                .await?;
        Ok(total)
    }

    pub async fn history(
        mm: &ModelManager,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM points_log WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }

    pub async fn count_for(mm: &ModelManager, user_id: Uuid) -> DatabaseResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM points_log WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(mm.executor())
            .await?;
        Ok(count)
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct LeaderboardRow {
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub points: i64,
}

impl LeaderboardRow {
    pub async fn top(mm: &ModelManager, limit: i64) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT u.id AS user_id, u.username, u.full_name, SUM(p.points)::bigint AS points
            FROM points_log p
            JOIN users u ON u.id = p.user_id
            WHERE u.role = 'learner'
            GROUP BY u.id
            ORDER BY points DESC, u.username
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
