use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, prelude::FromRow};
use uuid::Uuid;

use crate::{
    model::{DatabaseResult, ModelManager, ResourceTyped},
    web::AuthenticatedUser,
};

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizAttempt {
    id: Uuid,
    user_id: Uuid,
    quiz_id: Uuid,
    score: i32,
    total: i32,
    passed: bool,
    created_at: DateTime<Utc>,
}

pub struct QuizAttemptCreate {
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    pub score: i32,
    pub total: i32,
    pub passed: bool,
}

impl ResourceTyped for QuizAttempt {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::QuizAttempt
    }
}

impl QuizAttempt {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn total(&self) -> i32 {
        self.total
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub async fn record(conn: &mut PgConnection, data: QuizAttemptCreate) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO quiz_attempts (id, user_id, quiz_id, score, total, passed)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.quiz_id)
        .bind(data.score)
        .bind(data.total)
        .bind(data.passed)
        .fetch_one(&mut *conn)
        .await?;

        Ok(row)
    }

    pub async fn all_for_quiz(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        quiz_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM quiz_attempts WHERE user_id = $1 AND quiz_id = $2 ORDER BY created_at DESC",
        )
        .bind(actor.user_id())
        .bind(quiz_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
