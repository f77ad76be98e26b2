use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    model::{DatabaseResult, ModelManager, ResourceTyped},
    web::AuthenticatedUser,
};

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Review {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    rating: i32,
    comment: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ReviewCreate {
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

impl ReviewCreate {
    pub fn is_valid_rating(&self) -> bool {
        (1..=5).contains(&self.rating)
    }
}

impl ResourceTyped for Review {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Review
    }
}

impl Review {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn rating(&self) -> i32 {
        self.rating
    }

    /// One review per user per course, a second one is a unique violation.
    pub async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
        data: ReviewCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO reviews (id, user_id, course_id, rating, comment)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(course_id)
        .bind(data.rating)
        .bind(&data.comment)
        .fetch_one(mm.executor())
        .await?;
        Ok(row)
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct ReviewRow {
    pub id: Uuid,
    pub username: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl ReviewRow {
    pub async fn all_by_course(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT r.id, u.username, r.rating, r.comment, r.created_at
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.course_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rating_bounds() {
        let review = |rating| ReviewCreate {
            rating,
            comment: String::new(),
        };
        assert!(!review(0).is_valid_rating());
        assert!(review(1).is_valid_rating());
        assert!(review(5).is_valid_rating());
        assert!(!review(6).is_valid_rating());
    }
}
