use serde::{Deserialize, Serialize};

use crate::model::{DatabaseResult, ModelManager};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct PublicStats {
    pub learners: i64,
    pub instructors: i64,
    pub published_courses: i64,
    pub certificates: i64,
}

impl PublicStats {
    pub async fn fetch(mm: &ModelManager) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users WHERE role = 'learner') AS learners,
                (SELECT COUNT(*) FROM users WHERE role = 'instructor') AS instructors,
                (SELECT COUNT(*) FROM courses WHERE is_published) AS published_courses,
                (SELECT COUNT(*) FROM certificates) AS certificates
            "#,
        )
        .fetch_one(mm.executor())
        .await?;
        Ok(row)
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct AdminStats {
    pub users: i64,
    pub learners: i64,
    pub instructors: i64,
    pub admins: i64,
    pub courses: i64,
    pub published_courses: i64,
    pub enrollments: i64,
    pub completed_courses: i64,
    pub certificates: i64,
    pub points_awarded: i64,
}

impl AdminStats {
    pub async fn fetch(mm: &ModelManager) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM users WHERE role = 'learner') AS learners,
                (SELECT COUNT(*) FROM users WHERE role = 'instructor') AS instructors,
                (SELECT COUNT(*) FROM users WHERE role = 'admin') AS admins,
                (SELECT COUNT(*) FROM courses) AS courses,
                (SELECT COUNT(*) FROM courses WHERE is_published) AS published_courses,
                (SELECT COUNT(*) FROM enrollments) AS enrollments,
                (SELECT COUNT(*) FROM course_progress WHERE status = 'COMPLETED') AS completed_courses,
                (SELECT COUNT(*) FROM certificates) AS certificates,
                (SELECT COALESCE(SUM(points), 0)::bigint FROM points_log) AS points_awarded
            "#,
        )
        .fetch_one(mm.executor())
        .await?;
        Ok(row)
    }
}
