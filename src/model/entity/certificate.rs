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
pub struct Certificate {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    certificate_code: String,
    #[serde(skip)]
    file_path: String,
    issued_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct CertificateCreate {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub certificate_code: String,
    pub file_path: String,
    pub issued_at: DateTime<Utc>,
}

impl ResourceTyped for Certificate {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Certificate
    }
}

impl Certificate {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn certificate_code(&self) -> &str {
        &self.certificate_code
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn issued_at(&self) -> &DateTime<Utc> {
        &self.issued_at
    }

    pub async fn find_by_id(mm: &ModelManager, id: Uuid) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as("SELECT * FROM certificates WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(row)
    }

    pub async fn find_for(
        mm: &ModelManager,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as("SELECT * FROM certificates WHERE user_id = $1 AND course_id = $2")
            .bind(user_id)
            .bind(course_id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(row)
    }

    /// `None` when a certificate for the same user and course already exists.
    pub async fn insert_if_absent(
        mm: &ModelManager,
        data: CertificateCreate,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO certificates (id, user_id, course_id, certificate_code, file_path, issued_at)
            VALUES ($1,$2,$3,$4,$5,$6)
            ON CONFLICT (user_id, course_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.course_id)
        .bind(&data.certificate_code)
        .bind(&data.file_path)
        .bind(data.issued_at)
        .fetch_optional(mm.executor())
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl HasOwner for Certificate {
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
pub struct CertificateRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub certificate_code: String,
    pub issued_at: DateTime<Utc>,
}

impl CertificateRow {
    pub async fn all_for(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT cert.id, cert.course_id, c.title AS course_title, cert.certificate_code, cert.issued_at
            FROM certificates cert
            JOIN courses c ON c.id = cert.course_id
            WHERE cert.user_id = $1
            ORDER BY cert.issued_at DESC
            "#,
        )
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}

/// Public view of a certificate, looked up by its printed identifier.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct CertificateVerificationRow {
    pub certificate_code: String,
    pub learner_name: String,
    pub course_title: String,
    pub issued_at: DateTime<Utc>,
}

impl CertificateVerificationRow {
    pub async fn find_by_code(mm: &ModelManager, code: &str) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            SELECT
                cert.certificate_code,
                COALESCE(NULLIF(u.full_name, ''), u.username) AS learner_name,
                c.title AS course_title,
                cert.issued_at
            FROM certificates cert
            JOIN users u ON u.id = cert.user_id
            JOIN courses c ON c.id = cert.course_id
            WHERE cert.certificate_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(mm.executor())
        .await?;
        Ok(row)
    }
}
