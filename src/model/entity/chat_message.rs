use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    model::{DatabaseResult, ModelManager, ResourceTyped},
    web::AuthenticatedUser,
};

pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Advisory lock key held by every chat insert until commit. Ids are then committed in
/// the order they are drawn, and a reader never skips past one still in flight.
pub const CHAT_WRITE_LOCK: i64 = 0x6c68_6368_6174;

/// Community message joined with its author. Ids grow monotonically and double as the
/// polling cursor.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ResourceTyped for ChatMessage {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::ChatMessage
    }
}

/// Trims the message, `None` when empty or too long.
pub fn normalize_message(content: &str) -> Option<&str> {
    let trimmed = content.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_MESSAGE_CHARS {
        None
    } else {
        Some(trimmed)
    }
}

impl ChatMessage {
    pub async fn post(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        content: &str,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(CHAT_WRITE_LOCK)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as(
            r#"
            WITH inserted AS (
                INSERT INTO chat_messages (user_id, content)
                VALUES ($1, $2)
                RETURNING id, user_id, content, created_at
            )
            SELECT i.id, i.user_id, u.username, u.role, i.content, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(actor.user_id())
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }

    /// Messages newer than `after_id`, oldest first. Without a cursor, the latest `limit`.
    pub async fn after(
        mm: &ModelManager,
        after_id: Option<i64>,
        limit: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = match after_id {
            Some(after_id) => {
                sqlx::query_as(
                    r#"
                    SELECT m.id, m.user_id, u.username, u.role, m.content, m.created_at
                    FROM chat_messages m
                    JOIN users u ON u.id = m.user_id
                    WHERE m.id > $1
                    ORDER BY m.id
                    LIMIT $2
                    "#,
                )
                .bind(after_id)
                .bind(limit)
                .fetch_all(mm.executor())
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT * FROM (
                        SELECT m.id, m.user_id, u.username, u.role, m.content, m.created_at
                        FROM chat_messages m
                        JOIN users u ON u.id = m.user_id
                        ORDER BY m.id DESC
                        LIMIT $1
                    ) latest
                    ORDER BY id
                    "#,
                )
                .bind(limit)
                .fetch_all(mm.executor())
                .await?
            }
        };
        Ok(rows)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn message_is_trimmed() {
        assert_eq!(normalize_message("  hello \n"), Some("hello"));
    }

    #[test]
    fn blank_message_is_rejected() {
        assert_eq!(normalize_message("   "), None);
    }

    #[test]
    fn length_counts_chars_not_bytes() {
        let at_limit = "é".repeat(MAX_MESSAGE_CHARS);
        assert!(normalize_message(&at_limit).is_some());
        let over = "a".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(normalize_message(&over).is_none());
    }
}
