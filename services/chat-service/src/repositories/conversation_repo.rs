// Repository untuk Conversation operations
use crate::domain::{Conversation, ConversationSummary, UnreadCount};
use sqlx::PgPool;

// Repository untuk conversation database operations
#[derive(Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, conversation_id: i32) -> Result<Option<Conversation>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, client_id, specialist_id, last_message_at, created_at
             FROM conversations WHERE id = $1"
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await
    }

    // Get-or-create dalam satu statement, aman untuk request paralel
    pub async fn open(&self, client_id: i32, specialist_id: i32) -> Result<Conversation, sqlx::Error> {
        sqlx::query_as(
            "INSERT INTO conversations (client_id, specialist_id)
             VALUES ($1, $2)
             ON CONFLICT (client_id, specialist_id)
             DO UPDATE SET client_id = EXCLUDED.client_id
             RETURNING id, client_id, specialist_id, last_message_at, created_at"
        )
        .bind(client_id)
        .bind(specialist_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn specialist_exists(&self, specialist_id: i32) -> Result<bool, sqlx::Error> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND role = 'specialist')"
        )
        .bind(specialist_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }

    // List conversation user dengan nama lawan bicara dan jumlah unread
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<ConversationSummary>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT
                c.id,
                c.client_id,
                c.specialist_id,
                u.name AS counterpart_name,
                c.last_message_at,
                c.created_at,
                (
                    SELECT COUNT(*) FROM messages m
                    WHERE m.conversation_id = c.id
                      AND m.is_read = FALSE
                      AND m.sender_id IS DISTINCT FROM $1
                ) AS unread_count
            FROM conversations c
            LEFT JOIN users u
                ON u.id = CASE WHEN c.client_id = $1 THEN c.specialist_id ELSE c.client_id END
            WHERE c.client_id = $1 OR c.specialist_id = $1
            ORDER BY c.last_message_at DESC NULLS LAST, c.created_at DESC
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    // Unread per conversation, hanya yang > 0
    pub async fn unread_counts(&self, user_id: i32) -> Result<Vec<UnreadCount>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT m.conversation_id, COUNT(*) AS unread_count
            FROM messages m
            JOIN conversations c ON c.id = m.conversation_id
            WHERE (c.client_id = $1 OR c.specialist_id = $1)
              AND m.is_read = FALSE
              AND m.sender_id IS DISTINCT FROM $1
            GROUP BY m.conversation_id
            ORDER BY m.conversation_id
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}
