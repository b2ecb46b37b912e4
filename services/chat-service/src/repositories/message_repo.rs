// Repository untuk Message operations
use crate::domain::{MessageFrame, ThreadMessage};
use sqlx::PgPool;

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Insert message dan update last_message_at dalam satu statement
    pub async fn create_message(
        &self,
        conversation_id: i32,
        sender_id: i32,
        content: &str,
    ) -> Result<MessageFrame, sqlx::Error> {
        sqlx::query_as(
            r#"
            WITH inserted AS (
                INSERT INTO messages (conversation_id, sender_id, content)
                VALUES ($1, $2, $3)
                RETURNING id, conversation_id, sender_id, content, created_at
            ),
            touched AS (
                UPDATE conversations
                SET last_message_at = (SELECT created_at FROM inserted)
                WHERE id = $1
            )
            SELECT i.id, i.conversation_id, i.sender_id, u.name AS sender_name, i.content, i.created_at
            FROM inserted i
            LEFT JOIN users u ON u.id = i.sender_id
            "#
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
    }

    // Tandai message dari lawan bicara sebagai read
    pub async fn mark_as_read(&self, conversation_id: i32, reader_id: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = TRUE
             WHERE conversation_id = $1
               AND is_read = FALSE
               AND sender_id IS DISTINCT FROM $2"
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    // Thread urut created_at ASC
    pub async fn list_messages(
        &self,
        conversation_id: i32,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ThreadMessage>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT m.id, m.conversation_id, m.sender_id, u.name AS sender_name,
                   m.content, m.is_read, m.created_at
            FROM messages m
            LEFT JOIN users u ON u.id = m.sender_id
            WHERE m.conversation_id = $1
            ORDER BY m.created_at ASC, m.id ASC
            LIMIT $2 OFFSET $3
            "#
        )
        .bind(conversation_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }
}
