// ChatStore di atas Postgres
use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    domain::{Conversation, ConversationSummary, MessageFrame, ThreadMessage, UnreadCount},
    error::StoreError,
    messaging::ChatStore,
    repositories::{ConversationRepository, MessageRepository},
};

#[derive(Clone)]
pub struct PgChatStore {
    conversations: ConversationRepository,
    messages: MessageRepository,
}

impl PgChatStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            conversations: ConversationRepository::new(pool.clone()),
            messages: MessageRepository::new(pool),
        }
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn find_conversation(&self, conversation_id: i32) -> Result<Option<Conversation>, StoreError> {
        Ok(self.conversations.find_by_id(conversation_id).await?)
    }

    async fn open_conversation(&self, client_id: i32, specialist_id: i32) -> Result<Conversation, StoreError> {
        Ok(self.conversations.open(client_id, specialist_id).await?)
    }

    async fn specialist_exists(&self, specialist_id: i32) -> Result<bool, StoreError> {
        Ok(self.conversations.specialist_exists(specialist_id).await?)
    }

    async fn list_conversations(&self, user_id: i32) -> Result<Vec<ConversationSummary>, StoreError> {
        Ok(self.conversations.list_for_user(user_id).await?)
    }

    async fn persist_message(
        &self,
        conversation_id: i32,
        sender_id: i32,
        content: &str,
    ) -> Result<MessageFrame, StoreError> {
        Ok(self.messages.create_message(conversation_id, sender_id, content).await?)
    }

    async fn mark_read(&self, conversation_id: i32, reader_id: i32) -> Result<u64, StoreError> {
        Ok(self.messages.mark_as_read(conversation_id, reader_id).await?)
    }

    async fn list_messages(
        &self,
        conversation_id: i32,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ThreadMessage>, StoreError> {
        Ok(self.messages.list_messages(conversation_id, limit, offset).await?)
    }

    async fn unread_counts(&self, user_id: i32) -> Result<Vec<UnreadCount>, StoreError> {
        Ok(self.conversations.unread_counts(user_id).await?)
    }
}
