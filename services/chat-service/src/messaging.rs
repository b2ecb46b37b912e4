// Operasi conversation & message di atas ChatStore: persist + fan-out,
// thread dengan read-state, dan unread summary.
use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    domain::{
        Conversation, ConversationSummary, MessageFrame, MessageQuery, ThreadMessage, UnreadCount,
        UnreadSummary,
    },
    error::{AppError, AppResult, StoreError},
    hub::{BroadcastReport, ConversationHub},
};

/// Storage seam untuk chat
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn find_conversation(&self, conversation_id: i32) -> Result<Option<Conversation>, StoreError>;

    /// Get-or-create conversation untuk pasangan (client, specialist)
    async fn open_conversation(&self, client_id: i32, specialist_id: i32) -> Result<Conversation, StoreError>;

    async fn specialist_exists(&self, specialist_id: i32) -> Result<bool, StoreError>;

    async fn list_conversations(&self, user_id: i32) -> Result<Vec<ConversationSummary>, StoreError>;

    /// Insert message dan update last_message_at conversation
    async fn persist_message(
        &self,
        conversation_id: i32,
        sender_id: i32,
        content: &str,
    ) -> Result<MessageFrame, StoreError>;

    /// Tandai semua message yang bukan dari reader sebagai read
    async fn mark_read(&self, conversation_id: i32, reader_id: i32) -> Result<u64, StoreError>;

    async fn list_messages(
        &self,
        conversation_id: i32,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ThreadMessage>, StoreError>;

    async fn unread_counts(&self, user_id: i32) -> Result<Vec<UnreadCount>, StoreError>;
}

pub type SharedChatStore = Arc<dyn ChatStore>;

// Conversation milik user, selain itu dianggap tidak ada
pub async fn find_participating(
    store: &dyn ChatStore,
    conversation_id: i32,
    user_id: i32,
) -> AppResult<Conversation> {
    store
        .find_conversation(conversation_id)
        .await?
        .filter(|c| c.is_participant(user_id))
        .ok_or_else(|| AppError::not_found("Conversation not found"))
}

// Cek sebelum upgrade WebSocket: 404 kalau tidak ada, 403 kalau bukan participant
pub async fn authorize_participant(
    store: &dyn ChatStore,
    conversation_id: i32,
    user_id: i32,
) -> AppResult<Conversation> {
    let conversation = store
        .find_conversation(conversation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Conversation not found"))?;

    if !conversation.is_participant(user_id) {
        return Err(AppError::forbidden("Tidak memiliki akses ke conversation ini"));
    }

    Ok(conversation)
}

/// Get-or-create conversation client dengan specialist
pub async fn open_conversation(store: &dyn ChatStore, client_id: i32, specialist_id: i32) -> AppResult<Conversation> {
    if client_id == specialist_id {
        return Err(AppError::validation("Cannot open a conversation with yourself"));
    }

    if !store.specialist_exists(specialist_id).await? {
        return Err(AppError::not_found("Specialist not found"));
    }

    let conversation = store.open_conversation(client_id, specialist_id).await?;
    tracing::debug!(conversation_id = conversation.id, client_id, specialist_id, "Conversation opened");
    Ok(conversation)
}

pub async fn list_conversations(store: &dyn ChatStore, user_id: i32) -> AppResult<Vec<ConversationSummary>> {
    Ok(store.list_conversations(user_id).await?)
}

/// Persist message lalu broadcast ke semua koneksi live di conversation.
/// Gagal persist berarti tidak ada broadcast.
pub async fn persist_and_broadcast(
    store: &dyn ChatStore,
    hub: &ConversationHub,
    conversation_id: i32,
    sender_id: i32,
    content: &str,
) -> Result<(MessageFrame, BroadcastReport), StoreError> {
    let frame = store.persist_message(conversation_id, sender_id, content).await?;
    let report = hub.broadcast(conversation_id, Arc::new(frame.clone()));

    tracing::debug!(
        conversation_id,
        sender_id,
        message_id = frame.id,
        delivered = report.delivered,
        dropped = report.dropped,
        "Message broadcast"
    );

    Ok((frame, report))
}

/// Ambil satu page thread. Message dari lawan bicara ditandai read dulu.
pub async fn fetch_thread(
    store: &dyn ChatStore,
    conversation_id: i32,
    reader_id: i32,
    page: MessageQuery,
) -> AppResult<Vec<ThreadMessage>> {
    find_participating(store, conversation_id, reader_id).await?;

    let marked = store.mark_read(conversation_id, reader_id).await?;
    if marked > 0 {
        tracing::debug!(conversation_id, reader_id, marked, "Messages marked as read");
    }

    let messages = store
        .list_messages(conversation_id, page.limit(), page.offset())
        .await?;

    Ok(messages)
}

pub async fn unread_summary(store: &dyn ChatStore, user_id: i32) -> AppResult<UnreadSummary> {
    let counts = store.unread_counts(user_id).await?;
    Ok(UnreadSummary::from_counts(counts))
}
