// Domain model untuk Conversation
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// Satu conversation per pasangan (client, specialist)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema, PartialEq)]
pub struct Conversation {
    pub id: i32,
    pub client_id: i32,
    pub specialist_id: i32,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn is_participant(&self, user_id: i32) -> bool {
        self.client_id == user_id || self.specialist_id == user_id
    }

    // Lawan bicara dari sudut pandang user
    pub fn counterpart_of(&self, user_id: i32) -> i32 {
        if self.client_id == user_id {
            self.specialist_id
        } else {
            self.client_id
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateConversationRequest {
    #[validate(range(min = 1))]
    pub specialist_id: i32,
}

// Item list conversation lengkap dengan jumlah unread
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ConversationSummary {
    pub id: i32,
    pub client_id: i32,
    pub specialist_id: i32,
    pub counterpart_name: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub unread_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema, PartialEq)]
pub struct UnreadCount {
    pub conversation_id: i32,
    pub unread_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct UnreadSummary {
    pub conversations: Vec<UnreadCount>,
    pub total: i64,
}

impl UnreadSummary {
    pub fn from_counts(counts: Vec<UnreadCount>) -> Self {
        // Conversation tanpa unread tidak ikut di-list
        let conversations: Vec<UnreadCount> = counts.into_iter().filter(|c| c.unread_count > 0).collect();
        let total = conversations.iter().map(|c| c.unread_count).sum();
        Self { conversations, total }
    }
}
