// Domain model untuk Message
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::utils::validation::{is_valid_message_content, MAX_MESSAGE_LENGTH};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

// Message di thread, dipakai response HTTP
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema, PartialEq)]
pub struct ThreadMessage {
    pub id: i32,
    pub conversation_id: i32,
    pub sender_id: Option<i32>,
    pub sender_name: Option<String>,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Frame outbound ke semua koneksi WebSocket di conversation
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageFrame {
    pub id: i32,
    pub conversation_id: i32,
    pub sender_id: Option<i32>,
    pub sender_name: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Frame inbound dari client: `{ "content": "..." }`
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    pub content: String,
}

impl InboundFrame {
    // None untuk payload rusak, kosong, atau terlalu panjang
    pub fn parse(text: &str) -> Option<Self> {
        let frame: InboundFrame = serde_json::from_str(text).ok()?;
        is_valid_message_content(&frame.content).then_some(frame)
    }
}

fn validate_content(content: &str) -> Result<(), ValidationError> {
    if is_valid_message_content(content) {
        Ok(())
    } else {
        Err(ValidationError::new("content_blank_or_too_long"))
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SendMessageRequest {
    #[validate(custom(function = "validate_content"))]
    #[schema(max_length = 2000, example = "Halo, jadwal besok masih bisa?")]
    pub content: String,
}

// Pagination thread, default 50 dan max 100
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl MessageQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
