use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Session hasil booking satu slot
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Session {
    pub id: i32,
    pub slot_id: i32,
    pub specialist_id: i32,
    pub client_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[schema(example = "scheduled")]
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionStatus {
    Scheduled,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Completed => "completed",
        }
    }
}

// Data yang dibutuhkan untuk insert session baru
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub slot_id: i32,
    pub specialist_id: i32,
    pub client_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}
