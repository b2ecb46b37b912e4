use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Model utama AvailabilitySlot dari database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AvailabilitySlot {
    pub id: i32,
    pub specialist_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[schema(example = "available")]
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Status slot. Transisi hanya available -> booked
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SlotStatus {
    Available,
    Booked,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Booked => "booked",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "available" => Some(SlotStatus::Available),
            "booked" => Some(SlotStatus::Booked),
            _ => None,
        }
    }
}

impl AvailabilitySlot {
    pub fn status(&self) -> Option<SlotStatus> {
        SlotStatus::from_str(&self.status)
    }

    pub fn is_available(&self) -> bool {
        self.status() == Some(SlotStatus::Available)
    }

    pub fn is_owned_by(&self, specialist_id: i32) -> bool {
        self.specialist_id == specialist_id
    }
}

// Request untuk create satu slot secara manual
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSlotRequest {
    #[schema(example = "2026-11-01T09:00:00Z")]
    pub start_time: DateTime<Utc>,
    #[schema(example = "2026-11-01T09:30:00Z")]
    pub end_time: DateTime<Utc>,
}

impl CreateSlotRequest {
    // Range harus start < end dan belum lewat
    pub fn validate_range(&self, now: DateTime<Utc>) -> Result<(), String> {
        if self.start_time >= self.end_time {
            return Err("start_time must be before end_time".to_string());
        }
        if self.start_time <= now {
            return Err("start_time must be in the future".to_string());
        }
        Ok(())
    }
}

// Filter optional untuk list slot publik
#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SlotFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}
