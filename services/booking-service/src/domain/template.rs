use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use shared::utils::validation::{is_valid_day_of_week, is_valid_wall_clock_window, parse_wall_clock};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

// Recurring weekly rule milik specialist
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ScheduleTemplate {
    pub id: i32,
    pub specialist_id: i32,
    /// 0 = Monday ... 6 = Sunday
    pub day_of_week: i16,
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "17:00")]
    pub end_time: String,
    pub slot_duration_minutes: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleTemplate {
    // Parse window jam template, None kalau format rusak atau start >= end
    pub fn window(&self) -> Option<(NaiveTime, NaiveTime)> {
        let start = parse_wall_clock(&self.start_time)?;
        let end = parse_wall_clock(&self.end_time)?;
        (start < end).then_some((start, end))
    }
}

// validator mengirim field Copy by value
fn validate_day(day: i16) -> Result<(), ValidationError> {
    if is_valid_day_of_week(day) {
        Ok(())
    } else {
        Err(ValidationError::new("day_of_week_out_of_range"))
    }
}

fn validate_wall_clock(value: &str) -> Result<(), ValidationError> {
    parse_wall_clock(value)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("invalid_wall_clock"))
}

// Cross-field check: start harus sebelum end
fn check_window(start: &str, end: &str) -> Result<(), ValidationError> {
    if is_valid_wall_clock_window(start, end) {
        Ok(())
    } else {
        Err(ValidationError::new("start_time_must_be_before_end_time"))
    }
}

// Request untuk create template
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_window"))]
pub struct CreateTemplateRequest {
    #[validate(custom(function = "validate_day"))]
    #[schema(example = 0)]
    pub day_of_week: i16,

    #[validate(custom(function = "validate_wall_clock"))]
    #[schema(example = "09:00")]
    pub start_time: String,

    #[validate(custom(function = "validate_wall_clock"))]
    #[schema(example = "12:00")]
    pub end_time: String,

    #[validate(range(min = 1, max = 1440))]
    #[schema(example = 30)]
    pub slot_duration_minutes: i32,

    pub is_active: Option<bool>,
}

fn validate_create_window(req: &CreateTemplateRequest) -> Result<(), ValidationError> {
    check_window(&req.start_time, &req.end_time)
}

// Request untuk update template, semua field optional
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTemplateRequest {
    #[validate(custom(function = "validate_day"))]
    pub day_of_week: Option<i16>,

    #[validate(custom(function = "validate_wall_clock"))]
    pub start_time: Option<String>,

    #[validate(custom(function = "validate_wall_clock"))]
    pub end_time: Option<String>,

    #[validate(range(min = 1, max = 1440))]
    pub slot_duration_minutes: Option<i32>,

    pub is_active: Option<bool>,
}

impl UpdateTemplateRequest {
    // Gabung perubahan dengan template lama lalu cek ulang window-nya
    pub fn apply_to(&self, current: &ScheduleTemplate) -> Result<TemplateChanges, String> {
        let changes = TemplateChanges {
            day_of_week: self.day_of_week.unwrap_or(current.day_of_week),
            start_time: self.start_time.clone().unwrap_or_else(|| current.start_time.clone()),
            end_time: self.end_time.clone().unwrap_or_else(|| current.end_time.clone()),
            slot_duration_minutes: self.slot_duration_minutes.unwrap_or(current.slot_duration_minutes),
            is_active: self.is_active.unwrap_or(current.is_active),
        };

        check_window(&changes.start_time, &changes.end_time)
            .map_err(|_| "start_time must be before end_time".to_string())?;

        Ok(changes)
    }
}

// Nilai final template setelah merge update
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateChanges {
    pub day_of_week: i16,
    pub start_time: String,
    pub end_time: String,
    pub slot_duration_minutes: i32,
    pub is_active: bool,
}

// Range tanggal (inclusive) untuk generate slot
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct GenerateSlotsRequest {
    #[schema(example = "2026-11-01")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-11-30")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
pub struct GenerationReport {
    pub created: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(start: &str, end: &str) -> ScheduleTemplate {
        ScheduleTemplate {
            id: 1,
            specialist_id: 10,
            day_of_week: 6,
            start_time: start.to_string(),
            end_time: end.to_string(),
            slot_duration_minutes: 30,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_window_parsing() {
        assert!(template("09:00", "10:00").window().is_some());
        assert!(template("09:00:00", "10:00:00").window().is_some());
        assert!(template("10:00", "09:00").window().is_none());
        assert!(template("nine", "10:00").window().is_none());
    }

    #[test]
    fn test_create_request_validation() {
        let ok = CreateTemplateRequest {
            day_of_week: 6,
            start_time: "09:00".to_string(),
            end_time: "10:00".to_string(),
            slot_duration_minutes: 30,
            is_active: None,
        };
        assert!(ok.validate().is_ok());

        let bad_day = CreateTemplateRequest { day_of_week: 7, ..ok_clone(&ok) };
        assert!(bad_day.validate().is_err());

        let bad_time = CreateTemplateRequest {
            start_time: "9am".to_string(),
            ..ok_clone(&ok)
        };
        assert!(bad_time.validate().is_err());

        let inverted = CreateTemplateRequest {
            start_time: "11:00".to_string(),
            ..ok_clone(&ok)
        };
        assert!(inverted.validate().is_err());

        let zero_duration = CreateTemplateRequest {
            slot_duration_minutes: 0,
            ..ok_clone(&ok)
        };
        assert!(zero_duration.validate().is_err());
    }

    fn ok_clone(req: &CreateTemplateRequest) -> CreateTemplateRequest {
        CreateTemplateRequest {
            day_of_week: req.day_of_week,
            start_time: req.start_time.clone(),
            end_time: req.end_time.clone(),
            slot_duration_minutes: req.slot_duration_minutes,
            is_active: req.is_active,
        }
    }

    #[test]
    fn test_update_merges_with_current() {
        let current = template("09:00", "12:00");
        let update = UpdateTemplateRequest {
            day_of_week: None,
            start_time: None,
            end_time: Some("10:00".to_string()),
            slot_duration_minutes: Some(15),
            is_active: Some(false),
        };

        let changes = update.apply_to(&current).unwrap();
        assert_eq!(changes.start_time, "09:00");
        assert_eq!(changes.end_time, "10:00");
        assert_eq!(changes.slot_duration_minutes, 15);
        assert!(!changes.is_active);

        let inverted = UpdateTemplateRequest {
            day_of_week: None,
            start_time: Some("13:00".to_string()),
            end_time: None,
            slot_duration_minutes: None,
            is_active: None,
        };
        assert!(inverted.apply_to(&current).is_err());
    }

    #[test]
    fn test_update_request_validates_optional_day() {
        let update = |day_of_week| UpdateTemplateRequest {
            day_of_week,
            start_time: None,
            end_time: None,
            slot_duration_minutes: None,
            is_active: None,
        };

        assert!(update(None).validate().is_ok());
        assert!(update(Some(6)).validate().is_ok());
        assert!(update(Some(7)).validate().is_err());
        assert!(update(Some(-1)).validate().is_err());
    }
}
