// Expand recurring weekly template jadi slot konkret untuk satu range tanggal.
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use shared::utils::validation::validate_generation_range;
use thiserror::Error;

use crate::{
    domain::{
        slot::AvailabilitySlot,
        template::{GenerateSlotsRequest, GenerationReport, ScheduleTemplate},
    },
    error::{AppError, StoreError},
};

/// Storage yang dibutuhkan engine: baca template aktif, cek duplikat, insert slot
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn active_templates(&self, specialist_id: i32) -> Result<Vec<ScheduleTemplate>, StoreError>;

    async fn slot_exists(&self, specialist_id: i32, start_time: DateTime<Utc>) -> Result<bool, StoreError>;

    async fn insert_slot(
        &self,
        specialist_id: i32,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<AvailabilitySlot, StoreError>;
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{0}")]
    InvalidRange(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::InvalidRange(msg) => AppError::ValidationError(msg),
            GenerationError::Store(e) => AppError::from(e),
        }
    }
}

// Index hari 0=Monday ... 6=Sunday
pub fn weekday_from_index(day: i16) -> Option<Weekday> {
    match day {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Semua window kandidat (UTC) dari satu template di dalam range inclusive.
/// Template yang rusak menghasilkan list kosong.
pub fn expand_template(
    template: &ScheduleTemplate,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let Some(weekday) = weekday_from_index(template.day_of_week) else {
        return Vec::new();
    };
    let Some((window_start, window_end)) = template.window() else {
        return Vec::new();
    };
    if template.slot_duration_minutes <= 0 {
        return Vec::new();
    }
    let step = Duration::minutes(template.slot_duration_minutes as i64);

    let mut windows = Vec::new();
    for date in start_date.iter_days().take_while(|d| *d <= end_date) {
        if date.weekday() != weekday {
            continue;
        }

        let day_end = date.and_time(window_end).and_utc();
        let mut cursor = date.and_time(window_start).and_utc();

        // Tidak ada slot sisa yang lebih pendek dari durasi
        while cursor + step <= day_end {
            windows.push((cursor, cursor + step));
            cursor += step;
        }
    }

    windows
}

/// Generate slot dari semua template aktif specialist untuk range yang diminta.
/// Slot dengan (specialist, start_time) yang sudah ada di-skip.
pub async fn generate_slots<S>(
    store: &S,
    specialist_id: i32,
    range: &GenerateSlotsRequest,
) -> Result<GenerationReport, GenerationError>
where
    S: ScheduleStore + ?Sized,
{
    validate_generation_range(range.start_date, range.end_date).map_err(GenerationError::InvalidRange)?;

    let templates = store.active_templates(specialist_id).await?;
    let mut created = 0;

    for template in &templates {
        let malformed = weekday_from_index(template.day_of_week).is_none()
            || template.window().is_none()
            || template.slot_duration_minutes <= 0;
        if malformed {
            tracing::warn!(
                template_id = template.id,
                specialist_id,
                "Skipping malformed schedule template"
            );
            continue;
        }

        for (start, end) in expand_template(template, range.start_date, range.end_date) {
            if store.slot_exists(specialist_id, start).await? {
                continue;
            }

            match store.insert_slot(specialist_id, start, end).await {
                Ok(_) => created += 1,
                Err(e) => {
                    tracing::warn!(
                        template_id = template.id,
                        specialist_id,
                        start = %start,
                        "Failed to insert generated slot: {}",
                        e
                    );
                }
            }
        }
    }

    tracing::info!(
        specialist_id,
        created,
        start_date = %range.start_date,
        end_date = %range.end_date,
        "Slot generation finished"
    );

    Ok(GenerationReport { created })
}
