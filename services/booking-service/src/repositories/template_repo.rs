use sqlx::PgPool;

use crate::domain::template::{CreateTemplateRequest, ScheduleTemplate, TemplateChanges};

pub async fn create_template(
    pool: &PgPool,
    specialist_id: i32,
    payload: &CreateTemplateRequest,
) -> Result<ScheduleTemplate, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO schedule_templates (
            specialist_id, day_of_week, start_time, end_time,
            slot_duration_minutes, is_active
        ) VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *"
    )
    .bind(specialist_id)
    .bind(payload.day_of_week)
    .bind(&payload.start_time)
    .bind(&payload.end_time)
    .bind(payload.slot_duration_minutes)
    .bind(payload.is_active.unwrap_or(true))
    .fetch_one(pool)
    .await
}

pub async fn find_template_by_id(pool: &PgPool, id: i32) -> Result<Option<ScheduleTemplate>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM schedule_templates WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

// Semua template milik specialist, urut per hari lalu jam
pub async fn list_templates(pool: &PgPool, specialist_id: i32) -> Result<Vec<ScheduleTemplate>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM schedule_templates
         WHERE specialist_id = $1
         ORDER BY day_of_week ASC, start_time ASC"
    )
    .bind(specialist_id)
    .fetch_all(pool)
    .await
}

pub async fn list_active_templates(pool: &PgPool, specialist_id: i32) -> Result<Vec<ScheduleTemplate>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM schedule_templates
         WHERE specialist_id = $1 AND is_active = TRUE
         ORDER BY day_of_week ASC, start_time ASC"
    )
    .bind(specialist_id)
    .fetch_all(pool)
    .await
}

// Update template milik specialist, None kalau tidak ketemu
pub async fn update_template(
    pool: &PgPool,
    id: i32,
    specialist_id: i32,
    changes: &TemplateChanges,
) -> Result<Option<ScheduleTemplate>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE schedule_templates
         SET day_of_week = $1,
             start_time = $2,
             end_time = $3,
             slot_duration_minutes = $4,
             is_active = $5,
             updated_at = NOW()
         WHERE id = $6 AND specialist_id = $7
         RETURNING *"
    )
    .bind(changes.day_of_week)
    .bind(&changes.start_time)
    .bind(&changes.end_time)
    .bind(changes.slot_duration_minutes)
    .bind(changes.is_active)
    .bind(id)
    .bind(specialist_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_template(pool: &PgPool, id: i32, specialist_id: i32) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM schedule_templates WHERE id = $1 AND specialist_id = $2")
        .bind(id)
        .bind(specialist_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
