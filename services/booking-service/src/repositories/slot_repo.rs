use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::domain::slot::{AvailabilitySlot, SlotStatus};

// Insert satu slot baru (status available)
pub async fn create_slot(
    pool: &PgPool,
    specialist_id: i32,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Result<AvailabilitySlot, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO availability_slots (specialist_id, start_time, end_time, status)
         VALUES ($1, $2, $3, $4)
         RETURNING *"
    )
    .bind(specialist_id)
    .bind(start_time)
    .bind(end_time)
    .bind(SlotStatus::Available.as_str())
    .fetch_one(pool)
    .await
}

// Ambil slot by ID tanpa lock
pub async fn find_slot_by_id(pool: &PgPool, id: i32) -> Result<Option<AvailabilitySlot>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM availability_slots WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

// Cek duplikat berdasarkan (specialist, start_time)
pub async fn slot_exists(
    pool: &PgPool,
    specialist_id: i32,
    start_time: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let exists: (bool,) = sqlx::query_as(
        "SELECT EXISTS(
            SELECT 1 FROM availability_slots
            WHERE specialist_id = $1 AND start_time = $2
        )"
    )
    .bind(specialist_id)
    .bind(start_time)
    .fetch_one(pool)
    .await?;

    Ok(exists.0)
}

// Slot available yang belum lewat, optional dibatasi range waktu
pub async fn list_available_slots(
    pool: &PgPool,
    specialist_id: i32,
    from: DateTime<Utc>,
    to: Option<DateTime<Utc>>,
) -> Result<Vec<AvailabilitySlot>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM availability_slots
         WHERE specialist_id = $1
           AND status = $2
           AND start_time > $3
           AND ($4::timestamptz IS NULL OR start_time < $4)
         ORDER BY start_time ASC"
    )
    .bind(specialist_id)
    .bind(SlotStatus::Available.as_str())
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}

// Delete kondisional: hanya kalau masih available. Return jumlah row terhapus
pub async fn delete_available_slot(pool: &PgPool, id: i32, specialist_id: i32) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM availability_slots
         WHERE id = $1 AND specialist_id = $2 AND status = $3"
    )
    .bind(id)
    .bind(specialist_id)
    .bind(SlotStatus::Available.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

// Lock row slot yang masih available (SELECT ... FOR UPDATE)
pub async fn lock_available_slot(conn: &mut PgConnection, id: i32) -> Result<Option<AvailabilitySlot>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM availability_slots
         WHERE id = $1 AND status = $2
         FOR UPDATE"
    )
    .bind(id)
    .bind(SlotStatus::Available.as_str())
    .fetch_optional(conn)
    .await
}

pub async fn mark_slot_booked(conn: &mut PgConnection, id: i32) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE availability_slots
         SET status = $1, updated_at = NOW()
         WHERE id = $2"
    )
    .bind(SlotStatus::Booked.as_str())
    .bind(id)
    .execute(conn)
    .await?;

    Ok(())
}

// Cleanup slot available yang sudah lewat (dipakai scheduler)
pub async fn purge_expired_available_slots(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM availability_slots
         WHERE status = $1 AND start_time < NOW()"
    )
    .bind(SlotStatus::Available.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
