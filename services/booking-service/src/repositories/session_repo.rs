use sqlx::{PgConnection, PgPool};

use crate::domain::session::{NewSession, Session, SessionStatus};

// Insert session di dalam transaction booking
pub async fn insert_session(conn: &mut PgConnection, new: &NewSession) -> Result<Session, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO sessions (slot_id, specialist_id, client_id, start_time, end_time, status)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING *"
    )
    .bind(new.slot_id)
    .bind(new.specialist_id)
    .bind(new.client_id)
    .bind(new.start_time)
    .bind(new.end_time)
    .bind(SessionStatus::Scheduled.as_str())
    .fetch_one(conn)
    .await
}

pub async fn find_sessions_by_client(pool: &PgPool, client_id: i32) -> Result<Vec<Session>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM sessions
         WHERE client_id = $1
         ORDER BY start_time DESC"
    )
    .bind(client_id)
    .fetch_all(pool)
    .await
}

pub async fn find_sessions_by_specialist(pool: &PgPool, specialist_id: i32) -> Result<Vec<Session>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM sessions
         WHERE specialist_id = $1
         ORDER BY start_time DESC"
    )
    .bind(specialist_id)
    .fetch_all(pool)
    .await
}

// Tandai session yang sudah selesai (dipakai scheduler)
pub async fn complete_ended_sessions(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE sessions
         SET status = $1
         WHERE status = $2 AND end_time < NOW()"
    )
    .bind(SessionStatus::Completed.as_str())
    .bind(SessionStatus::Scheduled.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
