use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::{Duration, Utc};
use shared::utils::auth::AuthSpecialist;

use crate::{
    booking_coordinator,
    config::AppState,
    domain::slot::{AvailabilitySlot, CreateSlotRequest, SlotFilter},
    error::{AppError, AppResult},
    handlers::MessageResponse,
    repositories::slot_repo,
};

// Create satu slot availability (specialist)
#[utoipa::path(
    post,
    path = "/availability",
    tag = "availability",
    security(("bearer_auth" = [])),
    request_body = CreateSlotRequest,
    responses(
        (status = 201, description = "Slot created", body = AvailabilitySlot),
        (status = 409, description = "Slot with the same start time already exists"),
        (status = 422, description = "Invalid time range"),
    )
)]
pub async fn create_slot(
    AuthSpecialist(user): AuthSpecialist,
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateSlotRequest>, AppError>,
) -> AppResult<(StatusCode, Json<AvailabilitySlot>)> {
    payload.validate_range(Utc::now()).map_err(AppError::validation)?;

    let slot = slot_repo::create_slot(&state.db, user.user_id, payload.start_time, payload.end_time).await?;

    tracing::info!(specialist_id = user.user_id, slot_id = slot.id, "Slot created");
    Ok((StatusCode::CREATED, Json(slot)))
}

// List slot available milik specialist (public)
#[utoipa::path(
    get,
    path = "/availability/{specialist_id}",
    tag = "availability",
    params(
        ("specialist_id" = i32, Path, description = "Specialist ID"),
        SlotFilter
    ),
    responses(
        (status = 200, description = "Future available slots", body = Vec<AvailabilitySlot>),
    )
)]
pub async fn list_slots(
    State(state): State<AppState>,
    WithRejection(Path(specialist_id), _): WithRejection<Path<i32>, AppError>,
    WithRejection(Query(filter), _): WithRejection<Query<SlotFilter>, AppError>,
) -> AppResult<Json<Vec<AvailabilitySlot>>> {
    let now = Utc::now();
    let from = filter
        .from
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
        .filter(|from| *from > now)
        .unwrap_or(now);
    // Tanggal `to` inclusive
    let to = filter
        .to
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc() + Duration::days(1));

    let slots = slot_repo::list_available_slots(&state.db, specialist_id, from, to).await?;
    Ok(Json(slots))
}

// Delete slot yang belum di-book (owner)
#[utoipa::path(
    delete,
    path = "/availability/{slot_id}",
    tag = "availability",
    security(("bearer_auth" = [])),
    params(("slot_id" = i32, Path, description = "Slot ID")),
    responses(
        (status = 200, description = "Slot deleted", body = MessageResponse),
        (status = 403, description = "Not the slot owner"),
        (status = 404, description = "Slot not found"),
        (status = 409, description = "Slot already booked"),
    )
)]
pub async fn delete_slot(
    AuthSpecialist(user): AuthSpecialist,
    State(state): State<AppState>,
    WithRejection(Path(slot_id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<Json<MessageResponse>> {
    booking_coordinator::delete_slot(&state.store, slot_id, user.user_id).await?;

    Ok(Json(MessageResponse {
        message: "Slot deleted".to_string(),
    }))
}
