use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use shared::utils::auth::{AuthClient, AuthUser};

use crate::{
    booking_coordinator,
    config::AppState,
    domain::session::Session,
    error::{AppError, AppResult},
    repositories::session_repo,
};

// Book slot untuk client yang login
#[utoipa::path(
    post,
    path = "/sessions/book/{slot_id}",
    tag = "sessions",
    security(("bearer_auth" = [])),
    params(("slot_id" = i32, Path, description = "Slot ID")),
    responses(
        (status = 201, description = "Session created", body = Session),
        (status = 404, description = "Slot not found"),
        (status = 409, description = "Slot no longer available"),
    )
)]
pub async fn book_slot(
    AuthClient(user): AuthClient,
    State(state): State<AppState>,
    WithRejection(Path(slot_id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<(StatusCode, Json<Session>)> {
    let session = booking_coordinator::book_slot(&state.store, slot_id, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

// Session milik caller, sebagai client atau specialist sesuai role
#[utoipa::path(
    get,
    path = "/sessions/my",
    tag = "sessions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's sessions", body = Vec<Session>),
    )
)]
pub async fn my_sessions(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Session>>> {
    let sessions = if user.is_specialist() {
        session_repo::find_sessions_by_specialist(&state.db, user.user_id).await?
    } else {
        session_repo::find_sessions_by_client(&state.db, user.user_id).await?
    };

    Ok(Json(sessions))
}
