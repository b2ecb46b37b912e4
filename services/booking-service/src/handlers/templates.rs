use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use shared::utils::auth::AuthSpecialist;
use validator::Validate;

use crate::{
    config::AppState,
    domain::template::{
        CreateTemplateRequest, GenerateSlotsRequest, GenerationReport, ScheduleTemplate,
        UpdateTemplateRequest,
    },
    error::{AppError, AppResult},
    handlers::MessageResponse,
    repositories::template_repo,
    schedule_engine,
};

// Create recurring template (specialist)
#[utoipa::path(
    post,
    path = "/schedule-templates",
    tag = "schedule-templates",
    security(("bearer_auth" = [])),
    request_body = CreateTemplateRequest,
    responses(
        (status = 201, description = "Template created", body = ScheduleTemplate),
        (status = 409, description = "Template with the same day and start time exists"),
        (status = 422, description = "Invalid day of week or time window"),
    )
)]
pub async fn create_template(
    AuthSpecialist(user): AuthSpecialist,
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateTemplateRequest>, AppError>,
) -> AppResult<(StatusCode, Json<ScheduleTemplate>)> {
    payload.validate()?;

    let template = template_repo::create_template(&state.db, user.user_id, &payload).await?;

    tracing::info!(specialist_id = user.user_id, template_id = template.id, "Schedule template created");
    Ok((StatusCode::CREATED, Json(template)))
}

#[utoipa::path(
    get,
    path = "/schedule-templates",
    tag = "schedule-templates",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own templates", body = Vec<ScheduleTemplate>),
    )
)]
pub async fn list_templates(
    AuthSpecialist(user): AuthSpecialist,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ScheduleTemplate>>> {
    let templates = template_repo::list_templates(&state.db, user.user_id).await?;
    Ok(Json(templates))
}

#[utoipa::path(
    put,
    path = "/schedule-templates/{id}",
    tag = "schedule-templates",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Template ID")),
    request_body = UpdateTemplateRequest,
    responses(
        (status = 200, description = "Template updated", body = ScheduleTemplate),
        (status = 404, description = "Template not found"),
        (status = 409, description = "Template with the same day and start time exists"),
        (status = 422, description = "Invalid day of week or time window"),
    )
)]
pub async fn update_template(
    AuthSpecialist(user): AuthSpecialist,
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateTemplateRequest>, AppError>,
) -> AppResult<Json<ScheduleTemplate>> {
    payload.validate()?;

    // Template milik specialist lain diperlakukan sebagai tidak ada
    let current = template_repo::find_template_by_id(&state.db, id)
        .await?
        .filter(|t| t.specialist_id == user.user_id)
        .ok_or_else(|| AppError::not_found("Schedule template not found"))?;

    let changes = payload.apply_to(&current).map_err(AppError::validation)?;

    let updated = template_repo::update_template(&state.db, id, user.user_id, &changes)
        .await?
        .ok_or_else(|| AppError::not_found("Schedule template not found"))?;

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/schedule-templates/{id}",
    tag = "schedule-templates",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Template deleted", body = MessageResponse),
        (status = 404, description = "Template not found"),
    )
)]
pub async fn delete_template(
    AuthSpecialist(user): AuthSpecialist,
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<Json<MessageResponse>> {
    let deleted = template_repo::delete_template(&state.db, id, user.user_id).await?;
    if deleted == 0 {
        return Err(AppError::not_found("Schedule template not found"));
    }

    Ok(Json(MessageResponse {
        message: "Schedule template deleted".to_string(),
    }))
}

// Jalankan generator slot untuk range tanggal
#[utoipa::path(
    post,
    path = "/schedule-templates/generate",
    tag = "schedule-templates",
    security(("bearer_auth" = [])),
    request_body = GenerateSlotsRequest,
    responses(
        (status = 200, description = "Number of slots created", body = GenerationReport),
        (status = 422, description = "Invalid or too large date range"),
    )
)]
pub async fn generate_slots(
    AuthSpecialist(user): AuthSpecialist,
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<GenerateSlotsRequest>, AppError>,
) -> AppResult<Json<GenerationReport>> {
    let report = schedule_engine::generate_slots(&state.store, user.user_id, &payload).await?;
    Ok(Json(report))
}
