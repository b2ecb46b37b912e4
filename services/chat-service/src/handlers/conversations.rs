// Conversation Handlers untuk Chat Service
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_extra::extract::WithRejection;
use shared::utils::auth::{AuthClient, AuthUser};
use validator::Validate;

use crate::{
    config::{AppState, HealthCheckResponse},
    domain::{Conversation, ConversationSummary, CreateConversationRequest, UnreadSummary},
    error::{AppError, AppResult},
    messaging,
};

// Buka conversation dengan specialist, existing conversation dikembalikan apa adanya
#[utoipa::path(
    post,
    path = "/conversations",
    tag = "conversations",
    security(("bearer_auth" = [])),
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation dibuka", body = Conversation),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Hanya client"),
        (status = 404, description = "Specialist tidak ditemukan"),
        (status = 422, description = "Request tidak valid")
    )
)]
pub async fn create_conversation(
    AuthClient(user): AuthClient,
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<CreateConversationRequest>, AppError>,
) -> AppResult<(StatusCode, Json<Conversation>)> {
    request.validate()?;

    let conversation =
        messaging::open_conversation(state.store.as_ref(), user.user_id, request.specialist_id).await?;

    Ok((StatusCode::CREATED, Json(conversation)))
}

// List conversation milik user, terbaru di atas
#[utoipa::path(
    get,
    path = "/conversations",
    tag = "conversations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Daftar conversation", body = Vec<ConversationSummary>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_conversations(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ConversationSummary>>> {
    let conversations = messaging::list_conversations(state.store.as_ref(), user.user_id).await?;
    Ok(Json(conversations))
}

#[utoipa::path(
    get,
    path = "/conversations/{id}",
    tag = "conversations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Detail conversation", body = Conversation),
        (status = 404, description = "Conversation tidak ditemukan")
    )
)]
pub async fn get_conversation(
    user: AuthUser,
    State(state): State<AppState>,
    WithRejection(Path(conversation_id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<Json<Conversation>> {
    let conversation = messaging::find_participating(state.store.as_ref(), conversation_id, user.user_id).await?;
    Ok(Json(conversation))
}

// Jumlah unread per conversation + total
#[utoipa::path(
    get,
    path = "/conversations/unread",
    tag = "conversations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Unread summary", body = UnreadSummary),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn unread_summary(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<UnreadSummary>> {
    let summary = messaging::unread_summary(state.store.as_ref(), user.user_id).await?;
    Ok(Json(summary))
}

// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Status service", body = HealthCheckResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(state.health_check().await)
}
