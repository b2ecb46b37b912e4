// Message Handlers untuk Chat Service
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_extra::extract::WithRejection;
use shared::utils::auth::AuthUser;
use validator::Validate;

use crate::{
    config::AppState,
    domain::{MessageFrame, MessageQuery, SendMessageRequest, ThreadMessage},
    error::{AppError, AppResult},
    messaging,
};

// Thread conversation, sekaligus menandai message lawan bicara sebagai read
#[utoipa::path(
    get,
    path = "/conversations/{id}/messages",
    tag = "messages",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Conversation ID"),
        MessageQuery
    ),
    responses(
        (status = 200, description = "Message thread", body = Vec<ThreadMessage>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Conversation tidak ditemukan")
    )
)]
pub async fn get_messages(
    user: AuthUser,
    State(state): State<AppState>,
    WithRejection(Path(conversation_id), _): WithRejection<Path<i32>, AppError>,
    WithRejection(Query(page), _): WithRejection<Query<MessageQuery>, AppError>,
) -> AppResult<Json<Vec<ThreadMessage>>> {
    let messages = messaging::fetch_thread(state.store.as_ref(), conversation_id, user.user_id, page).await?;
    Ok(Json(messages))
}

// Kirim message lewat HTTP, di-broadcast ke koneksi live yang sama
#[utoipa::path(
    post,
    path = "/conversations/{id}/messages",
    tag = "messages",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Conversation ID")),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message terkirim", body = MessageFrame),
        (status = 404, description = "Conversation tidak ditemukan"),
        (status = 422, description = "Content kosong atau terlalu panjang")
    )
)]
pub async fn send_message(
    user: AuthUser,
    State(state): State<AppState>,
    WithRejection(Path(conversation_id), _): WithRejection<Path<i32>, AppError>,
    WithRejection(Json(request), _): WithRejection<Json<SendMessageRequest>, AppError>,
) -> AppResult<(StatusCode, Json<MessageFrame>)> {
    request.validate()?;
    messaging::find_participating(state.store.as_ref(), conversation_id, user.user_id).await?;

    let (frame, _) = messaging::persist_and_broadcast(
        state.store.as_ref(),
        &state.hub,
        conversation_id,
        user.user_id,
        &request.content,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(frame)))
}
