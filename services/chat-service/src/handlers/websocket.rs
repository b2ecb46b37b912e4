// WebSocket Handler untuk Real-time Chat
use axum::{
    extract::{ws::WebSocketUpgrade, Path, Query, State},
    response::Response,
};
use axum_extra::extract::WithRejection;
use futures::StreamExt;
use serde::Deserialize;
use shared::utils::auth::authenticate;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::{
    agent::ConnectionAgent,
    config::AppState,
    error::{AppError, AppResult},
    messaging,
};

// Browser tidak bisa set header Authorization saat upgrade, token lewat query
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WsParams {
    pub token: Option<String>,
}

// Upgrade ke WebSocket setelah token dan participant dicek
#[utoipa::path(
    get,
    path = "/ws/{id}",
    tag = "websocket",
    params(
        ("id" = i32, Path, description = "Conversation ID"),
        WsParams
    ),
    responses(
        (status = 101, description = "Switching protocols"),
        (status = 401, description = "Token tidak ada atau tidak valid"),
        (status = 403, description = "Bukan participant"),
        (status = 404, description = "Conversation tidak ditemukan")
    )
)]
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    WithRejection(Path(conversation_id), _): WithRejection<Path<i32>, AppError>,
    WithRejection(Query(params), _): WithRejection<Query<WsParams>, AppError>,
) -> AppResult<Response> {
    let token = params
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("Missing token"))?;

    let user = authenticate(&token, &state.config.jwt_secret)?;
    messaging::authorize_participant(state.store.as_ref(), conversation_id, user.user_id).await?;

    let agent = ConnectionAgent {
        hub: Arc::clone(&state.hub),
        store: Arc::clone(&state.store),
        conversation_id,
        user_id: user.user_id,
        settings: state.config.agent_settings(),
    };

    Ok(ws.on_upgrade(move |socket| async move {
        let (sink, stream) = socket.split();
        agent.run(sink, stream).await;
    }))
}
