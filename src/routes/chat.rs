use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::{
        chat::{
            ChatRequest, ChatResponse, DoubtRequest, DoubtResponse, SplitDialogRequest,
            SplitDialogResponse,
        },
        history::ChatStats,
    },
    error::{AppError, ErrorBody},
    routes::extract::ValidJson,
    services::{chat_service, history_service},
    state::SharedState,
};

/// Persona chat endpoints. They keep answering in degraded mode, only logging is skipped.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/split-dialog", post(split_dialog))
        .route("/chat/doubt", post(doubt))
        .route("/chat/stats", get(chat_stats))
}

/// Ask one persona a question.
#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Persona answer", body = ChatResponse),
        (status = 400, description = "Invalid request", body = ErrorBody)
    )
)]
pub async fn chat(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    Ok(Json(chat_service::chat(&state, payload).await?))
}

/// Let Adam and Beata discuss a topic.
#[utoipa::path(
    post,
    path = "/chat/split-dialog",
    tag = "chat",
    request_body = SplitDialogRequest,
    responses(
        (status = 200, description = "Alternating dialog", body = SplitDialogResponse),
        (status = 400, description = "Invalid request", body = ErrorBody)
    )
)]
pub async fn split_dialog(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<SplitDialogRequest>,
) -> Result<Json<SplitDialogResponse>, AppError> {
    Ok(Json(chat_service::split_dialog(&state, payload).await?))
}

/// Ask the doubting persona.
#[utoipa::path(
    post,
    path = "/chat/doubt",
    tag = "chat",
    request_body = DoubtRequest,
    responses(
        (status = 200, description = "Hesitant answer", body = DoubtResponse),
        (status = 400, description = "Invalid request", body = ErrorBody)
    )
)]
pub async fn doubt(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<DoubtRequest>,
) -> Result<Json<DoubtResponse>, AppError> {
    Ok(Json(chat_service::doubt(&state, payload).await?))
}

/// Message totals of the chat log.
#[utoipa::path(
    get,
    path = "/chat/stats",
    tag = "chat",
    responses(
        (status = 200, description = "Chat log totals", body = ChatStats),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn chat_stats(State(state): State<SharedState>) -> Result<Json<ChatStats>, AppError> {
    Ok(Json(history_service::chat_stats(&state).await?))
}
