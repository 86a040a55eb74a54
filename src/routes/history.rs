use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        common::ActionResponse,
        history::{
            ChatHistoryPage, ChatHistoryQuery, ExportRequest, ExportResponse, HistoryOverview,
            OverviewQuery,
        },
    },
    error::{AppError, ErrorBody},
    routes::extract::{AppPath, ValidJson, ValidQuery},
    services::history_service,
    state::SharedState,
};

/// Chat log browsing and export.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/history/chat", get(list_chat))
        .route("/history/chat/{id}", delete(delete_chat))
        .route("/history/export", post(export_chat))
        .route("/history/stats/overview", get(overview))
}

/// Page through the chat log, newest first.
#[utoipa::path(
    get,
    path = "/history/chat",
    tag = "history",
    params(ChatHistoryQuery),
    responses(
        (status = 200, description = "Chat log page", body = ChatHistoryPage),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn list_chat(
    State(state): State<SharedState>,
    ValidQuery(query): ValidQuery<ChatHistoryQuery>,
) -> Result<Json<ChatHistoryPage>, AppError> {
    Ok(Json(history_service::list(&state, query).await?))
}

/// Remove one chat log entry.
#[utoipa::path(
    delete,
    path = "/history/chat/{id}",
    tag = "history",
    params(("id" = Uuid, Path, description = "Chat entry identifier")),
    responses(
        (status = 200, description = "Entry deleted", body = ActionResponse),
        (status = 404, description = "Unknown entry", body = ErrorBody)
    )
)]
pub async fn delete_chat(
    State(state): State<SharedState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(history_service::delete(&state, id).await?))
}

/// Export the chat log as json, txt or csv.
#[utoipa::path(
    post,
    path = "/history/export",
    tag = "history",
    request_body = ExportRequest,
    responses(
        (status = 200, description = "Exported history", body = ExportResponse),
        (status = 400, description = "Unsupported format", body = ErrorBody)
    )
)]
pub async fn export_chat(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<ExportRequest>,
) -> Result<Json<ExportResponse>, AppError> {
    Ok(Json(history_service::export(&state, payload).await?))
}

/// Chat and session activity over the last `days` days.
#[utoipa::path(
    get,
    path = "/history/stats/overview",
    tag = "history",
    params(OverviewQuery),
    responses(
        (status = 200, description = "Activity overview", body = HistoryOverview),
        (status = 400, description = "Invalid window", body = ErrorBody),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn overview(
    State(state): State<SharedState>,
    ValidQuery(query): ValidQuery<OverviewQuery>,
) -> Result<Json<HistoryOverview>, AppError> {
    Ok(Json(history_service::overview(&state, query).await?))
}
