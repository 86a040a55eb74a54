use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::{
        common::ActionResponse,
        session::{
            AdvanceResponse, FinishSummary, SessionListItem, SessionListQuery, SessionSnapshot,
            TallyView, VoteRequest,
        },
    },
    error::{AppError, ErrorBody},
    routes::extract::{AppPath, ValidJson, ValidQuery},
    services::{phase_controller, voting},
    state::SharedState,
};

/// Routes operating on existing sessions, whatever their mode.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/advance", post(advance_session))
        .route("/sessions/{id}/votes", post(cast_vote))
        .route("/sessions/{id}/finish", post(finish_session))
}

/// List sessions, newest first.
#[utoipa::path(
    get,
    path = "/sessions",
    tag = "sessions",
    params(SessionListQuery),
    responses(
        (status = 200, description = "Sessions matching the filters", body = [SessionListItem]),
        (status = 400, description = "Unknown mode or invalid limit", body = ErrorBody),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn list_sessions(
    State(state): State<SharedState>,
    ValidQuery(query): ValidQuery<SessionListQuery>,
) -> Result<Json<Vec<SessionListItem>>, AppError> {
    Ok(Json(phase_controller::list(&state, query).await?))
}

/// Full snapshot of one session.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session snapshot", body = SessionSnapshot),
        (status = 404, description = "Unknown session", body = ErrorBody)
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    AppPath(id): AppPath<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(phase_controller::status(&state, &id).await?))
}

/// Delete one session.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session deleted", body = ActionResponse),
        (status = 404, description = "Unknown session", body = ErrorBody)
    )
)]
pub async fn delete_session(
    State(state): State<SharedState>,
    AppPath(id): AppPath<String>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(phase_controller::delete(&state, &id).await?))
}

/// Generate the next round, or finish the session once its round limit is passed.
#[utoipa::path(
    post,
    path = "/sessions/{id}/advance",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Next round or final summary", body = AdvanceResponse),
        (status = 404, description = "Unknown session", body = ErrorBody),
        (status = 409, description = "Session already finished", body = ErrorBody)
    )
)]
pub async fn advance_session(
    State(state): State<SharedState>,
    AppPath(id): AppPath<String>,
) -> Result<Json<AdvanceResponse>, AppError> {
    Ok(Json(phase_controller::advance(&state, &id).await?))
}

/// Cast a vote on one round.
#[utoipa::path(
    post,
    path = "/sessions/{id}/votes",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Updated tally", body = TallyView),
        (status = 400, description = "Invalid vote target or score", body = ErrorBody),
        (status = 404, description = "Unknown session or round", body = ErrorBody),
        (status = 409, description = "Round closed or session finished", body = ErrorBody)
    )
)]
pub async fn cast_vote(
    State(state): State<SharedState>,
    AppPath(id): AppPath<String>,
    ValidJson(payload): ValidJson<VoteRequest>,
) -> Result<Json<TallyView>, AppError> {
    Ok(Json(voting::vote(&state, &id, payload).await?))
}

/// Finish a session and compute its final standings.
#[utoipa::path(
    post,
    path = "/sessions/{id}/finish",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Final summary", body = FinishSummary),
        (status = 404, description = "Unknown session", body = ErrorBody),
        (status = 409, description = "Session already finished", body = ErrorBody)
    )
)]
pub async fn finish_session(
    State(state): State<SharedState>,
    AppPath(id): AppPath<String>,
) -> Result<Json<FinishSummary>, AppError> {
    Ok(Json(phase_controller::finish(&state, &id).await?))
}
