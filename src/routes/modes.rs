use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::session::{ModeStats, RoundResult, SongCatalogue, StartSessionRequest},
    error::{AppError, ErrorBody},
    routes::extract::{AppPath, ValidJson},
    services::phase_controller,
    state::SharedState,
};

/// Routes addressed by game mode.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/modes/karaoke/songs", get(karaoke_songs))
        .route("/modes/{mode}/sessions", post(start_session))
        .route("/modes/{mode}/stats", get(mode_stats))
}

/// Start a new session of `mode` and generate its first round.
#[utoipa::path(
    post,
    path = "/modes/{mode}/sessions",
    tag = "modes",
    params(("mode" = String, Path, description = "gladiator, karaoke, tsunami or ufo-conspiracy")),
    request_body = StartSessionRequest,
    responses(
        (status = 200, description = "Session started", body = RoundResult),
        (status = 400, description = "Unknown mode or invalid configuration", body = ErrorBody),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn start_session(
    State(state): State<SharedState>,
    AppPath(mode): AppPath<String>,
    ValidJson(payload): ValidJson<StartSessionRequest>,
) -> Result<Json<RoundResult>, AppError> {
    let mode = phase_controller::parse_mode(&mode)?;
    Ok(Json(phase_controller::start(&state, mode, payload).await?))
}

/// Session counts of one mode.
#[utoipa::path(
    get,
    path = "/modes/{mode}/stats",
    tag = "modes",
    params(("mode" = String, Path, description = "gladiator, karaoke, tsunami or ufo-conspiracy")),
    responses(
        (status = 200, description = "Session counts", body = ModeStats),
        (status = 400, description = "Unknown mode", body = ErrorBody)
    )
)]
pub async fn mode_stats(
    State(state): State<SharedState>,
    AppPath(mode): AppPath<String>,
) -> Result<Json<ModeStats>, AppError> {
    let mode = phase_controller::parse_mode(&mode)?;
    Ok(Json(phase_controller::stats(&state, mode).await?))
}

/// Karaoke themes and their songs.
#[utoipa::path(
    get,
    path = "/modes/karaoke/songs",
    tag = "modes",
    responses((status = 200, description = "Song catalogue", body = SongCatalogue))
)]
pub async fn karaoke_songs() -> Json<SongCatalogue> {
    Json(phase_controller::songs())
}
