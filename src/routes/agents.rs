use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::agents::{
        AgentCatalogue, RealityShowRequest, RealityShowResponse, RoastRequest, RoastResponse,
    },
    error::{AppError, ErrorBody},
    routes::extract::ValidJson,
    services::agents_service,
    state::SharedState,
};

/// Agent catalogue and the agent entertainment modes. None of them need storage.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/agents", get(list_agents))
        .route("/agents/roast", post(roast))
        .route("/agents/reality-show", post(reality_show))
}

/// Every agent with its personality card.
#[utoipa::path(
    get,
    path = "/agents",
    tag = "agents",
    responses((status = 200, description = "Agent catalogue", body = AgentCatalogue))
)]
pub async fn list_agents() -> Json<AgentCatalogue> {
    Json(agents_service::catalogue())
}

/// Roast the user or one of the agents.
#[utoipa::path(
    post,
    path = "/agents/roast",
    tag = "agents",
    request_body = RoastRequest,
    responses(
        (status = 200, description = "Roast", body = RoastResponse),
        (status = 400, description = "Invalid request", body = ErrorBody)
    )
)]
pub async fn roast(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<RoastRequest>,
) -> Result<Json<RoastResponse>, AppError> {
    Ok(Json(agents_service::roast(&state, payload).await?))
}

/// Let Adam and Beata argue dramatically about a topic.
#[utoipa::path(
    post,
    path = "/agents/reality-show",
    tag = "agents",
    request_body = RealityShowRequest,
    responses(
        (status = 200, description = "Reality show episode", body = RealityShowResponse),
        (status = 400, description = "Invalid request", body = ErrorBody)
    )
)]
pub async fn reality_show(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<RealityShowRequest>,
) -> Result<Json<RealityShowResponse>, AppError> {
    Ok(Json(agents_service::reality_show(&state, payload).await?))
}
