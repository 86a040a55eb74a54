use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Storage status ("ok" or "degraded").
    pub status: String,
    /// Text generation backend status ("up" or "down").
    pub generation: String,
}

impl HealthResponse {
    /// Create a health response indicating storage is operational.
    pub fn ok(generation_up: bool) -> Self {
        Self {
            status: "ok".to_string(),
            generation: generation_label(generation_up),
        }
    }

    /// Create a health response indicating the system is in degraded mode.
    pub fn degraded(generation_up: bool) -> Self {
        Self {
            status: "degraded".to_string(),
            generation: generation_label(generation_up),
        }
    }
}

fn generation_label(up: bool) -> String {
    if up { "up" } else { "down" }.to_string()
}
