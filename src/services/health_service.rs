use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report storage status and whether the generation backend answers, logging problems.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    let generation_up = state.generator().backend_healthy().await;
    if !generation_up {
        warn!("generation backend unreachable; answers will use fallback lines");
    }

    if state.is_degraded() {
        HealthResponse::degraded(generation_up)
    } else {
        HealthResponse::ok(generation_up)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::arena_store::memory::MemoryArenaStore,
        services::generation::testing::{EchoBackend, FailingBackend, generator},
        state::AppState,
    };

    #[tokio::test]
    async fn degraded_without_store() {
        let state = AppState::new(AppConfig::default(), generator(FailingBackend));
        let health = health_status(&state).await;
        assert_eq!(health.status, "degraded");
        assert_eq!(health.generation, "down");
    }

    #[tokio::test]
    async fn ok_once_a_store_is_installed() {
        let state = AppState::new(AppConfig::default(), generator(EchoBackend::default()));
        state.set_store(Arc::new(MemoryArenaStore::new())).await;
        let health = health_status(&state).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.generation, "up");
    }
}
