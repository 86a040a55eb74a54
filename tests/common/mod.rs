//! Shared fixtures: an offline generator and an arena backed by the in-memory store.

use std::{sync::Arc, time::Duration};

use chat_arena_back::{
    config::{AppConfig, SamplingOptions},
    dao::arena_store::memory::MemoryArenaStore,
    services::generation::{
        ContentGenerator,
        backend::{GenerationError, GenerationResult, TextBackend},
    },
    state::{AppState, SharedState},
};
use futures::future::BoxFuture;

/// Backend that is never reachable, forcing every line onto its fallback.
pub struct OfflineBackend;

impl TextBackend for OfflineBackend {
    fn generate(
        &self,
        _prompt: String,
        _options: SamplingOptions,
    ) -> BoxFuture<'static, GenerationResult<String>> {
        Box::pin(async { Err(GenerationError::NoModel) })
    }

    fn health_check(&self) -> BoxFuture<'static, GenerationResult<()>> {
        Box::pin(async { Err(GenerationError::NoModel) })
    }
}

/// Default configuration with a short generation deadline.
pub fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.generation.timeout = Duration::from_millis(50);
    config
}

/// State with `config`, an offline generator and a healthy in-memory store.
pub async fn arena_with(config: AppConfig) -> SharedState {
    let generator = ContentGenerator::new(Arc::new(OfflineBackend), &config.generation);
    let state = AppState::new(config, generator);
    state.set_store(Arc::new(MemoryArenaStore::new())).await;
    state
}

pub async fn arena() -> SharedState {
    arena_with(config()).await
}
