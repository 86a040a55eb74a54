use std::{env, future::Future, str::FromStr, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{
        arena_store::{ArenaStore, memory::MemoryArenaStore},
        storage::StorageError,
    },
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Environment variable selecting the storage backend.
pub const STORE_ENV: &str = "ARENA_STORE";

/// Storage backend the server persists sessions and chat logs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    /// Process-local maps, lost on restart.
    #[default]
    Memory,
    Mongo,
    Couch,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "memory" => Ok(StoreKind::Memory),
            "mongo" | "mongodb" => Ok(StoreKind::Mongo),
            "couch" | "couchdb" => Ok(StoreKind::Couch),
            other => Err(format!("unknown storage backend `{other}`")),
        }
    }
}

impl StoreKind {
    /// Read [`STORE_ENV`], defaulting to memory when unset or unknown.
    pub fn from_env() -> Self {
        let raw = env::var(STORE_ENV).unwrap_or_default();
        raw.parse().unwrap_or_else(|err: String| {
            warn!(error = %err, "falling back to in-memory storage");
            StoreKind::Memory
        })
    }
}

/// Open a connection to the backend described by `kind`.
pub async fn connect(kind: StoreKind) -> Result<Arc<dyn ArenaStore>, StorageError> {
    match kind {
        StoreKind::Memory => Ok(Arc::new(MemoryArenaStore::new())),
        #[cfg(feature = "mongo-store")]
        StoreKind::Mongo => {
            use crate::dao::arena_store::mongodb::{MongoArenaStore, MongoConfig};

            let config = MongoConfig::from_env().await?;
            let store = MongoArenaStore::connect(config).await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "couch-store")]
        StoreKind::Couch => {
            use crate::dao::arena_store::couchdb::{CouchArenaStore, CouchConfig};

            let config = CouchConfig::from_env()?;
            let store = CouchArenaStore::connect(config).await?;
            Ok(Arc::new(store))
        }
        #[allow(unreachable_patterns)]
        other => Err(StorageError::unavailable(
            format!("{other:?} storage is not compiled in"),
            std::io::Error::from(std::io::ErrorKind::Unsupported),
        )),
    }
}

/// Keep a storage connection installed in `state`, flipping degraded mode while it is lost.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn ArenaStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.set_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                watch_health(&state, store.as_ref()).await;
                state.clear_store().await;
                sleep(delay).await;
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Poll `store` until it stays unreachable after the reconnect budget.
async fn watch_health(state: &SharedState, store: &dyn ArenaStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false);
                }
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                if !reconnect(state, store).await {
                    warn!("exhausted storage reconnect attempts; staying in degraded mode");
                    return;
                }
                state.update_degraded(false);
            }
        }
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

async fn reconnect(state: &SharedState, store: &dyn ArenaStore) -> bool {
    let mut backoff = INITIAL_DELAY;
    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnection succeeded");
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(attempt, error = %err, "storage reconnect failed; entering degraded mode");
                    state.update_degraded(true);
                } else {
                    warn!(attempt, error = %err, "storage reconnect attempt failed");
                }
                sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_DELAY);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        services::generation::testing::{FailingBackend, generator},
        state::AppState,
    };

    #[test]
    fn store_kind_parses_known_names() {
        assert_eq!("memory".parse::<StoreKind>(), Ok(StoreKind::Memory));
        assert_eq!("".parse::<StoreKind>(), Ok(StoreKind::Memory));
        assert_eq!("MongoDB".parse::<StoreKind>(), Ok(StoreKind::Mongo));
        assert_eq!("couch".parse::<StoreKind>(), Ok(StoreKind::Couch));
        assert!("redis".parse::<StoreKind>().is_err());
    }

    #[tokio::test]
    async fn memory_connection_never_fails() {
        let store = connect(StoreKind::Memory).await.expect("memory store");
        store.health_check().await.expect("healthy");
    }

    #[tokio::test]
    async fn supervisor_installs_the_store() {
        let state = AppState::new(AppConfig::default(), generator(FailingBackend));
        assert!(state.is_degraded());

        let task = tokio::spawn(run(state.clone(), || connect(StoreKind::Memory)));
        let mut watcher = state.degraded_watcher();
        tokio::time::timeout(Duration::from_secs(2), watcher.wait_for(|degraded| !degraded))
            .await
            .expect("left degraded mode in time")
            .expect("watch channel open");
        task.abort();

        assert!(state.require_store().await.is_ok());
    }
}
