pub mod locks;
pub mod mode;
pub mod phase;
pub mod scoring;
pub mod session;

use std::{future::Future, sync::Arc};

use tokio::sync::{RwLock, watch};
use tokio::time::timeout;
use tracing::warn;

use crate::{
    config::AppConfig, dao::arena_store::ArenaStore, error::ServiceError,
    services::generation::ContentGenerator,
};

use self::locks::SessionLocks;

pub type SharedState = Arc<AppState>;

/// Central application state: storage handle, per-session locks and the content generator.
pub struct AppState {
    store: RwLock<Option<Arc<dyn ArenaStore>>>,
    degraded: watch::Sender<bool>,
    locks: SessionLocks,
    generator: ContentGenerator,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, generator: ContentGenerator) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            degraded: degraded_tx,
            locks: SessionLocks::new(),
            generator,
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn generator(&self) -> &ContentGenerator {
        &self.generator
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn ArenaStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Current store, or [`ServiceError::Degraded`] while storage is missing or unhealthy.
    pub async fn require_store(&self) -> Result<Arc<dyn ArenaStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn ArenaStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Run `work` with exclusive access to the session `id`, bounded by the configured
    /// operation timeout.
    pub async fn run_locked<F, Fut, T>(&self, id: &str, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let limit = self.config.sessions.operation_timeout;
        let locked = async {
            let _guard = self.locks.lock(id).await;
            work().await
        };

        match timeout(limit, locked).await {
            Ok(result) => result,
            Err(_) => {
                warn!(session_id = %id, ?limit, "session operation timed out");
                Err(ServiceError::Timeout)
            }
        }
    }
}
