use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-session async locks. Entries are created on demand and removed once nobody holds or
/// waits for them.
#[derive(Default)]
pub struct SessionLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Exclusive access to one session until dropped.
pub struct SessionGuard<'a> {
    owner: &'a SessionLocks,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the session `id`.
    pub async fn lock(&self, id: &str) -> SessionGuard<'_> {
        let mutex = self.locks.entry(id.to_owned()).or_default().clone();
        let guard = mutex.lock_owned().await;
        SessionGuard {
            owner: self,
            id: id.to_owned(),
            guard: Some(guard),
        }
    }

    /// Number of sessions currently locked or awaited.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.owner
            .locks
            .remove_if(&self.id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn entries_are_pruned_after_release() {
        let locks = SessionLocks::new();
        {
            let _guard = locks.lock("a").await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn same_session_is_serialised() {
        let locks = Arc::new(SessionLocks::new());
        let guard = locks.lock("a").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock("a").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn different_sessions_do_not_block_each_other() {
        let locks = SessionLocks::new();
        let _a = locks.lock("a").await;
        let _b = tokio::time::timeout(Duration::from_millis(50), locks.lock("b"))
            .await
            .unwrap();
        assert_eq!(locks.len(), 2);
    }
}
