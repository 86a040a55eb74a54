//! Process-local [`ArenaStore`] used when no database is configured and by tests.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    arena_store::ArenaStore,
    models::{ChatLogEntity, ChatLogFilter, SessionEntity, SessionFilter, page_newest_first},
    storage::{StorageError, StorageResult},
};

/// In-memory store backed by concurrent maps. Data lives as long as the process.
#[derive(Clone, Default)]
pub struct MemoryArenaStore {
    sessions: Arc<DashMap<String, SessionEntity>>,
    chat: Arc<DashMap<Uuid, ChatLogEntity>>,
}

impl MemoryArenaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArenaStore for MemoryArenaStore {
    fn insert_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let sessions = self.sessions.clone();
        Box::pin(async move {
            match sessions.entry(session.id.clone()) {
                Entry::Occupied(entry) => Err(StorageError::DuplicateKey {
                    id: entry.key().clone(),
                }),
                Entry::Vacant(entry) => {
                    entry.insert(session);
                    Ok(())
                }
            }
        })
    }

    fn replace_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let sessions = self.sessions.clone();
        Box::pin(async move {
            sessions.insert(session.id.clone(), session);
            Ok(())
        })
    }

    fn find_session(&self, id: String) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let sessions = self.sessions.clone();
        Box::pin(async move { Ok(sessions.get(&id).map(|entry| entry.value().clone())) })
    }

    fn list_sessions(
        &self,
        filter: SessionFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let sessions = self.sessions.clone();
        Box::pin(async move {
            let matching = sessions
                .iter()
                .filter(|entry| filter.matches(entry.value()))
                .map(|entry| entry.value().clone())
                .collect::<Vec<_>>();
            Ok(page_newest_first(
                matching,
                |session| session.created_at,
                0,
                filter.limit,
            ))
        })
    }

    fn delete_session(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let sessions = self.sessions.clone();
        Box::pin(async move { Ok(sessions.remove(&id).is_some()) })
    }

    fn append_chat(&self, entry: ChatLogEntity) -> BoxFuture<'static, StorageResult<()>> {
        let chat = self.chat.clone();
        Box::pin(async move {
            chat.insert(entry.id, entry);
            Ok(())
        })
    }

    fn list_chat(
        &self,
        filter: ChatLogFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<ChatLogEntity>>> {
        let chat = self.chat.clone();
        Box::pin(async move {
            let matching = chat
                .iter()
                .filter(|entry| filter.matches(entry.value()))
                .map(|entry| entry.value().clone())
                .collect::<Vec<_>>();
            Ok(page_newest_first(
                matching,
                |entry| entry.created_at,
                filter.offset,
                filter.limit,
            ))
        })
    }

    fn count_chat(&self, filter: ChatLogFilter) -> BoxFuture<'static, StorageResult<usize>> {
        let chat = self.chat.clone();
        Box::pin(async move {
            Ok(chat
                .iter()
                .filter(|entry| filter.matches(entry.value()))
                .count())
        })
    }

    fn delete_chat(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let chat = self.chat.clone();
        Box::pin(async move { Ok(chat.remove(&id).is_some()) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use indexmap::IndexMap;

    use super::*;
    use crate::dao::models::{SESSION_SCHEMA_VERSION, SessionBodyEntity};

    fn session(id: &str, mode: &str, active: bool, age_secs: u64) -> SessionEntity {
        let created_at = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000 - age_secs);
        SessionEntity {
            id: id.into(),
            schema_version: SESSION_SCHEMA_VERSION,
            mode: mode.into(),
            phase: "warm_up".into(),
            active,
            created_at,
            updated_at: created_at,
            body: SessionBodyEntity {
                round_number: 1,
                max_rounds: 5,
                intensity_level: 0.1,
                participants: vec!["Adam".into(), "Beata".into()],
                focus_agent: None,
                topic: "pizza".into(),
                rounds: Vec::new(),
                beliefs: IndexMap::new(),
                evidence: Vec::new(),
                finished_at: None,
                final_winner: None,
            },
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_ids() {
        let store = MemoryArenaStore::new();
        store
            .insert_session(session("a", "gladiator", true, 0))
            .await
            .unwrap();

        match store.insert_session(session("a", "karaoke", true, 0)).await {
            Err(StorageError::DuplicateKey { id }) => assert_eq!(id, "a"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_filters_and_orders_newest_first() {
        let store = MemoryArenaStore::new();
        store
            .insert_session(session("old", "gladiator", true, 30))
            .await
            .unwrap();
        store
            .insert_session(session("new", "gladiator", true, 10))
            .await
            .unwrap();
        store
            .insert_session(session("done", "gladiator", false, 5))
            .await
            .unwrap();
        store
            .insert_session(session("other", "tsunami", true, 1))
            .await
            .unwrap();

        let listed = store
            .list_sessions(SessionFilter {
                mode: Some("gladiator".into()),
                active: Some(true),
                limit: None,
            })
            .await
            .unwrap();
        let ids: Vec<_> = listed.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);

        let limited = store
            .list_sessions(SessionFilter {
                limit: Some(2),
                ..SessionFilter::default()
            })
            .await
            .unwrap();
        let ids: Vec<_> = limited.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["other", "done"]);
    }

    #[tokio::test]
    async fn delete_reports_missing_sessions() {
        let store = MemoryArenaStore::new();
        store
            .insert_session(session("a", "gladiator", true, 0))
            .await
            .unwrap();
        assert!(store.delete_session("a".into()).await.unwrap());
        assert!(!store.delete_session("a".into()).await.unwrap());
        assert!(store.find_session("a".into()).await.unwrap().is_none());
    }
}
