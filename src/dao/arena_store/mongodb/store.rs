use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{DateTime, Document, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoChatDocument, MongoSessionDocument},
};
use crate::dao::{
    arena_store::ArenaStore,
    models::{ChatLogEntity, ChatLogFilter, SessionEntity, SessionFilter},
    storage::StorageResult,
};

const SESSION_COLLECTION_NAME: &str = "sessions";
const CHAT_COLLECTION_NAME: &str = "chat_log";

/// MongoDB-backed [`ArenaStore`] implementation.
#[derive(Clone)]
pub struct MongoArenaStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoArenaStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let sessions = database.collection::<Document>(SESSION_COLLECTION_NAME);
        let session_index = IndexModel::builder()
            .keys(doc! {"mode": 1, "active": 1, "created_at": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("session_mode_active_created_idx".to_owned()))
                    .build(),
            )
            .build();
        sessions
            .create_index(session_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SESSION_COLLECTION_NAME,
                index: "mode,active,created_at",
                source,
            })?;

        let chat = database.collection::<Document>(CHAT_COLLECTION_NAME);
        let chat_index = IndexModel::builder()
            .keys(doc! {"created_at": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("chat_created_idx".to_owned()))
                    .build(),
            )
            .build();
        chat.create_index(chat_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: CHAT_COLLECTION_NAME,
                index: "created_at",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn sessions(&self) -> Collection<MongoSessionDocument> {
        self.database()
            .await
            .collection::<MongoSessionDocument>(SESSION_COLLECTION_NAME)
    }

    async fn chat(&self) -> Collection<MongoChatDocument> {
        self.database()
            .await
            .collection::<MongoChatDocument>(CHAT_COLLECTION_NAME)
    }

    async fn insert_session(&self, session: SessionEntity) -> MongoResult<()> {
        let id = session.id.clone();
        let document: MongoSessionDocument = session.into();
        self.sessions()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::InsertSession { id, source })?;
        Ok(())
    }

    async fn replace_session(&self, session: SessionEntity) -> MongoResult<()> {
        let id = session.id.clone();
        let document: MongoSessionDocument = session.into();
        self.sessions()
            .await
            .replace_one(doc! {"_id": &id}, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveSession { id, source })?;
        Ok(())
    }

    async fn find_session(&self, id: String) -> MongoResult<Option<SessionEntity>> {
        let document = self
            .sessions()
            .await
            .find_one(doc! {"_id": &id})
            .await
            .map_err(|source| MongoDaoError::LoadSession { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn list_sessions(&self, filter: SessionFilter) -> MongoResult<Vec<SessionEntity>> {
        let mut query = doc! {};
        if let Some(mode) = filter.mode {
            query.insert("mode", mode);
        }
        if let Some(active) = filter.active {
            query.insert("active", active);
        }

        let collection = self.sessions().await;
        let mut find = collection.find(query).sort(doc! {"created_at": -1});
        if let Some(limit) = filter.limit {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let documents: Vec<MongoSessionDocument> = find
            .await
            .map_err(|source| MongoDaoError::ListSessions { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListSessions { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_session(&self, id: String) -> MongoResult<bool> {
        let result = self
            .sessions()
            .await
            .delete_one(doc! {"_id": &id})
            .await
            .map_err(|source| MongoDaoError::DeleteSession { id, source })?;
        Ok(result.deleted_count > 0)
    }

    async fn append_chat(&self, entry: ChatLogEntity) -> MongoResult<()> {
        let id = entry.id.to_string();
        let document: MongoChatDocument = entry.into();
        self.chat()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::AppendChat { id, source })?;
        Ok(())
    }

    async fn list_chat(&self, filter: ChatLogFilter) -> MongoResult<Vec<ChatLogEntity>> {
        let query = chat_query(&filter);
        let collection = self.chat().await;
        let mut find = collection
            .find(query)
            .sort(doc! {"created_at": -1})
            .skip(u64::try_from(filter.offset).unwrap_or(u64::MAX));
        if let Some(limit) = filter.limit {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let documents: Vec<MongoChatDocument> = find
            .await
            .map_err(|source| MongoDaoError::ListChat { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListChat { source })?;

        documents.into_iter().map(ChatLogEntity::try_from).collect()
    }

    async fn count_chat(&self, filter: ChatLogFilter) -> MongoResult<usize> {
        let count = self
            .chat()
            .await
            .count_documents(chat_query(&filter))
            .await
            .map_err(|source| MongoDaoError::CountChat { source })?;
        Ok(usize::try_from(count).unwrap_or(usize::MAX))
    }

    async fn delete_chat(&self, id: Uuid) -> MongoResult<bool> {
        let id = id.to_string();
        let result = self
            .chat()
            .await
            .delete_one(doc! {"_id": &id})
            .await
            .map_err(|source| MongoDaoError::DeleteChat { id, source })?;
        Ok(result.deleted_count > 0)
    }
}

/// Selector shared by chat listing and counting.
fn chat_query(filter: &ChatLogFilter) -> Document {
    let mut query = doc! {};
    if let Some(persona) = &filter.persona {
        query.insert("persona", persona.as_str());
    }
    if let Some(session_id) = &filter.session_id {
        query.insert("session_id", session_id.as_str());
    }
    if let Some(since) = filter.since {
        query.insert("created_at", doc! {"$gte": DateTime::from_system_time(since)});
    }
    query
}

impl ArenaStore for MongoArenaStore {
    fn insert_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_session(session).await.map_err(Into::into) })
    }

    fn replace_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.replace_session(session).await.map_err(Into::into) })
    }

    fn find_session(&self, id: String) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_session(id).await.map_err(Into::into) })
    }

    fn list_sessions(
        &self,
        filter: SessionFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_sessions(filter).await.map_err(Into::into) })
    }

    fn delete_session(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_session(id).await.map_err(Into::into) })
    }

    fn append_chat(&self, entry: ChatLogEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.append_chat(entry).await.map_err(Into::into) })
    }

    fn list_chat(
        &self,
        filter: ChatLogFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<ChatLogEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_chat(filter).await.map_err(Into::into) })
    }

    fn count_chat(&self, filter: ChatLogFilter) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move { store.count_chat(filter).await.map_err(Into::into) })
    }

    fn delete_chat(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_chat(id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
