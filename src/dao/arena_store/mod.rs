#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{ChatLogEntity, ChatLogFilter, SessionEntity, SessionFilter};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for game sessions and the persona chat log.
pub trait ArenaStore: Send + Sync {
    /// Persist a new session, failing with `DuplicateKey` when the id is taken.
    fn insert_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Overwrite an existing session document as a whole.
    fn replace_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_session(&self, id: String) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>>;
    /// Sessions matching `filter`, newest first.
    fn list_sessions(
        &self,
        filter: SessionFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>>;
    /// Returns `true` when something was removed.
    fn delete_session(&self, id: String) -> BoxFuture<'static, StorageResult<bool>>;
    fn append_chat(&self, entry: ChatLogEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Chat entries matching `filter`, newest first.
    fn list_chat(&self, filter: ChatLogFilter)
    -> BoxFuture<'static, StorageResult<Vec<ChatLogEntity>>>;
    /// Number of chat entries matching `filter`, ignoring its offset and limit.
    fn count_chat(&self, filter: ChatLogFilter) -> BoxFuture<'static, StorageResult<usize>>;
    fn delete_chat(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
