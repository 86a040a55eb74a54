use std::{future::Future, sync::Arc, time::SystemTime};

use crate::{
    dao::{arena_store::ArenaStore, models::SessionFilter},
    error::ServiceError,
    state::{SharedState, session::Session},
};

/// Persist a brand new session.
pub async fn create(state: &SharedState, session: Session) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    store.insert_session(session.into()).await?;
    Ok(())
}

/// Load the session `id`.
pub async fn get(state: &SharedState, id: &str) -> Result<Session, ServiceError> {
    let store = state.require_store().await?;
    load(&store, id).await
}

/// Sessions matching `filter`, newest first.
pub async fn list(state: &SharedState, filter: SessionFilter) -> Result<Vec<Session>, ServiceError> {
    let store = state.require_store().await?;
    let entities = store.list_sessions(filter).await?;
    entities
        .into_iter()
        .map(|entity| Session::try_from(entity).map_err(ServiceError::from))
        .collect()
}

/// Remove the session `id`, waiting for any in-flight update of it.
pub async fn delete(state: &SharedState, id: &str) -> Result<(), ServiceError> {
    state
        .run_locked(id, || async {
            let store = state.require_store().await?;
            if store.delete_session(id.to_owned()).await? {
                Ok(())
            } else {
                Err(not_found(id))
            }
        })
        .await
}

/// Load, mutate and persist the session `id` under its lock.
///
/// `work` receives the loaded session with `updated_at` already refreshed and returns the
/// mutated session along with the caller's result. Nothing is written when `work` fails or
/// the operation times out.
pub async fn update<F, Fut, T>(state: &SharedState, id: &str, work: F) -> Result<T, ServiceError>
where
    F: FnOnce(Session) -> Fut,
    Fut: Future<Output = Result<(Session, T), ServiceError>>,
{
    state
        .run_locked(id, || async {
            let store = state.require_store().await?;
            let mut session = load(&store, id).await?;
            session.updated_at = SystemTime::now();

            let (session, value) = work(session).await?;
            store.replace_session(session.into()).await?;
            Ok(value)
        })
        .await
}

async fn load(store: &Arc<dyn ArenaStore>, id: &str) -> Result<Session, ServiceError> {
    let Some(entity) = store.find_session(id.to_owned()).await? else {
        return Err(not_found(id));
    };
    Ok(Session::try_from(entity)?)
}

fn not_found(id: &str) -> ServiceError {
    ServiceError::NotFound(format!("session `{id}` not found"))
}
