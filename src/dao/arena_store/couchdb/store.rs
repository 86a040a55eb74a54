use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, from_value};
use uuid::Uuid;

use crate::dao::{
    arena_store::ArenaStore,
    models::{ChatLogEntity, ChatLogFilter, SessionEntity, SessionFilter, page_newest_first},
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CHAT_PREFIX, CouchChatDocument, CouchSessionDocument, END_SUFFIX,
        RevisionOnly, SESSION_PREFIX, chat_doc_id, session_doc_id,
    },
};

/// CouchDB-backed [`ArenaStore`]. Sessions and chat entries share one database and are
/// told apart by their document id prefix.
#[derive(Clone)]
pub struct CouchArenaStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchArenaStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config.credentials.map(|credentials| {
            (
                Arc::<str>::from(credentials.username),
                Arc::<str>::from(credentials.password),
            )
        });

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            Some((ref user, ref pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        self.authorize(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = format!("{}/{}", self.base_url, self.database);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorize(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_owned(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let value = response.json::<Value>().await.map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_owned(),
                        source,
                    }
                })?;
                from_value(value)
                    .map(Some)
                    .map_err(|source| CouchDaoError::DeserializeValue {
                        path: doc_id.to_owned(),
                        source,
                    })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_owned(),
                status: other,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_owned(),
                source,
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(CouchDaoError::DocumentConflict {
                doc_id: doc_id.to_owned(),
            }),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_owned(),
                status: other,
            }),
        }
    }

    /// Delete `doc_id` at its current revision. Returns `false` when it does not exist.
    async fn delete_document(&self, doc_id: &str) -> CouchResult<bool> {
        let Some(current) = self.get_document::<RevisionOnly>(doc_id).await? else {
            return Ok(false);
        };

        let response = self
            .request(Method::DELETE, doc_id)
            .query(&[("rev", current.rev.as_str())])
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_owned(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_owned(),
                status: other,
            }),
        }
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_owned()),
            ("startkey", format!("\"{prefix}\"")),
            ("endkey", format!("\"{prefix}{END_SUFFIX}\"")),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_owned(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_owned(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_owned(),
                source,
            }
        })?;

        let mut documents = Vec::with_capacity(payload.rows.len());
        for row in payload.rows {
            if let Some(doc) = row.doc {
                let parsed = from_value(doc).map_err(|source| CouchDaoError::DeserializeValue {
                    path: row.id.clone(),
                    source,
                })?;
                documents.push(parsed);
            }
        }

        Ok(documents)
    }
}

impl ArenaStore for CouchArenaStore {
    fn insert_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = session_doc_id(&session.id);
            let doc = CouchSessionDocument::from((session, None));
            store.put_document(&doc_id, &doc).await.map_err(Into::into)
        })
    }

    fn replace_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = session_doc_id(&session.id);
            let rev = store
                .get_document::<RevisionOnly>(&doc_id)
                .await?
                .map(|current| current.rev);
            let doc = CouchSessionDocument::from((session, rev));
            store.put_document(&doc_id, &doc).await.map_err(Into::into)
        })
    }

    fn find_session(&self, id: String) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = session_doc_id(&id);
            let maybe_doc = store.get_document::<CouchSessionDocument>(&doc_id).await?;
            Ok(maybe_doc.map(Into::into))
        })
    }

    fn list_sessions(
        &self,
        filter: SessionFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store
                .list_documents::<CouchSessionDocument>(SESSION_PREFIX)
                .await?;
            let matching = docs
                .into_iter()
                .map(SessionEntity::from)
                .filter(|session| filter.matches(session))
                .collect();
            Ok(page_newest_first(
                matching,
                |session| session.created_at,
                0,
                filter.limit,
            ))
        })
    }

    fn delete_session(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_document(&session_doc_id(&id))
                .await
                .map_err(Into::into)
        })
    }

    fn append_chat(&self, entry: ChatLogEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = chat_doc_id(entry.id);
            let doc = CouchChatDocument::from(entry);
            store.put_document(&doc_id, &doc).await.map_err(Into::into)
        })
    }

    fn list_chat(
        &self,
        filter: ChatLogFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<ChatLogEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store.list_documents::<CouchChatDocument>(CHAT_PREFIX).await?;
            let mut matching = Vec::with_capacity(docs.len());
            for doc in docs {
                let entry = ChatLogEntity::try_from(doc)?;
                if filter.matches(&entry) {
                    matching.push(entry);
                }
            }
            Ok(page_newest_first(
                matching,
                |entry| entry.created_at,
                filter.offset,
                filter.limit,
            ))
        })
    }

    fn count_chat(&self, filter: ChatLogFilter) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store.list_documents::<CouchChatDocument>(CHAT_PREFIX).await?;
            let mut count = 0;
            for doc in docs {
                if filter.matches(&ChatLogEntity::try_from(doc)?) {
                    count += 1;
                }
            }
            Ok(count)
        })
    }

    fn delete_chat(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_document(&chat_doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = format!("{}/{}", store.base_url, store.database);
            let response = store
                .authorize(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::DatabaseQuery {
                    database: store.database.to_string(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::DatabaseStatus {
                    database: store.database.to_string(),
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
