use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

use crate::dao::storage::StorageError;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to insert session `{id}`")]
    InsertSession {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to save session `{id}`")]
    SaveSession {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load session `{id}`")]
    LoadSession {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to list sessions")]
    ListSessions {
        #[source]
        source: MongoError,
    },
    #[error("failed to delete session `{id}`")]
    DeleteSession {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to append chat entry `{id}`")]
    AppendChat {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to list chat entries")]
    ListChat {
        #[source]
        source: MongoError,
    },
    #[error("failed to count chat entries")]
    CountChat {
        #[source]
        source: MongoError,
    },
    #[error("failed to delete chat entry `{id}`")]
    DeleteChat {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("chat entry `{id}` has an invalid identifier")]
    InvalidChatId {
        id: String,
        #[source]
        source: uuid::Error,
    },
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

fn is_decode_failure(err: &MongoError) -> bool {
    matches!(err.kind.as_ref(), ErrorKind::BsonDeserialization(_))
}

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::InsertSession { id, source } if is_duplicate_key(&source) => {
                StorageError::DuplicateKey { id }
            }
            MongoDaoError::LoadSession { id, source } if is_decode_failure(&source) => {
                StorageError::corrupted(id, source.to_string())
            }
            MongoDaoError::InvalidChatId { id, source } => {
                StorageError::corrupted(id, source.to_string())
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
