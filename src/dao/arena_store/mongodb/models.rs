use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{ChatLogEntity, SessionBodyEntity, SessionEntity};

use super::error::MongoDaoError;

/// Session as stored in the `sessions` collection. Scalars stay top-level so they can be
/// indexed, the body is an embedded document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSessionDocument {
    #[serde(rename = "_id")]
    id: String,
    schema_version: u32,
    mode: String,
    phase: String,
    active: bool,
    created_at: DateTime,
    updated_at: DateTime,
    body: SessionBodyEntity,
}

impl From<SessionEntity> for MongoSessionDocument {
    fn from(value: SessionEntity) -> Self {
        Self {
            id: value.id,
            schema_version: value.schema_version,
            mode: value.mode,
            phase: value.phase,
            active: value.active,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
            body: value.body,
        }
    }
}

impl From<MongoSessionDocument> for SessionEntity {
    fn from(value: MongoSessionDocument) -> Self {
        Self {
            id: value.id,
            schema_version: value.schema_version,
            mode: value.mode,
            phase: value.phase,
            active: value.active,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
            body: value.body,
        }
    }
}

/// Chat log entry as stored in the `chat_log` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoChatDocument {
    #[serde(rename = "_id")]
    id: String,
    persona: String,
    query: String,
    response: String,
    session_id: Option<String>,
    created_at: DateTime,
    response_time_ms: i64,
    #[serde(default)]
    fallback: bool,
}

impl From<ChatLogEntity> for MongoChatDocument {
    fn from(value: ChatLogEntity) -> Self {
        Self {
            id: value.id.to_string(),
            persona: value.persona,
            query: value.query,
            response: value.response,
            session_id: value.session_id,
            created_at: DateTime::from_system_time(value.created_at),
            response_time_ms: i64::try_from(value.response_time_ms).unwrap_or(i64::MAX),
            fallback: value.fallback,
        }
    }
}

impl TryFrom<MongoChatDocument> for ChatLogEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoChatDocument) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&value.id).map_err(|source| MongoDaoError::InvalidChatId {
            id: value.id.clone(),
            source,
        })?;
        Ok(Self {
            id,
            persona: value.persona,
            query: value.query,
            response: value.response,
            session_id: value.session_id,
            created_at: value.created_at.to_system_time(),
            response_time_ms: u64::try_from(value.response_time_ms).unwrap_or_default(),
            fallback: value.fallback,
        })
    }
}
