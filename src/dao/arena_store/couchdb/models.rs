use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::dao::models::{ChatLogEntity, SessionBodyEntity, SessionEntity};

use super::error::CouchDaoError;

pub const SESSION_PREFIX: &str = "session::";
pub const CHAT_PREFIX: &str = "chat::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Only the revision of a document, used before overwriting or deleting it.
#[derive(Debug, Deserialize)]
pub struct RevisionOnly {
    #[serde(rename = "_rev")]
    pub rev: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchSessionDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub schema_version: u32,
    pub mode: String,
    pub phase: String,
    pub active: bool,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    pub body: SessionBodyEntity,
}

impl From<(SessionEntity, Option<String>)> for CouchSessionDocument {
    fn from((session, rev): (SessionEntity, Option<String>)) -> Self {
        Self {
            id: session_doc_id(&session.id),
            rev,
            schema_version: session.schema_version,
            mode: session.mode,
            phase: session.phase,
            active: session.active,
            created_at: session.created_at,
            updated_at: session.updated_at,
            body: session.body,
        }
    }
}

impl From<CouchSessionDocument> for SessionEntity {
    fn from(doc: CouchSessionDocument) -> Self {
        Self {
            id: strip_prefix(&doc.id).to_owned(),
            schema_version: doc.schema_version,
            mode: doc.mode,
            phase: doc.phase,
            active: doc.active,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            body: doc.body,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchChatDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub persona: String,
    pub query: String,
    pub response: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub created_at: SystemTime,
    pub response_time_ms: u64,
    #[serde(default)]
    pub fallback: bool,
}

impl From<ChatLogEntity> for CouchChatDocument {
    fn from(entry: ChatLogEntity) -> Self {
        Self {
            id: chat_doc_id(entry.id),
            rev: None,
            persona: entry.persona,
            query: entry.query,
            response: entry.response,
            session_id: entry.session_id,
            created_at: entry.created_at,
            response_time_ms: entry.response_time_ms,
            fallback: entry.fallback,
        }
    }
}

impl TryFrom<CouchChatDocument> for ChatLogEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchChatDocument) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(strip_prefix(&doc.id)).map_err(|_| {
            CouchDaoError::InvalidDocId {
                doc_id: doc.id.clone(),
                kind: "invalid UUID",
            }
        })?;
        Ok(Self {
            id,
            persona: doc.persona,
            query: doc.query,
            response: doc.response,
            session_id: doc.session_id,
            created_at: doc.created_at,
            response_time_ms: doc.response_time_ms,
            fallback: doc.fallback,
        })
    }
}

pub fn session_doc_id(id: &str) -> String {
    format!("{SESSION_PREFIX}{id}")
}

pub fn chat_doc_id(id: Uuid) -> String {
    format!("{CHAT_PREFIX}{id}")
}

/// Drop the `kind::` prefix of a document id, leaving other strings untouched.
pub fn strip_prefix(doc_id: &str) -> &str {
    doc_id
        .split_once("::")
        .map(|(_, id)| id)
        .unwrap_or(doc_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_ids_round_trip_through_prefix() {
        assert_eq!(session_doc_id("tsunami_ab12"), "session::tsunami_ab12");
        assert_eq!(strip_prefix("session::tsunami_ab12"), "tsunami_ab12");
        assert_eq!(strip_prefix("_all_docs"), "_all_docs");
    }
}
