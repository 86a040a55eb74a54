//! Payloads of the persona chat endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dto::validation::validate_not_blank;

/// Question addressed to one persona.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 4000), custom(function = "validate_not_blank"))]
    pub query: String,
    /// Persona key or name (`optimist`, `Beata`, ...); anything else uses the neutral voice.
    #[serde(default, alias = "agent_type")]
    #[validate(length(max = 64))]
    pub persona: Option<String>,
    /// Session the exchange belongs to, kept in the chat log.
    #[validate(length(max = 128))]
    pub session_id: Option<String>,
}

/// Persona answer.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    /// Chat log entry id.
    pub id: Uuid,
    pub response: String,
    pub persona: String,
    pub agent_name: String,
    pub timestamp: String,
    pub response_time_ms: u64,
    /// Canned text replaced a failed generation.
    pub fallback: bool,
}

/// Topic for a two-persona conversation.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SplitDialogRequest {
    #[validate(length(min = 1, max = 500), custom(function = "validate_not_blank"))]
    pub topic: String,
    /// Defaults to 5.
    #[validate(range(min = 1, max = 10))]
    pub max_turns: Option<u32>,
}

/// One turn of a split dialog.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DialogTurn {
    pub turn: u32,
    pub agent: String,
    pub text: String,
    pub timestamp: String,
}

/// Whole split dialog.
#[derive(Debug, Serialize, ToSchema)]
pub struct SplitDialogResponse {
    pub topic: String,
    pub agents: Vec<String>,
    pub dialog: Vec<DialogTurn>,
}

/// Question for the doubting persona.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct DoubtRequest {
    #[validate(length(min = 1, max = 4000), custom(function = "validate_not_blank"))]
    pub query: String,
    /// Probability of doubt openers and closers. Defaults to 0.5.
    #[validate(range(min = 0.0, max = 1.0))]
    pub doubt_level: Option<f64>,
}

/// Answer of the doubting persona.
#[derive(Debug, Serialize, ToSchema)]
pub struct DoubtResponse {
    pub id: Uuid,
    pub response: String,
    pub persona: String,
    pub doubt_level: f64,
    pub timestamp: String,
    pub response_time_ms: u64,
    pub fallback: bool,
}
