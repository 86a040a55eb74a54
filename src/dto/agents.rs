//! Payloads of the agent catalogue, roast mode and reality show.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::validation::validate_not_blank;

/// One selectable agent.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AgentCard {
    /// Persona key used by the chat endpoints and the chat log.
    pub key: String,
    pub name: String,
    pub personality: String,
    pub style: String,
    pub avatar: String,
    pub description: String,
    pub color: String,
    pub voice: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AgentCatalogue {
    pub agents: Vec<AgentCard>,
}

/// Who gets roasted and how hard.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RoastRequest {
    /// `user` or an agent name or key.
    #[validate(length(min = 1, max = 64), custom(function = "validate_not_blank"))]
    pub target: String,
    /// Defaults to 0.7.
    #[validate(range(min = 0.0, max = 1.0))]
    pub intensity: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoastResponse {
    pub target: String,
    pub roast: String,
    pub intensity: f64,
    /// Audience meter in [0.6, 0.95].
    pub funny_score: f64,
    pub timestamp: String,
    pub fallback: bool,
}

/// Topic and temperature of a reality show episode.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RealityShowRequest {
    #[validate(length(min = 1, max = 500), custom(function = "validate_not_blank"))]
    pub topic: String,
    /// Defaults to 6.
    #[validate(range(min = 1, max = 12))]
    pub max_turns: Option<u32>,
    /// Defaults to 0.5.
    #[validate(range(min = 0.0, max = 1.0))]
    pub drama_level: Option<f64>,
}

/// One line of a reality show.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RealityTurn {
    pub turn: u32,
    pub agent: String,
    pub text: String,
    pub timestamp: String,
    /// Drama of this line alone, in [0, 1].
    pub drama_score: f64,
    pub emotion: String,
    pub emoji: String,
    pub fallback: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RealityShowResponse {
    pub session_id: String,
    pub topic: String,
    pub participants: Vec<String>,
    pub drama_level: f64,
    /// Drama of the whole episode, in [0, 1].
    pub drama_score: f64,
    pub dialog: Vec<RealityTurn>,
}
