//! Payloads of the game session endpoints.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dto::validation::{validate_not_blank, validate_participants},
    state::mode::GameMode,
};

/// Optional overrides accepted when a session starts. Every field falls back to the mode
/// defaults.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(default)]
pub struct StartSessionRequest {
    /// Gladiator base topic.
    #[validate(length(max = 200), custom(function = "validate_not_blank"))]
    pub topic: Option<String>,
    /// Karaoke theme (`Pop`, `Disco`, `Rock`, `Polish Hits`).
    #[validate(length(max = 100), custom(function = "validate_not_blank"))]
    pub theme: Option<String>,
    /// Gladiator first fighter, shorthand for `participants[0]`.
    #[validate(length(min = 1, max = 64))]
    pub agent1: Option<String>,
    /// Gladiator second fighter, shorthand for `participants[1]`.
    #[validate(length(min = 1, max = 64))]
    pub agent2: Option<String>,
    /// Participant names, in slot order.
    #[validate(custom(function = "validate_participants"))]
    pub participants: Option<Vec<String>>,
    /// Last playable round.
    #[serde(alias = "max_songs")]
    #[validate(range(min = 1, max = 50))]
    pub max_rounds: Option<u32>,
    /// Gladiator starting absurdity.
    #[validate(range(min = 0.0, max = 1.0))]
    pub absurdity_start_level: Option<f64>,
}

/// One generated line of dialogue.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageView {
    pub agent: String,
    pub message: String,
    pub emotion: String,
}

/// Karaoke performance of a round.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PerformanceView {
    pub performer: String,
    pub song_title: String,
    pub original_artist: String,
    pub lyrics: String,
    pub performance_style: String,
    pub audience_reaction: String,
    pub special_effects: Vec<String>,
    pub emoji_reactions: Vec<String>,
}

/// Round payload returned by start and advance.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundResult {
    pub session_id: String,
    pub mode: GameMode,
    pub phase: String,
    pub round_number: u32,
    pub max_rounds: u32,
    pub intensity_level: f64,
    pub topic: String,
    pub participants: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_agent: Option<String>,
    /// Self-belief per participant (tsunami, ufo).
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub beliefs: IndexMap<String, String>,
    pub messages: Vec<MessageView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceView>,
    pub special_effects: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conspiracy_level: Option<u32>,
    /// Vote targets of the round (`agentN` slots).
    pub vote_options: Vec<String>,
}

/// Outcome of an advance: either a freshly generated round or the final summary.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdvanceResponse {
    /// A new round was generated.
    Round(RoundResult),
    /// The round limit was passed and the session finished.
    Finished(FinishSummary),
}

/// Ballot cast on a round.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct VoteRequest {
    #[validate(range(min = 1))]
    pub round_number: u32,
    /// Slot label (`agent1`) or participant name.
    #[validate(length(min = 1, max = 64))]
    pub choice: String,
    #[validate(length(min = 1, max = 128))]
    pub voter_id: String,
    /// Karaoke score.
    #[validate(range(min = 1, max = 10))]
    pub score: Option<u8>,
}

/// Vote counts of a round after a ballot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TallyView {
    pub round_number: u32,
    pub tally: IndexMap<String, u32>,
    pub total_votes: u32,
    pub round_closed: bool,
    /// Winning slot label or `tie`, once the round is closed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    /// Karaoke mean score, once the round is closed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience_excitement: Option<String>,
    pub next_round_available: bool,
}

/// Karaoke performer with the mean of every score received.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RankingEntry {
    pub name: String,
    pub average_score: f64,
}

/// Final result of a session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FinishSummary {
    pub session_id: String,
    pub mode: GameMode,
    /// Participant name or `tie`.
    pub final_winner: String,
    /// Rounds won per participant (plurality modes).
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub win_counts: IndexMap<String, u32>,
    /// Performers by mean score (karaoke).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rankings: Vec<RankingEntry>,
    pub total_rounds: u32,
    pub final_intensity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conspiracy_level: Option<u32>,
    pub duration_secs: f64,
    pub closing_message: String,
    pub special_effects: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub special_moments: Vec<String>,
    pub finished_at: String,
}

/// Round as seen in a session snapshot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundView {
    pub round_number: u32,
    pub phase: String,
    pub topic: String,
    pub messages: Vec<MessageView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceView>,
    pub tally: IndexMap<String, u32>,
    pub total_votes: u32,
    pub closed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
    pub created_at: String,
}

/// Evidence collected during a session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EvidenceView {
    pub category: String,
    pub text: String,
}

/// Full state of one session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub mode: GameMode,
    pub phase: String,
    pub active: bool,
    pub round_number: u32,
    pub max_rounds: u32,
    pub intensity_level: f64,
    pub topic: String,
    pub participants: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_agent: Option<String>,
    pub beliefs: IndexMap<String, String>,
    pub evidence: Vec<EvidenceView>,
    pub rounds: Vec<RoundView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conspiracy_level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_winner: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
}

/// Minimal projection of a session when listed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionListItem {
    pub session_id: String,
    pub mode: GameMode,
    pub phase: String,
    pub active: bool,
    pub round_number: u32,
    pub intensity_level: f64,
    pub topic: String,
    pub participants: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_winner: Option<String>,
    pub created_at: String,
}

/// Filters of the session history listing.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct SessionListQuery {
    /// Mode tag, e.g. `ufo-conspiracy`.
    pub mode: Option<String>,
    pub active: Option<bool>,
    /// Defaults to 10.
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}

/// Session counts of one mode.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ModeStats {
    pub mode: GameMode,
    pub total_sessions: usize,
    pub active_sessions: usize,
    pub finished_sessions: usize,
}

/// Song offered by the karaoke catalogue.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SongView {
    pub title: String,
    pub artist: String,
    pub difficulty: String,
    pub fun_factor: String,
}

/// Songs of one karaoke theme.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ThemeSongs {
    pub theme: String,
    pub songs: Vec<SongView>,
}

/// Whole karaoke catalogue.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SongCatalogue {
    pub themes: Vec<ThemeSongs>,
    pub total_suggestions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_request_accepts_an_empty_body() {
        let request: StartSessionRequest = serde_json::from_str("{}").unwrap();
        assert!(request.validate().is_ok());
        assert!(request.participants.is_none());
    }

    #[test]
    fn start_request_understands_max_songs() {
        let request: StartSessionRequest =
            serde_json::from_str(r#"{"theme": "Disco", "max_songs": 4}"#).unwrap();
        assert_eq!(request.max_rounds, Some(4));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn start_request_rejects_out_of_range_values() {
        let request: StartSessionRequest =
            serde_json::from_str(r#"{"max_rounds": 0, "absurdity_start_level": 1.5}"#).unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("max_rounds"));
        assert!(fields.contains_key("absurdity_start_level"));
    }

    #[test]
    fn vote_score_must_be_between_one_and_ten() {
        let request: VoteRequest = serde_json::from_str(
            r#"{"round_number": 1, "choice": "Adam", "voter_id": "v1", "score": 11}"#,
        )
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn advance_response_is_tagged_by_status() {
        let summary = FinishSummary {
            session_id: "gladiator_x".into(),
            mode: GameMode::Gladiator,
            final_winner: "tie".into(),
            win_counts: IndexMap::new(),
            rankings: Vec::new(),
            total_rounds: 5,
            final_intensity: 1.0,
            conspiracy_level: None,
            duration_secs: 1.5,
            closing_message: "Remis".into(),
            special_effects: Vec::new(),
            special_moments: Vec::new(),
            finished_at: "2024-01-01T00:00:00Z".into(),
        };
        let json = serde_json::to_value(AdvanceResponse::Finished(summary)).unwrap();
        assert_eq!(json["status"], "finished");
        assert_eq!(json["final_winner"], "tie");
        assert!(json.get("win_counts").is_none());
    }
}
