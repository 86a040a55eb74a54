use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Current layout of [`SessionEntity`]. Bumped whenever the body shape changes.
pub const SESSION_SCHEMA_VERSION: u32 = 1;

/// Persisted game session. The scalar fields are indexed by the backends, the body is
/// stored as a structured document next to them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionEntity {
    /// Unique session identifier, never reused.
    pub id: String,
    /// Layout version of the stored document.
    pub schema_version: u32,
    /// Game mode tag (`gladiator`, `karaoke`, `tsunami`, `ufo-conspiracy`).
    pub mode: String,
    /// Label of the phase the session is currently in.
    pub phase: String,
    /// `false` once the session reached its terminal state.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last persisted mutation.
    pub updated_at: SystemTime,
    /// Accumulated rounds and flavour state.
    pub body: SessionBodyEntity,
}

/// Structured payload of a session document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionBodyEntity {
    /// Current round counter, starts at 1.
    pub round_number: u32,
    /// Last playable round before the session auto-finishes.
    pub max_rounds: u32,
    /// Chaos / absurdity / drama scalar.
    pub intensity_level: f64,
    /// Ordered participant names, fixed at creation.
    pub participants: Vec<String>,
    /// Confused or primary agent picked at start, when the mode uses one.
    #[serde(default)]
    pub focus_agent: Option<String>,
    /// Base topic, theme or current conspiracy line.
    pub topic: String,
    /// Played rounds in order.
    pub rounds: Vec<RoundEntity>,
    /// What every participant currently believes about itself.
    #[serde(default)]
    pub beliefs: IndexMap<String, String>,
    /// Collected evidence, append-only.
    #[serde(default)]
    pub evidence: Vec<EvidenceEntity>,
    /// When the session was finished.
    #[serde(default)]
    pub finished_at: Option<SystemTime>,
    /// Winner name or `tie`, set on finish.
    #[serde(default)]
    pub final_winner: Option<String>,
}

/// One played round with its content and votes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundEntity {
    /// Round number this record belongs to.
    pub number: u32,
    /// Phase label active while the round was played.
    pub phase: String,
    /// Topic used for the round.
    pub topic: String,
    /// Performer of the round (karaoke only).
    #[serde(default)]
    pub performer: Option<String>,
    /// Song performed during the round (karaoke only).
    #[serde(default)]
    pub song: Option<SongEntity>,
    /// Generated dialogue lines.
    pub messages: Vec<MessageEntity>,
    /// Vote counts keyed by slot label.
    pub tally: IndexMap<String, u32>,
    /// Every ballot cast for the round.
    pub ballots: Vec<BallotEntity>,
    /// Resolved outcome, immutable once set.
    #[serde(default)]
    pub outcome: Option<RoundOutcomeEntity>,
    /// When the round was generated.
    pub created_at: SystemTime,
}

/// Song reference stored on karaoke rounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SongEntity {
    pub title: String,
    pub artist: String,
}

/// Generated dialogue line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageEntity {
    pub agent: String,
    pub message: String,
    pub emotion: String,
    /// Whether the canned fallback replaced the generated text.
    #[serde(default)]
    pub fallback: bool,
}

/// Single vote or score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BallotEntity {
    pub voter_id: String,
    pub choice: String,
    #[serde(default)]
    pub score: Option<u8>,
    pub cast_at: SystemTime,
}

/// Resolved outcome of a round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundOutcomeEntity {
    Winner { choice: String },
    Tie,
    Scored { performer: String, average: f64 },
}

/// Piece of flavour evidence collected during a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvidenceEntity {
    pub category: String,
    pub text: String,
}

/// Filters accepted when listing sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFilter {
    pub mode: Option<String>,
    pub active: Option<bool>,
    pub limit: Option<usize>,
}

impl SessionFilter {
    /// Whether `entity` passes the mode and active-state filters.
    pub fn matches(&self, entity: &SessionEntity) -> bool {
        self.mode.as_deref().is_none_or(|mode| entity.mode == mode)
            && self.active.is_none_or(|active| entity.active == active)
    }
}

/// Persisted persona chat exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatLogEntity {
    pub id: Uuid,
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

/// Filters accepted when listing chat log entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatLogFilter {
    pub persona: Option<String>,
    pub session_id: Option<String>,
    /// Only entries created at or after this instant.
    pub since: Option<SystemTime>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl ChatLogFilter {
    /// Whether `entry` passes the persona, session and age filters.
    pub fn matches(&self, entry: &ChatLogEntity) -> bool {
        self.persona
            .as_deref()
            .is_none_or(|persona| entry.persona == persona)
            && self
                .session_id
                .as_deref()
                .is_none_or(|id| entry.session_id.as_deref() == Some(id))
            && self.since.is_none_or(|since| entry.created_at >= since)
    }
}

/// Order newest first, apply offset and limit.
pub fn page_newest_first<T, F>(mut items: Vec<T>, created_at: F, offset: usize, limit: Option<usize>) -> Vec<T>
where
    F: Fn(&T) -> SystemTime,
{
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    let iter = items.into_iter().skip(offset);
    match limit {
        Some(limit) => iter.take(limit).collect(),
        None => iter.collect(),
    }
}
