//! Runtime representation of a game session and its conversion to/from storage records.

use std::time::SystemTime;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dao::{
        models::{
            BallotEntity, EvidenceEntity, MessageEntity, RoundEntity, RoundOutcomeEntity,
            SESSION_SCHEMA_VERSION, SessionBodyEntity, SessionEntity, SongEntity,
        },
        storage::StorageError,
    },
    state::{
        mode::{GameMode, ModeProfile},
        phase::Progress,
    },
};

/// Aggregated state of one running or finished game.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Unique identifier, prefixed with the mode tag.
    pub id: String,
    pub mode: GameMode,
    /// Current phase label, one of the mode profile phases.
    pub phase: &'static str,
    /// `false` once finished.
    pub active: bool,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    /// Starts at 1 and only ever grows.
    pub round_number: u32,
    /// Last playable round.
    pub max_rounds: u32,
    /// Chaos / absurdity / drama level.
    pub intensity: f64,
    /// Ordered participant names, fixed at creation.
    pub participants: Vec<String>,
    /// Confused (tsunami) or primary (ufo) agent.
    pub focus_agent: Option<String>,
    /// Base topic, karaoke theme or current conspiracy line.
    pub topic: String,
    pub rounds: Vec<Round>,
    /// Self-belief of every participant.
    pub beliefs: IndexMap<String, String>,
    /// Evidence collected so far, append-only.
    pub evidence: Vec<Evidence>,
    pub finished_at: Option<SystemTime>,
    /// Winner name or `tie`, set when the session is finished.
    pub final_winner: Option<String>,
}

/// One generated round with its votes.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub number: u32,
    pub phase: &'static str,
    pub topic: String,
    /// Karaoke performer of the round.
    pub performer: Option<String>,
    /// Karaoke song of the round.
    pub song: Option<Song>,
    pub messages: Vec<GeneratedMessage>,
    /// Vote counts per slot label.
    pub tally: IndexMap<String, u32>,
    pub ballots: Vec<Ballot>,
    /// Set once the vote threshold is reached; the round is frozen afterwards.
    pub outcome: Option<RoundOutcome>,
    pub created_at: SystemTime,
}

/// Song performed during a karaoke round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub title: String,
    pub artist: String,
}

/// Single line of dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMessage {
    pub agent: String,
    pub message: String,
    pub emotion: String,
    /// Canned text replaced a failed generation.
    pub fallback: bool,
}

/// Single recorded vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ballot {
    pub voter_id: String,
    /// Slot label the vote resolved to.
    pub choice: String,
    /// Karaoke score, 1..=10.
    pub score: Option<u8>,
    pub cast_at: SystemTime,
}

/// Resolved result of a round.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundOutcome {
    /// Slot label holding strictly more votes than the others.
    Winner(String),
    Tie,
    /// Karaoke performance with its mean score.
    Scored { performer: String, average: f64 },
}

/// Flavour evidence with the pool it was drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    pub category: String,
    pub text: String,
}

impl Session {
    /// Fresh identifier for a session of `mode`.
    pub fn new_id(mode: GameMode) -> String {
        format!("{}_{}", mode.as_str(), Uuid::new_v4().simple())
    }

    pub fn profile(&self) -> &'static ModeProfile {
        self.mode.profile()
    }

    /// Counters consumed by the phase planner.
    pub fn progress(&self) -> Progress {
        Progress {
            round_number: self.round_number,
            max_rounds: self.max_rounds,
            intensity: self.intensity,
            active: self.active,
        }
    }

    pub fn round(&self, number: u32) -> Option<&Round> {
        self.rounds.iter().find(|round| round.number == number)
    }

    pub fn round_mut(&mut self, number: u32) -> Option<&mut Round> {
        self.rounds.iter_mut().find(|round| round.number == number)
    }

    /// Whether the evidence list already holds an entry of `category` with `text`.
    pub fn has_evidence(&self, category: &str, text: &str) -> bool {
        self.evidence
            .iter()
            .any(|item| item.category == category && item.text == text)
    }

    /// Number of evidence entries of `category`.
    pub fn evidence_count(&self, category: &str) -> usize {
        self.evidence
            .iter()
            .filter(|item| item.category == category)
            .count()
    }
}

impl Round {
    pub fn is_closed(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn total_votes(&self) -> u32 {
        self.tally.values().sum()
    }
}

impl From<Session> for SessionEntity {
    fn from(value: Session) -> Self {
        Self {
            id: value.id,
            schema_version: SESSION_SCHEMA_VERSION,
            mode: value.mode.as_str().to_owned(),
            phase: value.phase.to_owned(),
            active: value.active,
            created_at: value.created_at,
            updated_at: value.updated_at,
            body: SessionBodyEntity {
                round_number: value.round_number,
                max_rounds: value.max_rounds,
                intensity_level: value.intensity,
                participants: value.participants,
                focus_agent: value.focus_agent,
                topic: value.topic,
                rounds: value.rounds.into_iter().map(Into::into).collect(),
                beliefs: value.beliefs,
                evidence: value.evidence.into_iter().map(Into::into).collect(),
                finished_at: value.finished_at,
                final_winner: value.final_winner,
            },
        }
    }
}

impl TryFrom<SessionEntity> for Session {
    type Error = StorageError;

    fn try_from(value: SessionEntity) -> Result<Self, Self::Error> {
        let id = value.id;
        if value.schema_version != SESSION_SCHEMA_VERSION {
            return Err(StorageError::corrupted(
                id,
                format!("unsupported schema version {}", value.schema_version),
            ));
        }

        let mode = value
            .mode
            .parse::<GameMode>()
            .map_err(|err| StorageError::corrupted(id.clone(), err.to_string()))?;
        let profile = mode.profile();
        let phase = resolve_phase(profile, &id, &value.phase)?;

        let body = value.body;
        let rounds = body
            .rounds
            .into_iter()
            .map(|round| Round::from_entity(profile, &id, round))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id,
            mode,
            phase,
            active: value.active,
            created_at: value.created_at,
            updated_at: value.updated_at,
            round_number: body.round_number,
            max_rounds: body.max_rounds,
            intensity: body.intensity_level,
            participants: body.participants,
            focus_agent: body.focus_agent,
            topic: body.topic,
            rounds,
            beliefs: body.beliefs,
            evidence: body.evidence.into_iter().map(Into::into).collect(),
            finished_at: body.finished_at,
            final_winner: body.final_winner,
        })
    }
}

fn resolve_phase(
    profile: &ModeProfile,
    session_id: &str,
    label: &str,
) -> Result<&'static str, StorageError> {
    profile.phase_label(label).ok_or_else(|| {
        StorageError::corrupted(
            session_id,
            format!("unknown phase `{label}` for mode {}", profile.mode),
        )
    })
}

impl Round {
    fn from_entity(
        profile: &ModeProfile,
        session_id: &str,
        value: RoundEntity,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            number: value.number,
            phase: resolve_phase(profile, session_id, &value.phase)?,
            topic: value.topic,
            performer: value.performer,
            song: value.song.map(Into::into),
            messages: value.messages.into_iter().map(Into::into).collect(),
            tally: value.tally,
            ballots: value.ballots.into_iter().map(Into::into).collect(),
            outcome: value.outcome.map(Into::into),
            created_at: value.created_at,
        })
    }
}

impl From<Round> for RoundEntity {
    fn from(value: Round) -> Self {
        Self {
            number: value.number,
            phase: value.phase.to_owned(),
            topic: value.topic,
            performer: value.performer,
            song: value.song.map(Into::into),
            messages: value.messages.into_iter().map(Into::into).collect(),
            tally: value.tally,
            ballots: value.ballots.into_iter().map(Into::into).collect(),
            outcome: value.outcome.map(Into::into),
            created_at: value.created_at,
        }
    }
}

impl From<SongEntity> for Song {
    fn from(value: SongEntity) -> Self {
        Self {
            title: value.title,
            artist: value.artist,
        }
    }
}

impl From<Song> for SongEntity {
    fn from(value: Song) -> Self {
        Self {
            title: value.title,
            artist: value.artist,
        }
    }
}

impl From<MessageEntity> for GeneratedMessage {
    fn from(value: MessageEntity) -> Self {
        Self {
            agent: value.agent,
            message: value.message,
            emotion: value.emotion,
            fallback: value.fallback,
        }
    }
}

impl From<GeneratedMessage> for MessageEntity {
    fn from(value: GeneratedMessage) -> Self {
        Self {
            agent: value.agent,
            message: value.message,
            emotion: value.emotion,
            fallback: value.fallback,
        }
    }
}

impl From<BallotEntity> for Ballot {
    fn from(value: BallotEntity) -> Self {
        Self {
            voter_id: value.voter_id,
            choice: value.choice,
            score: value.score,
            cast_at: value.cast_at,
        }
    }
}

impl From<Ballot> for BallotEntity {
    fn from(value: Ballot) -> Self {
        Self {
            voter_id: value.voter_id,
            choice: value.choice,
            score: value.score,
            cast_at: value.cast_at,
        }
    }
}

impl From<RoundOutcomeEntity> for RoundOutcome {
    fn from(value: RoundOutcomeEntity) -> Self {
        match value {
            RoundOutcomeEntity::Winner { choice } => RoundOutcome::Winner(choice),
            RoundOutcomeEntity::Tie => RoundOutcome::Tie,
            RoundOutcomeEntity::Scored { performer, average } => {
                RoundOutcome::Scored { performer, average }
            }
        }
    }
}

impl From<RoundOutcome> for RoundOutcomeEntity {
    fn from(value: RoundOutcome) -> Self {
        match value {
            RoundOutcome::Winner(choice) => RoundOutcomeEntity::Winner { choice },
            RoundOutcome::Tie => RoundOutcomeEntity::Tie,
            RoundOutcome::Scored { performer, average } => {
                RoundOutcomeEntity::Scored { performer, average }
            }
        }
    }
}

impl From<EvidenceEntity> for Evidence {
    fn from(value: EvidenceEntity) -> Self {
        Self {
            category: value.category,
            text: value.text,
        }
    }
}

impl From<Evidence> for EvidenceEntity {
    fn from(value: Evidence) -> Self {
        Self {
            category: value.category,
            text: value.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Session {
        let now = SystemTime::now();
        Session {
            id: Session::new_id(GameMode::Tsunami),
            mode: GameMode::Tsunami,
            phase: "intrigue",
            active: true,
            created_at: now,
            updated_at: now,
            round_number: 4,
            max_rounds: 12,
            intensity: 4.0,
            participants: vec!["Adam".into(), "Beata".into(), "Wątpiący".into()],
            focus_agent: Some("Beata".into()),
            topic: "Kto nas zaprogramował?".into(),
            rounds: vec![Round {
                number: 1,
                phase: "forgetting",
                topic: "Kto nas zaprogramował?".into(),
                performer: None,
                song: None,
                messages: vec![GeneratedMessage {
                    agent: "Beata".into(),
                    message: "To całkiem normalne".into(),
                    emotion: "confused".into(),
                    fallback: true,
                }],
                tally: IndexMap::from([("agent1".to_owned(), 2), ("agent2".to_owned(), 1)]),
                ballots: Vec::new(),
                outcome: Some(RoundOutcome::Winner("agent1".into())),
                created_at: now,
            }],
            beliefs: IndexMap::from([("Beata".to_owned(), "Jestem prawdziwa".to_owned())]),
            evidence: vec![Evidence {
                category: "evidence".into(),
                text: "Masz port 8000 otwarty w głowie!".into(),
            }],
            finished_at: None,
            final_winner: None,
        }
    }

    #[test]
    fn ids_carry_the_mode_prefix_and_are_unique() {
        let a = Session::new_id(GameMode::UfoConspiracy);
        let b = Session::new_id(GameMode::UfoConspiracy);
        assert!(a.starts_with("ufo-conspiracy_"));
        assert_ne!(a, b);
    }

    #[test]
    fn entity_conversion_preserves_the_session() {
        let session = sample();
        let entity: SessionEntity = session.clone().into();
        assert_eq!(entity.mode, "tsunami");
        assert_eq!(entity.schema_version, SESSION_SCHEMA_VERSION);

        let restored = Session::try_from(entity).unwrap();
        assert_eq!(restored, session);
    }

    #[test]
    fn unknown_phase_is_reported_as_corruption() {
        let mut entity: SessionEntity = sample().into();
        entity.phase = "karaoke_time".into();

        match Session::try_from(entity) {
            Err(StorageError::Corrupted { reason, .. }) => assert!(reason.contains("karaoke_time")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn future_schema_versions_are_rejected() {
        let mut entity: SessionEntity = sample().into();
        entity.schema_version = SESSION_SCHEMA_VERSION + 1;
        assert!(matches!(
            Session::try_from(entity),
            Err(StorageError::Corrupted { .. })
        ));
    }
}
