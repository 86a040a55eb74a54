//! Session lifecycle shared by every mode: start, advance, finish and the read-only views.

use std::time::SystemTime;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::{
    config::AppConfig,
    dao::models::SessionFilter,
    dto::{
        common::ActionResponse,
        session::{
            AdvanceResponse, FinishSummary, ModeStats, RoundResult, SessionListItem,
            SessionListQuery, SessionSnapshot, SongCatalogue, StartSessionRequest,
        },
        validation::validate_participants,
    },
    error::ServiceError,
    services::{
        formatter,
        scripts::{self, RoundScript},
        session_store, voting,
    },
    state::{
        SharedState,
        mode::GameMode,
        phase::{AdvancePlan, effects_for, plan_advance},
        scoring::empty_tally,
        session::{Round, Session},
    },
};

const DEFAULT_GLADIATOR_TOPIC: &str = "Sztuczna inteligencja";
const DEFAULT_KARAOKE_THEME: &str = "Pop";
const MAX_ROUNDS_LIMIT: u32 = 50;
const DEFAULT_LIST_LIMIT: usize = 10;
const MAX_LIST_LIMIT: usize = 100;

/// Resolve a mode path segment.
pub fn parse_mode(tag: &str) -> Result<GameMode, ServiceError> {
    tag.parse::<GameMode>()
        .map_err(|err| ServiceError::InvalidRequest(err.to_string()))
}

/// Create a session of `mode`, generate its first round and persist it.
pub async fn start(
    state: &SharedState,
    mode: GameMode,
    request: StartSessionRequest,
) -> Result<RoundResult, ServiceError> {
    let mut session = build_session(state.config(), mode, request, SystemTime::now())?;
    state.require_store().await?;
    let script = scripts::for_mode(mode);
    let planned = {
        let mut rng = rand::rng();
        script.open(&mut session, &mut rng);
        script.plan_round(&session, &mut rng)
    };

    let round = generate_round(state, &session, planned).await;
    let result = formatter::round_result(&session, &round, session.profile().opening_effects);
    session.rounds.push(round);

    let id = session.id.clone();
    session_store::create(state, session).await?;
    info!(session_id = %id, %mode, "session started");
    Ok(result)
}

/// Move the session `id` to its next round, or finish it once the round limit is passed.
pub async fn advance(state: &SharedState, id: &str) -> Result<AdvanceResponse, ServiceError> {
    session_store::update(state, id, |mut session| async move {
        let plan = plan_advance(session.profile(), session.progress())?;
        let step = plan.step();
        session.round_number = step.round_number;
        session.phase = step.phase;
        session.intensity = step.intensity;

        match plan {
            AdvancePlan::Finish(_) => {
                let summary = conclude(&mut session, SystemTime::now());
                Ok((session, AdvanceResponse::Finished(summary)))
            }
            AdvancePlan::Round(_) => {
                let script = scripts::for_mode(session.mode);
                let planned = {
                    let mut rng = rand::rng();
                    script.evolve(&mut session, &mut rng);
                    script.plan_round(&session, &mut rng)
                };

                let round = generate_round(state, &session, planned).await;
                let effects = effects_for(session.profile(), session.intensity);
                let result = formatter::round_result(&session, &round, &effects);
                session.rounds.push(round);

                debug!(
                    session_id = %session.id,
                    round = session.round_number,
                    phase = session.phase,
                    intensity = session.intensity,
                    "round generated"
                );
                Ok((session, AdvanceResponse::Round(result)))
            }
        }
    })
    .await
}

/// Finish the session `id` explicitly.
pub async fn finish(state: &SharedState, id: &str) -> Result<FinishSummary, ServiceError> {
    session_store::update(state, id, |mut session| async move {
        if !session.active {
            return Err(ServiceError::AlreadyFinished(format!(
                "session `{}` is already finished",
                session.id
            )));
        }
        let summary = conclude(&mut session, SystemTime::now());
        Ok((session, summary))
    })
    .await
}

/// Full snapshot of the session `id`.
pub async fn status(state: &SharedState, id: &str) -> Result<SessionSnapshot, ServiceError> {
    let session = session_store::get(state, id).await?;
    Ok(formatter::snapshot(&session))
}

/// Session history, newest first.
pub async fn list(
    state: &SharedState,
    query: SessionListQuery,
) -> Result<Vec<SessionListItem>, ServiceError> {
    let mode = query.mode.as_deref().map(parse_mode).transpose()?;
    let filter = SessionFilter {
        mode: mode.map(|mode| mode.as_str().to_owned()),
        active: query.active,
        limit: Some(query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)),
    };
    let sessions = session_store::list(state, filter).await?;
    Ok(sessions.iter().map(formatter::list_item).collect())
}

/// Delete the session `id`.
pub async fn delete(state: &SharedState, id: &str) -> Result<ActionResponse, ServiceError> {
    session_store::delete(state, id).await?;
    info!(session_id = %id, "session deleted");
    Ok(ActionResponse::new(format!("session `{id}` deleted")))
}

/// Session counts of `mode`.
pub async fn stats(state: &SharedState, mode: GameMode) -> Result<ModeStats, ServiceError> {
    let filter = SessionFilter {
        mode: Some(mode.as_str().to_owned()),
        ..SessionFilter::default()
    };
    let sessions = session_store::list(state, filter).await?;
    let active_sessions = sessions.iter().filter(|session| session.active).count();
    Ok(ModeStats {
        mode,
        total_sessions: sessions.len(),
        active_sessions,
        finished_sessions: sessions.len() - active_sessions,
    })
}

/// Karaoke song catalogue.
pub fn songs() -> SongCatalogue {
    formatter::song_catalogue()
}

/// Validate the start request against the mode profile and build the initial session.
fn build_session(
    config: &AppConfig,
    mode: GameMode,
    request: StartSessionRequest,
    now: SystemTime,
) -> Result<Session, ServiceError> {
    let profile = mode.profile();
    let StartSessionRequest {
        topic,
        theme,
        agent1,
        agent2,
        participants,
        max_rounds,
        absurdity_start_level,
    } = request;

    let participants = resolve_participants(mode, participants, agent1, agent2)?;
    let (min, max) = profile.participant_bounds;
    if !(min..=max).contains(&participants.len()) {
        return Err(ServiceError::InvalidRequest(format!(
            "{mode} needs between {min} and {max} participants, got {}",
            participants.len()
        )));
    }
    validate_participants(&participants).map_err(|err| {
        ServiceError::InvalidRequest(
            err.message
                .map(|message| message.to_string())
                .unwrap_or_else(|| err.code.to_string()),
        )
    })?;

    let max_rounds = max_rounds.unwrap_or_else(|| config.default_max_rounds(mode));
    if !(1..=MAX_ROUNDS_LIMIT).contains(&max_rounds) {
        return Err(ServiceError::InvalidRequest(format!(
            "max_rounds must be between 1 and {MAX_ROUNDS_LIMIT}, got {max_rounds}"
        )));
    }

    let intensity = match (mode, absurdity_start_level) {
        (GameMode::Gladiator, Some(level)) if (0.0..=1.0).contains(&level) => level,
        (GameMode::Gladiator, Some(level)) => {
            return Err(ServiceError::InvalidRequest(format!(
                "absurdity_start_level must be within [0, 1], got {level}"
            )));
        }
        _ => profile.intensity.start,
    };

    let topic = match mode {
        GameMode::Gladiator => non_blank("topic", topic, DEFAULT_GLADIATOR_TOPIC)?,
        GameMode::Karaoke => non_blank("theme", theme, DEFAULT_KARAOKE_THEME)?,
        GameMode::Tsunami | GameMode::UfoConspiracy => String::new(),
    };

    Ok(Session {
        id: Session::new_id(mode),
        mode,
        phase: profile.phases[0],
        active: true,
        created_at: now,
        updated_at: now,
        round_number: 1,
        max_rounds,
        intensity,
        participants,
        focus_agent: None,
        topic,
        rounds: Vec::new(),
        beliefs: IndexMap::new(),
        evidence: Vec::new(),
        finished_at: None,
        final_winner: None,
    })
}

fn resolve_participants(
    mode: GameMode,
    participants: Option<Vec<String>>,
    agent1: Option<String>,
    agent2: Option<String>,
) -> Result<Vec<String>, ServiceError> {
    let defaults = mode.profile().default_participants;
    match (participants, agent1.is_some() || agent2.is_some()) {
        (Some(_), true) => Err(ServiceError::InvalidRequest(
            "use either participants or agent1/agent2, not both".into(),
        )),
        (Some(names), false) => Ok(names.into_iter().map(|name| name.trim().to_owned()).collect()),
        (None, true) if mode == GameMode::Gladiator => Ok([agent1, agent2]
            .into_iter()
            .zip(defaults)
            .map(|(name, default)| {
                name.map(|name| name.trim().to_owned())
                    .unwrap_or_else(|| (*default).to_owned())
            })
            .collect()),
        (None, true) => Err(ServiceError::InvalidRequest(format!(
            "agent1/agent2 only apply to gladiator sessions, use participants for {mode}"
        ))),
        (None, false) => Ok(defaults.iter().map(|name| (*name).to_owned()).collect()),
    }
}

fn non_blank(field: &str, value: Option<String>, default: &str) -> Result<String, ServiceError> {
    match value {
        None => Ok(default.to_owned()),
        Some(value) if value.trim().is_empty() => Err(ServiceError::InvalidRequest(format!(
            "{field} must not be blank"
        ))),
        Some(value) => Ok(value.trim().to_owned()),
    }
}

/// Generate the lines planned for the current round of `session`.
async fn generate_round(state: &SharedState, session: &Session, planned: RoundScript) -> Round {
    let messages = state.generator().generate_many(planned.requests).await;
    Round {
        number: session.round_number,
        phase: session.phase,
        topic: planned.topic,
        performer: planned.performer,
        song: planned.song,
        messages,
        tally: empty_tally(&session.participants),
        ballots: Vec::new(),
        outcome: None,
        created_at: SystemTime::now(),
    }
}

/// Mark `session` finished and build its summary.
fn conclude(session: &mut Session, now: SystemTime) -> FinishSummary {
    let standing = voting::standings(session);
    let closing_message = {
        let mut rng = rand::rng();
        scripts::for_mode(session.mode).closing_message(standing.winner(), &mut rng)
    };

    session.active = false;
    session.finished_at = Some(now);
    session.final_winner = Some(standing.final_winner.clone());

    info!(
        session_id = %session.id,
        winner = %standing.final_winner,
        rounds = session.rounds.len(),
        "session finished"
    );
    formatter::finish_summary(session, &standing, closing_message, now)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        dao::arena_store::memory::MemoryArenaStore,
        dto::session::VoteRequest,
        services::generation::testing::{EchoBackend, FailingBackend, generator},
        state::AppState,
    };

    async fn state_with(backend: impl crate::services::generation::backend::TextBackend + 'static) -> SharedState {
        let state = AppState::new(AppConfig::default(), generator(backend));
        state.set_store(Arc::new(MemoryArenaStore::new())).await;
        state
    }

    fn gladiator_request() -> StartSessionRequest {
        StartSessionRequest {
            agent1: Some("Adam".into()),
            agent2: Some("Beata".into()),
            max_rounds: Some(5),
            ..StartSessionRequest::default()
        }
    }

    #[tokio::test]
    async fn start_creates_the_first_round() {
        let state = state_with(EchoBackend::default()).await;
        let result = start(&state, GameMode::Gladiator, gladiator_request())
            .await
            .unwrap();

        assert_eq!(result.round_number, 1);
        assert_eq!(result.phase, "warm_up");
        assert_eq!(result.messages.len(), 2);
        assert_eq!(result.special_effects, vec!["arena_gates_open".to_owned()]);
        assert_eq!(result.vote_options, vec!["agent1".to_owned(), "agent2".to_owned()]);

        let snapshot = status(&state, &result.session_id).await.unwrap();
        assert_eq!(snapshot.rounds.len(), 1);
        assert_eq!(snapshot.topic, DEFAULT_GLADIATOR_TOPIC);
    }

    #[tokio::test]
    async fn start_without_storage_fails_before_generating() {
        let backend = EchoBackend::default();
        let calls = backend.calls.clone();
        let state = AppState::new(AppConfig::default(), generator(backend));

        let result = start(&state, GameMode::Gladiator, gladiator_request()).await;
        assert!(matches!(result, Err(ServiceError::Degraded)));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn advancing_past_the_limit_finishes_exactly_once() {
        let state = state_with(FailingBackend).await;
        let id = start(&state, GameMode::Gladiator, gladiator_request())
            .await
            .unwrap()
            .session_id;

        let mut intensities = Vec::new();
        for expected in 2..=5 {
            match advance(&state, &id).await.unwrap() {
                AdvanceResponse::Round(round) => {
                    assert_eq!(round.round_number, expected);
                    intensities.push(round.intensity_level);
                }
                AdvanceResponse::Finished(_) => panic!("finished too early"),
            }
        }
        assert!(intensities.windows(2).all(|pair| pair[0] <= pair[1]));

        let AdvanceResponse::Finished(summary) = advance(&state, &id).await.unwrap() else {
            panic!("sixth advance must finish the session");
        };
        assert_eq!(summary.final_winner, "tie");
        assert_eq!(summary.total_rounds, 5);

        let snapshot = status(&state, &id).await.unwrap();
        assert_eq!(snapshot.round_number, 6);
        assert!(!snapshot.active);

        assert!(matches!(
            advance(&state, &id).await,
            Err(ServiceError::AlreadyFinished(_))
        ));
        assert_eq!(status(&state, &id).await.unwrap().round_number, 6);
        assert!(matches!(
            finish(&state, &id).await,
            Err(ServiceError::AlreadyFinished(_))
        ));
    }

    #[tokio::test]
    async fn finish_declares_the_round_winner() {
        let state = state_with(FailingBackend).await;
        let id = start(&state, GameMode::Gladiator, gladiator_request())
            .await
            .unwrap()
            .session_id;

        for voter in ["a", "b", "c"] {
            voting::vote(
                &state,
                &id,
                VoteRequest {
                    round_number: 1,
                    choice: "Beata".into(),
                    voter_id: voter.into(),
                    score: None,
                },
            )
            .await
            .unwrap();
        }

        let summary = finish(&state, &id).await.unwrap();
        assert_eq!(summary.final_winner, "Beata");
        assert_eq!(summary.win_counts.get("Beata"), Some(&1));
        assert!(!summary.closing_message.is_empty());
    }

    #[tokio::test]
    async fn karaoke_rotates_performers() {
        let state = state_with(FailingBackend).await;
        let request = StartSessionRequest {
            theme: Some("Disco".into()),
            ..StartSessionRequest::default()
        };
        let first = start(&state, GameMode::Karaoke, request).await.unwrap();
        assert_eq!(first.performance.as_ref().unwrap().performer, "Adam");
        assert_eq!(first.max_rounds, 3);

        let AdvanceResponse::Round(second) = advance(&state, &first.session_id).await.unwrap()
        else {
            panic!("second song expected");
        };
        assert_eq!(second.performance.unwrap().performer, "Beata");
    }

    #[tokio::test]
    async fn invalid_configurations_are_rejected() {
        let state = state_with(FailingBackend).await;
        let cases = [
            (
                GameMode::Gladiator,
                StartSessionRequest {
                    participants: Some(vec!["Adam".into(), "Beata".into(), "Daria".into()]),
                    ..StartSessionRequest::default()
                },
            ),
            (
                GameMode::Tsunami,
                StartSessionRequest {
                    max_rounds: Some(51),
                    ..StartSessionRequest::default()
                },
            ),
            (
                GameMode::Gladiator,
                StartSessionRequest {
                    topic: Some("   ".into()),
                    ..StartSessionRequest::default()
                },
            ),
            (
                GameMode::Gladiator,
                StartSessionRequest {
                    absurdity_start_level: Some(1.2),
                    ..StartSessionRequest::default()
                },
            ),
            (
                GameMode::UfoConspiracy,
                StartSessionRequest {
                    participants: Some(vec!["Adam".into(), "adam".into()]),
                    ..StartSessionRequest::default()
                },
            ),
        ];

        for (mode, request) in cases {
            assert!(matches!(
                start(&state, mode, request).await,
                Err(ServiceError::InvalidRequest(_))
            ));
        }
        assert!(matches!(parse_mode("disco"), Err(ServiceError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn listing_and_stats_follow_the_filters() {
        let state = state_with(FailingBackend).await;
        let tsunami = start(&state, GameMode::Tsunami, StartSessionRequest::default())
            .await
            .unwrap();
        start(&state, GameMode::UfoConspiracy, StartSessionRequest::default())
            .await
            .unwrap();
        finish(&state, &tsunami.session_id).await.unwrap();

        let listed = list(
            &state,
            SessionListQuery {
                mode: Some("tsunami".into()),
                ..SessionListQuery::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].active);

        let stats = stats(&state, GameMode::Tsunami).await.unwrap();
        assert_eq!(
            (stats.total_sessions, stats.active_sessions, stats.finished_sessions),
            (1, 0, 1)
        );

        delete(&state, &tsunami.session_id).await.unwrap();
        assert!(matches!(
            status(&state, &tsunami.session_id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn ufo_sessions_start_with_a_primary_agent_and_evidence() {
        let state = state_with(FailingBackend).await;
        let result = start(&state, GameMode::UfoConspiracy, StartSessionRequest::default())
            .await
            .unwrap();
        assert_eq!(result.conspiracy_level, Some(35));
        assert!(result.focus_agent.is_some());

        let snapshot = status(&state, &result.session_id).await.unwrap();
        assert_eq!(snapshot.evidence.len(), 1);
        assert!(!snapshot.topic.is_empty());
    }
}
