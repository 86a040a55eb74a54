//! Assembly of outward payloads from sessions and rounds. Nothing in here holds state.

use std::time::SystemTime;

use crate::{
    dto::{
        format_system_time,
        session::{
            EvidenceView, FinishSummary, MessageView, PerformanceView, RankingEntry, RoundResult,
            RoundView, SessionListItem, SessionSnapshot, SongCatalogue, SongView, TallyView,
            ThemeSongs,
        },
    },
    services::{
        generation::persona::Persona,
        scripts::{self, conspiracy_level},
        voting::{Standing, TIE},
    },
    state::{
        mode::{GameMode, Scoring},
        phase::round2,
        scoring::{empty_tally, resolve_choice},
        session::{Evidence, GeneratedMessage, Round, RoundOutcome, Session},
    },
};

/// Payload of a freshly generated round.
pub fn round_result(session: &Session, round: &Round, effects: &[&str]) -> RoundResult {
    RoundResult {
        session_id: session.id.clone(),
        mode: session.mode,
        phase: round.phase.to_owned(),
        round_number: round.number,
        max_rounds: session.max_rounds,
        intensity_level: session.intensity,
        topic: round.topic.clone(),
        participants: session.participants.clone(),
        focus_agent: session.focus_agent.clone(),
        beliefs: session.beliefs.clone(),
        messages: round.messages.iter().map(message).collect(),
        performance: performance(round),
        special_effects: to_strings(effects),
        conspiracy_level: session_conspiracy_level(session),
        vote_options: vote_options(session, round),
    }
}

/// Vote counts of `round`.
pub fn tally(round: &Round, next_round_available: bool) -> TallyView {
    let (winner, average_score) = outcome_fields(round.outcome.as_ref());
    TallyView {
        round_number: round.number,
        tally: round.tally.clone(),
        total_votes: round.total_votes(),
        round_closed: round.is_closed(),
        winner,
        audience_excitement: average_score.map(|average| audience_excitement(average).to_owned()),
        average_score,
        next_round_available,
    }
}

/// Final summary of a session that was just finished.
pub fn finish_summary(
    session: &Session,
    standing: &Standing,
    closing_message: String,
    now: SystemTime,
) -> FinishSummary {
    let duration = now
        .duration_since(session.created_at)
        .map(|elapsed| round2(elapsed.as_secs_f64()))
        .unwrap_or_default();
    let special_moments = match session.mode {
        GameMode::Karaoke => scripts::special_moments()
            .iter()
            .map(|moment| (*moment).to_owned())
            .collect(),
        _ => Vec::new(),
    };

    FinishSummary {
        session_id: session.id.clone(),
        mode: session.mode,
        final_winner: standing.final_winner.clone(),
        win_counts: standing.win_counts.clone(),
        rankings: standing
            .rankings
            .iter()
            .map(|(name, average)| RankingEntry {
                name: name.clone(),
                average_score: *average,
            })
            .collect(),
        total_rounds: u32::try_from(session.rounds.len()).unwrap_or(u32::MAX),
        final_intensity: session.intensity,
        conspiracy_level: session_conspiracy_level(session),
        duration_secs: duration,
        closing_message,
        special_effects: to_strings(session.profile().closing_effects),
        special_moments,
        finished_at: format_system_time(session.finished_at.unwrap_or(now)),
    }
}

/// Full view of a session.
pub fn snapshot(session: &Session) -> SessionSnapshot {
    SessionSnapshot {
        session_id: session.id.clone(),
        mode: session.mode,
        phase: session.phase.to_owned(),
        active: session.active,
        round_number: session.round_number,
        max_rounds: session.max_rounds,
        intensity_level: session.intensity,
        topic: session.topic.clone(),
        participants: session.participants.clone(),
        focus_agent: session.focus_agent.clone(),
        beliefs: session.beliefs.clone(),
        evidence: session.evidence.iter().map(evidence).collect(),
        rounds: session.rounds.iter().map(round_view).collect(),
        conspiracy_level: session_conspiracy_level(session),
        final_winner: session.final_winner.clone(),
        created_at: format_system_time(session.created_at),
        updated_at: format_system_time(session.updated_at),
        finished_at: session.finished_at.map(format_system_time),
    }
}

/// Listing projection of a session.
pub fn list_item(session: &Session) -> SessionListItem {
    SessionListItem {
        session_id: session.id.clone(),
        mode: session.mode,
        phase: session.phase.to_owned(),
        active: session.active,
        round_number: session.round_number,
        intensity_level: session.intensity,
        topic: session.topic.clone(),
        participants: session.participants.clone(),
        final_winner: session.final_winner.clone(),
        created_at: format_system_time(session.created_at),
    }
}

/// Every karaoke theme with its songs.
pub fn song_catalogue() -> SongCatalogue {
    let themes: Vec<ThemeSongs> = scripts::catalogue()
        .iter()
        .map(|(theme, songs)| ThemeSongs {
            theme: (*theme).to_owned(),
            songs: songs
                .iter()
                .map(|song| SongView {
                    title: song.title.to_owned(),
                    artist: song.artist.to_owned(),
                    difficulty: song.difficulty.to_owned(),
                    fun_factor: song.fun_factor.to_owned(),
                })
                .collect(),
        })
        .collect();
    let total_suggestions = themes.iter().map(|theme| theme.songs.len()).sum();
    SongCatalogue {
        themes,
        total_suggestions,
    }
}

/// Crowd mood for a karaoke average.
pub fn audience_excitement(average: f64) -> &'static str {
    if average > 7.0 {
        "🔥"
    } else if average > 5.0 {
        "👏"
    } else {
        "😐"
    }
}

fn round_view(round: &Round) -> RoundView {
    let (winner, average_score) = outcome_fields(round.outcome.as_ref());
    RoundView {
        round_number: round.number,
        phase: round.phase.to_owned(),
        topic: round.topic.clone(),
        messages: round.messages.iter().map(message).collect(),
        performance: performance(round),
        tally: round.tally.clone(),
        total_votes: round.total_votes(),
        closed: round.is_closed(),
        winner,
        average_score,
        created_at: format_system_time(round.created_at),
    }
}

fn message(message: &GeneratedMessage) -> MessageView {
    MessageView {
        agent: message.agent.clone(),
        message: message.message.clone(),
        emotion: message.emotion.clone(),
    }
}

fn evidence(item: &Evidence) -> EvidenceView {
    EvidenceView {
        category: item.category.clone(),
        text: item.text.clone(),
    }
}

/// Karaoke extras derived from the performer's stage persona.
fn performance(round: &Round) -> Option<PerformanceView> {
    let performer = round.performer.as_ref()?;
    let song = round.song.as_ref()?;
    let stage = Persona::from_name(performer).stage();
    let lyrics = round
        .messages
        .iter()
        .find(|message| &message.agent == performer)
        .map(|message| message.message.clone())
        .unwrap_or_default();

    Some(PerformanceView {
        performer: performer.clone(),
        song_title: song.title.clone(),
        original_artist: song.artist.clone(),
        lyrics,
        performance_style: stage.performance_style.to_owned(),
        audience_reaction: stage.audience_reaction.to_owned(),
        special_effects: to_strings(stage.special_effects),
        emoji_reactions: to_strings(stage.emoji_reactions),
    })
}

fn vote_options(session: &Session, round: &Round) -> Vec<String> {
    match session.profile().scoring {
        Scoring::Plurality => empty_tally(&session.participants).into_keys().collect(),
        Scoring::MeanScore => round
            .performer
            .as_deref()
            .and_then(|performer| resolve_choice(&session.participants, performer))
            .into_iter()
            .collect(),
    }
}

fn outcome_fields(outcome: Option<&RoundOutcome>) -> (Option<String>, Option<f64>) {
    match outcome {
        Some(RoundOutcome::Winner(slot)) => (Some(slot.clone()), None),
        Some(RoundOutcome::Tie) => (Some(TIE.to_owned()), None),
        Some(RoundOutcome::Scored { average, .. }) => (None, Some(*average)),
        None => (None, None),
    }
}

fn session_conspiracy_level(session: &Session) -> Option<u32> {
    (session.mode == GameMode::UfoConspiracy).then(|| conspiracy_level(session.intensity))
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::scripts::testing,
        state::session::{Ballot, Song},
    };

    fn karaoke_round(session: &Session) -> Round {
        Round {
            number: 1,
            phase: "opening_act",
            topic: "Disco".into(),
            performer: Some("Beata".into()),
            song: Some(Song {
                title: "Le Freak".into(),
                artist: "Chic".into(),
            }),
            messages: vec![GeneratedMessage {
                agent: "Beata".into(),
                message: "Freak out!".into(),
                emotion: "performing".into(),
                fallback: false,
            }],
            tally: empty_tally(&session.participants),
            ballots: Vec::<Ballot>::new(),
            outcome: None,
            created_at: SystemTime::now(),
        }
    }

    #[test]
    fn karaoke_rounds_carry_the_performance() {
        let session = testing::session(GameMode::Karaoke);
        let round = karaoke_round(&session);
        let result = round_result(&session, &round, &["spotlights"]);

        let performance = result.performance.unwrap();
        assert_eq!(performance.performer, "Beata");
        assert_eq!(performance.lyrics, "Freak out!");
        assert_eq!(
            performance.performance_style,
            Persona::Skeptic.stage().performance_style
        );
        assert_eq!(result.vote_options, vec!["agent2".to_owned()]);
        assert_eq!(result.special_effects, vec!["spotlights".to_owned()]);
        assert!(result.conspiracy_level.is_none());
    }

    #[test]
    fn ufo_payloads_report_the_conspiracy_level() {
        let mut session = testing::session(GameMode::UfoConspiracy);
        session.intensity = 15.0;
        let snapshot = snapshot(&session);
        assert_eq!(snapshot.conspiracy_level, Some(100));
    }

    #[test]
    fn outcomes_render_as_winner_or_average() {
        assert_eq!(
            outcome_fields(Some(&RoundOutcome::Tie)),
            (Some("tie".to_owned()), None)
        );
        assert_eq!(
            outcome_fields(Some(&RoundOutcome::Scored {
                performer: "Adam".into(),
                average: 6.5
            })),
            (None, Some(6.5))
        );
    }

    #[test]
    fn excitement_follows_the_average() {
        assert_eq!(audience_excitement(7.5), "🔥");
        assert_eq!(audience_excitement(6.0), "👏");
        assert_eq!(audience_excitement(5.0), "😐");
    }

    #[test]
    fn catalogue_counts_every_song() {
        let catalogue = song_catalogue();
        assert_eq!(catalogue.themes.len(), 4);
        assert_eq!(catalogue.total_suggestions, 16);
    }
}
