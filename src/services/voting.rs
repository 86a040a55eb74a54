//! Ballot recording, round closing and final standings.

use std::time::SystemTime;

use indexmap::IndexMap;
use tracing::info;

use crate::{
    dto::session::{TallyView, VoteRequest},
    error::ServiceError,
    services::{formatter, session_store},
    state::{
        SharedState,
        mode::Scoring,
        scoring::{
            Verdict, mean_score, participant_for_slot, plurality, rank_by_mean, ranking_winner,
            resolve_choice,
        },
        session::{Ballot, RoundOutcome, Session},
    },
};

/// Final winner label used when nobody is ahead.
pub const TIE: &str = "tie";

/// Final result of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    /// Participant name or [`TIE`].
    pub final_winner: String,
    /// Rounds won per participant name (plurality modes).
    pub win_counts: IndexMap<String, u32>,
    /// Performers by mean score, best first (karaoke).
    pub rankings: Vec<(String, f64)>,
}

impl Standing {
    /// Winner name, `None` on a tie.
    pub fn winner(&self) -> Option<&str> {
        (self.final_winner != TIE).then_some(self.final_winner.as_str())
    }
}

/// Record a ballot on one round of the session `id`.
pub async fn vote(
    state: &SharedState,
    id: &str,
    request: VoteRequest,
) -> Result<TallyView, ServiceError> {
    let threshold = state.config().voting.close_threshold;
    session_store::update(state, id, |mut session| async move {
        let view = apply_ballot(&mut session, request, threshold, SystemTime::now())?;
        Ok((session, view))
    })
    .await
}

/// Apply one ballot to `session`, closing the round once `threshold` ballots were cast.
///
/// Repeat ballots from the same voter are counted like any other.
pub fn apply_ballot(
    session: &mut Session,
    request: VoteRequest,
    threshold: u32,
    now: SystemTime,
) -> Result<TallyView, ServiceError> {
    if !session.active {
        return Err(ServiceError::AlreadyFinished(format!(
            "session `{}` is finished",
            session.id
        )));
    }

    let Some(slot) = resolve_choice(&session.participants, &request.choice) else {
        return Err(ServiceError::InvalidRequest(format!(
            "`{}` is not a participant of session `{}`",
            request.choice, session.id
        )));
    };

    let scoring = session.profile().scoring;
    let next_round_available = session.round_number < session.max_rounds;
    let session_id = session.id.clone();
    let participants = session.participants.clone();

    let Some(round) = session.round_mut(request.round_number) else {
        return Err(ServiceError::NotFound(format!(
            "round {} of session `{session_id}` not found",
            request.round_number
        )));
    };
    if round.is_closed() {
        return Err(ServiceError::AlreadyFinished(format!(
            "round {} of session `{session_id}` is closed",
            round.number
        )));
    }

    let score = match scoring {
        Scoring::Plurality => None,
        Scoring::MeanScore => {
            let Some(score) = request.score.filter(|score| (1..=10).contains(score)) else {
                return Err(ServiceError::InvalidRequest(
                    "karaoke votes need a score between 1 and 10".into(),
                ));
            };
            let performer = round.performer.as_deref();
            if performer.is_none() || participant_for_slot(&participants, &slot) != performer {
                return Err(ServiceError::InvalidRequest(format!(
                    "`{}` is not performing in round {}",
                    request.choice, round.number
                )));
            }
            Some(score)
        }
    };

    *round.tally.entry(slot.clone()).or_insert(0) += 1;
    round.ballots.push(Ballot {
        voter_id: request.voter_id,
        choice: slot,
        score,
        cast_at: now,
    });

    if round.total_votes() >= threshold {
        let outcome = match scoring {
            Scoring::Plurality => {
                match plurality(round.tally.iter().map(|(slot, count)| (slot.as_str(), *count))) {
                    Verdict::Winner(slot) => RoundOutcome::Winner(slot),
                    Verdict::Tie => RoundOutcome::Tie,
                }
            }
            Scoring::MeanScore => {
                let scores: Vec<u8> = round.ballots.iter().filter_map(|b| b.score).collect();
                RoundOutcome::Scored {
                    performer: round.performer.clone().unwrap_or_default(),
                    average: mean_score(&scores),
                }
            }
        };
        info!(session_id = %session_id, round = round.number, ?outcome, "round closed");
        round.outcome = Some(outcome);
    }

    Ok(formatter::tally(round, next_round_available))
}

/// Final standings of `session` from its round outcomes and ballots.
pub fn standings(session: &Session) -> Standing {
    match session.profile().scoring {
        Scoring::Plurality => {
            let mut win_counts: IndexMap<String, u32> = session
                .participants
                .iter()
                .map(|name| (name.clone(), 0))
                .collect();
            for round in &session.rounds {
                let Some(RoundOutcome::Winner(slot)) = &round.outcome else {
                    continue;
                };
                if let Some(count) = participant_for_slot(&session.participants, slot)
                    .and_then(|name| win_counts.get_mut(name))
                {
                    *count += 1;
                }
            }

            let final_winner =
                match plurality(win_counts.iter().map(|(name, count)| (name.as_str(), *count))) {
                    Verdict::Winner(name) => name,
                    Verdict::Tie => TIE.to_owned(),
                };
            Standing {
                final_winner,
                win_counts,
                rankings: Vec::new(),
            }
        }
        Scoring::MeanScore => {
            let entries = session
                .participants
                .iter()
                .map(|name| {
                    let scores = session
                        .rounds
                        .iter()
                        .filter(|round| round.performer.as_deref() == Some(name.as_str()))
                        .flat_map(|round| round.ballots.iter().filter_map(|ballot| ballot.score))
                        .collect();
                    (name.clone(), scores)
                })
                .collect();
            let rankings = rank_by_mean(entries);
            let final_winner = ranking_winner(&rankings).unwrap_or(TIE).to_owned();
            Standing {
                final_winner,
                win_counts: IndexMap::new(),
                rankings,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::scripts::testing,
        state::{
            mode::GameMode,
            session::{Round, Song},
        },
    };

    fn open_round(number: u32, session: &Session, performer: Option<&str>) -> Round {
        Round {
            number,
            phase: session.profile().phases[0],
            topic: session.topic.clone(),
            performer: performer.map(str::to_owned),
            song: performer.map(|_| Song {
                title: "Dancing Queen".into(),
                artist: "ABBA".into(),
            }),
            messages: Vec::new(),
            tally: crate::state::scoring::empty_tally(&session.participants),
            ballots: Vec::new(),
            outcome: None,
            created_at: SystemTime::now(),
        }
    }

    fn ballot(round_number: u32, choice: &str, score: Option<u8>) -> VoteRequest {
        VoteRequest {
            round_number,
            choice: choice.into(),
            voter_id: "u1".into(),
            score,
        }
    }

    fn gladiator() -> Session {
        let mut session = testing::session(GameMode::Gladiator);
        let round = open_round(1, &session, None);
        session.rounds.push(round);
        session
    }

    fn cast(session: &mut Session, request: VoteRequest) -> Result<TallyView, ServiceError> {
        apply_ballot(session, request, 3, SystemTime::now())
    }

    #[test]
    fn third_ballot_closes_the_round() {
        let mut session = gladiator();
        for _ in 0..2 {
            let view = cast(&mut session, ballot(1, "agent1", None)).unwrap();
            assert!(!view.round_closed);
        }
        let view = cast(&mut session, ballot(1, "agent1", None)).unwrap();
        assert!(view.round_closed);
        assert_eq!(view.winner.as_deref(), Some("agent1"));
        assert_eq!(view.total_votes, 3);
        assert_eq!(
            view.tally.into_iter().collect::<Vec<_>>(),
            vec![("agent1".to_owned(), 3), ("agent2".to_owned(), 0)]
        );
    }

    #[test]
    fn closed_rounds_reject_further_ballots_without_change() {
        let mut session = gladiator();
        for _ in 0..3 {
            cast(&mut session, ballot(1, "Beata", None)).unwrap();
        }
        let before = session.clone();
        assert!(matches!(
            cast(&mut session, ballot(1, "agent1", None)),
            Err(ServiceError::AlreadyFinished(_))
        ));
        assert_eq!(session, before);
    }

    #[test]
    fn invalid_targets_are_rejected() {
        let mut session = gladiator();
        assert!(matches!(
            cast(&mut session, ballot(1, "agent7", None)),
            Err(ServiceError::InvalidRequest(_))
        ));
        assert!(matches!(
            cast(&mut session, ballot(2, "agent1", None)),
            Err(ServiceError::NotFound(_))
        ));
        session.active = false;
        assert!(matches!(
            cast(&mut session, ballot(1, "agent1", None)),
            Err(ServiceError::AlreadyFinished(_))
        ));
    }

    #[test]
    fn karaoke_ballots_need_a_score_for_the_performer() {
        let mut session = testing::session(GameMode::Karaoke);
        let round = open_round(1, &session, Some("Adam"));
        session.rounds.push(round);

        assert!(matches!(
            cast(&mut session, ballot(1, "Adam", None)),
            Err(ServiceError::InvalidRequest(_))
        ));
        assert!(matches!(
            cast(&mut session, ballot(1, "Beata", Some(8))),
            Err(ServiceError::InvalidRequest(_))
        ));

        cast(&mut session, ballot(1, "Adam", Some(7))).unwrap();
        cast(&mut session, ballot(1, "agent1", Some(8))).unwrap();
        let view = cast(&mut session, ballot(1, "adam", Some(8))).unwrap();
        assert!(view.round_closed);
        assert_eq!(view.average_score, Some(7.67));
        assert_eq!(view.audience_excitement.as_deref(), Some("🔥"));
    }

    #[test]
    fn plurality_standings_follow_round_winners() {
        let mut session = testing::session(GameMode::Gladiator);
        for (number, outcome) in [
            (1, RoundOutcome::Winner("agent1".into())),
            (2, RoundOutcome::Winner("agent1".into())),
            (3, RoundOutcome::Winner("agent2".into())),
            (4, RoundOutcome::Tie),
        ] {
            let mut round = open_round(number, &session, None);
            round.outcome = Some(outcome);
            session.rounds.push(round);
        }

        let standing = standings(&session);
        assert_eq!(standing.final_winner, "Adam");
        assert_eq!(standing.win_counts.get("Adam"), Some(&2));
        assert_eq!(standing.win_counts.get("Beata"), Some(&1));

        session.rounds.truncate(1);
        let mut round = open_round(2, &session, None);
        round.outcome = Some(RoundOutcome::Winner("agent2".into()));
        session.rounds.push(round);
        assert_eq!(standings(&session).final_winner, TIE);
        assert_eq!(standings(&session).winner(), None);
    }

    #[test]
    fn karaoke_rankings_use_every_score_of_a_performer() {
        let mut session = testing::session(GameMode::Karaoke);
        for (number, performer, scores) in [
            (1, "Adam", vec![6, 8]),
            (2, "Beata", vec![9]),
            (3, "Adam", vec![10]),
        ] {
            let mut round = open_round(number, &session, Some(performer));
            round.ballots = scores
                .into_iter()
                .map(|score| Ballot {
                    voter_id: "u".into(),
                    choice: "agent1".into(),
                    score: Some(score),
                    cast_at: SystemTime::now(),
                })
                .collect();
            session.rounds.push(round);
        }

        let standing = standings(&session);
        assert_eq!(
            standing.rankings,
            vec![
                ("Beata".to_owned(), 9.0),
                ("Adam".to_owned(), 8.0),
                ("Wątpiący".to_owned(), 0.0),
            ]
        );
        assert_eq!(standing.final_winner, "Beata");
        assert!(standing.win_counts.is_empty());
    }
}
