//! Per-mode content scripts: what each round is about, who speaks and what flavour state
//! changes between rounds.
//!
//! Scripts are synchronous and only describe the lines to generate; the phase controller
//! feeds the resulting [`ContentRequest`]s to the content generator.

mod gladiator;
mod karaoke;
mod tsunami;
mod ufo;

use rand::{RngCore, seq::IndexedRandom};

pub use karaoke::{SongSuggestion, catalogue, special_moments};
pub use ufo::conspiracy_level;

use crate::{
    services::generation::ContentRequest,
    state::{
        mode::GameMode,
        session::{Evidence, Session, Song},
    },
};

/// Content planned for one round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundScript {
    pub topic: String,
    pub performer: Option<String>,
    pub song: Option<Song>,
    /// Lines to generate, in speaking order.
    pub requests: Vec<ContentRequest>,
}

/// Mode-specific behaviour plugged into the shared phase controller.
pub trait ModeScript: Send + Sync {
    /// Fill the flavour state of a freshly created session (topic, focus agent, beliefs).
    fn open(&self, session: &mut Session, rng: &mut dyn RngCore);

    /// Update flavour state after the counters moved to a new round.
    fn evolve(&self, _session: &mut Session, _rng: &mut dyn RngCore) {}

    /// Content of the round `session.round_number`.
    fn plan_round(&self, session: &Session, rng: &mut dyn RngCore) -> RoundScript;

    /// Line announcing the final result. `winner` is `None` on a tie.
    fn closing_message(&self, winner: Option<&str>, rng: &mut dyn RngCore) -> String;
}

/// Script driving `mode`.
pub fn for_mode(mode: GameMode) -> &'static dyn ModeScript {
    match mode {
        GameMode::Gladiator => &gladiator::GladiatorScript,
        GameMode::Karaoke => &karaoke::KaraokeScript,
        GameMode::Tsunami => &tsunami::TsunamiScript,
        GameMode::UfoConspiracy => &ufo::UfoScript,
    }
}

/// Random entry of a static pool.
fn draw(pool: &[&'static str], rng: &mut dyn RngCore) -> &'static str {
    pool.choose(rng).copied().unwrap_or_default()
}

/// Append one not yet collected entry of `pool` under `category`, if any is left.
fn collect_evidence(
    session: &mut Session,
    category: &str,
    pool: &[&'static str],
    rng: &mut dyn RngCore,
) -> Option<&'static str> {
    let fresh: Vec<&'static str> = pool
        .iter()
        .copied()
        .filter(|text| !session.has_evidence(category, text))
        .collect();
    let text = fresh.choose(rng).copied()?;
    session.evidence.push(Evidence {
        category: category.to_owned(),
        text: text.to_owned(),
    });
    Some(text)
}

/// Participants other than `agent`, in session order.
fn others<'a>(session: &'a Session, agent: &str) -> Vec<&'a str> {
    session
        .participants
        .iter()
        .map(String::as_str)
        .filter(|name| *name != agent)
        .collect()
}

/// Focus agent of the session, defaulting to the first participant.
fn focus(session: &Session) -> &str {
    session
        .focus_agent
        .as_deref()
        .or_else(|| session.participants.first().map(String::as_str))
        .unwrap_or_default()
}

/// Pick the focus agent at random among the participants.
fn pick_focus(session: &mut Session, rng: &mut dyn RngCore) {
    session.focus_agent = session.participants.choose(rng).cloned();
}

#[cfg(test)]
pub(crate) mod testing {
    use std::time::SystemTime;

    use indexmap::IndexMap;

    use crate::state::{mode::GameMode, session::Session};

    /// Session in its first round with default participants.
    pub fn session(mode: GameMode) -> Session {
        let profile = mode.profile();
        let now = SystemTime::now();
        Session {
            id: Session::new_id(mode),
            mode,
            phase: profile.phases[0],
            active: true,
            created_at: now,
            updated_at: now,
            round_number: 1,
            max_rounds: profile.default_max_rounds,
            intensity: profile.intensity.start,
            participants: profile
                .default_participants
                .iter()
                .map(|name| (*name).to_owned())
                .collect(),
            focus_agent: None,
            topic: "Pizza".into(),
            rounds: Vec::new(),
            beliefs: IndexMap::new(),
            evidence: Vec::new(),
            finished_at: None,
            final_winner: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::testing::session;
    use super::*;

    #[test]
    fn evidence_is_never_duplicated_and_stops_at_pool_size() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut session = session(GameMode::Tsunami);
        let pool = ["a", "b", "c"];

        for _ in 0..10 {
            collect_evidence(&mut session, "test", &pool, &mut rng);
        }

        assert_eq!(session.evidence_count("test"), 3);
        let mut texts: Vec<_> = session.evidence.iter().map(|e| e.text.as_str()).collect();
        texts.sort_unstable();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn every_mode_opens_and_plans_a_first_round() {
        let mut rng = StdRng::seed_from_u64(42);
        for mode in GameMode::ALL {
            let script = for_mode(mode);
            let mut session = session(mode);
            script.open(&mut session, &mut rng);
            let round = script.plan_round(&session, &mut rng);

            assert!(!round.requests.is_empty(), "{mode} planned no lines");
            assert!(!round.topic.is_empty());
            assert!(
                round
                    .requests
                    .iter()
                    .all(|request| session.participants.contains(&request.agent)),
                "{mode} used an unknown speaker"
            );
            assert!(round.requests.iter().all(|r| !r.fallbacks.is_empty()));
        }
    }
}
