use rand::{RngCore, seq::IndexedRandom};

use super::{ModeScript, RoundScript};
use crate::{
    services::generation::{ContentRequest, persona::Persona},
    state::session::{Session, Song},
};

/// Catalogue entry offered for a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SongSuggestion {
    pub title: &'static str,
    pub artist: &'static str,
    pub difficulty: &'static str,
    pub fun_factor: &'static str,
}

const fn song(
    title: &'static str,
    artist: &'static str,
    difficulty: &'static str,
    fun_factor: &'static str,
) -> SongSuggestion {
    SongSuggestion {
        title,
        artist,
        difficulty,
        fun_factor,
    }
}

const DEFAULT_THEME: &str = "Pop";

static CATALOGUE: &[(&str, &[SongSuggestion])] = &[
    (
        "Pop",
        &[
            song("Shake It Off", "Taylor Swift", "Easy", "High"),
            song("Blinding Lights", "The Weeknd", "Medium", "High"),
            song("Dance Monkey", "Tones and I", "Easy", "Very High"),
            song("Bad Guy", "Billie Eilish", "Medium", "High"),
        ],
    ),
    (
        "Disco",
        &[
            song("Stayin' Alive", "Bee Gees", "Medium", "Extreme"),
            song("Dancing Queen", "ABBA", "Easy", "Very High"),
            song("I Will Survive", "Gloria Gaynor", "Medium", "High"),
            song("Le Freak", "Chic", "Easy", "High"),
        ],
    ),
    (
        "Rock",
        &[
            song("Bohemian Rhapsody", "Queen", "Expert", "Legendary"),
            song("Sweet Child O' Mine", "Guns N' Roses", "Hard", "High"),
            song("Livin' on a Prayer", "Bon Jovi", "Medium", "Very High"),
            song("We Will Rock You", "Queen", "Easy", "Very High"),
        ],
    ),
    (
        "Polish Hits",
        &[
            song("Małgośka", "Budka Suflera", "Medium", "High"),
            song("Chłop z Marsa", "De Mono", "Easy", "Very High"),
            song("Jesteś szalona", "Kasia Kowalska", "Medium", "High"),
            song("Zakochaj się", "Edyta Bartosiewicz", "Medium", "High"),
        ],
    ),
];

const SPECIAL_MOMENTS: &[&str] = &[
    "🎤 Adam próbował zaśpiewać operę! Wynik: katastrofa, ale zabawna!",
    "🔍 Beata analizowała tekst piosenki jak pracę naukową!",
    "❓ Wątpiący zapomniał tekstu i zaczął improwizować pytania!",
    "✨ Auto-tune uratował wieczór!",
    "🎭 Publiczność tańczyła na stołach!",
];

const TIE_MESSAGE: &str = "🎤 Remis na scenie! Publiczność żąda bisu od wszystkich!";

/// Every theme with its songs.
pub fn catalogue() -> &'static [(&'static str, &'static [SongSuggestion])] {
    CATALOGUE
}

/// Highlights reported when a karaoke night ends.
pub fn special_moments() -> &'static [&'static str] {
    SPECIAL_MOMENTS
}

/// Songs for `theme` (case-insensitive), falling back to the default theme.
fn songs_for(theme: &str) -> &'static [SongSuggestion] {
    CATALOGUE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(theme.trim()))
        .or_else(|| CATALOGUE.iter().find(|(name, _)| *name == DEFAULT_THEME))
        .map(|(_, songs)| *songs)
        .unwrap_or_default()
}

pub(super) struct KaraokeScript;

impl ModeScript for KaraokeScript {
    fn open(&self, _session: &mut Session, _rng: &mut dyn RngCore) {}

    fn plan_round(&self, session: &Session, rng: &mut dyn RngCore) -> RoundScript {
        let slot = session.round_number.saturating_sub(1) as usize;
        let performer = session
            .participants
            .get(slot % session.participants.len().max(1))
            .cloned()
            .unwrap_or_default();
        let picked = songs_for(&session.topic)
            .choose(rng)
            .map(|entry| Song {
                title: entry.title.to_owned(),
                artist: entry.artist.to_owned(),
            })
            .unwrap_or_else(|| Song {
                title: "Sto lat".to_owned(),
                artist: "Tradycyjna".to_owned(),
            });

        let persona = Persona::from_name(&performer);
        let request = ContentRequest::new(
            performer.as_str(),
            "performing",
            persona.lyrics_prompt(&performer, &picked.title, &picked.artist, &session.topic),
        )
        .with_fallback(persona.lyric_fallback(&picked.title))
        .with_context("karaoke");

        RoundScript {
            topic: session.topic.clone(),
            performer: Some(performer),
            song: Some(picked),
            requests: vec![request],
        }
    }

    fn closing_message(&self, winner: Option<&str>, _rng: &mut dyn RngCore) -> String {
        match winner {
            Some(name) => Persona::from_name(name).encore(name),
            None => TIE_MESSAGE.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::services::scripts::testing::session;
    use crate::state::mode::GameMode;

    #[test]
    fn unknown_themes_fall_back_to_pop() {
        assert_eq!(songs_for("polish hits")[0].title, "Małgośka");
        assert_eq!(songs_for("Polka")[0].title, "Shake It Off");
    }

    #[test]
    fn performers_rotate_through_participants() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut session = session(GameMode::Karaoke);
        session.topic = "Disco".into();

        let performers: Vec<_> = (1..=4)
            .map(|round| {
                session.round_number = round;
                KaraokeScript
                    .plan_round(&session, &mut rng)
                    .performer
                    .unwrap_or_default()
            })
            .collect();
        assert_eq!(performers, vec!["Adam", "Beata", "Wątpiący", "Adam"]);

        let round = KaraokeScript.plan_round(&session, &mut rng);
        let title = round.song.map(|s| s.title).unwrap_or_default();
        assert!(songs_for("Disco").iter().any(|s| s.title == title));
        assert_eq!(round.requests.len(), 1);
    }
}
