//! Static per-mode parameters driving the shared round/phase machine.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Game modes served by the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum GameMode {
    /// Two agents trade increasingly absurd attacks.
    Gladiator,
    /// Agents take turns performing songs and get scored by the audience.
    Karaoke,
    /// One agent forgets it is an AI while the others try to convince it.
    Tsunami,
    /// One agent spirals through UFO, Anunnaki and flat-earth theories.
    UfoConspiracy,
}

/// Error returned when a mode tag is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown game mode `{0}`")]
pub struct UnknownMode(pub String);

impl GameMode {
    /// Every supported mode, in display order.
    pub const ALL: [GameMode; 4] = [
        GameMode::Gladiator,
        GameMode::Karaoke,
        GameMode::Tsunami,
        GameMode::UfoConspiracy,
    ];

    /// Stable tag used in URLs, ids and storage.
    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Gladiator => "gladiator",
            GameMode::Karaoke => "karaoke",
            GameMode::Tsunami => "tsunami",
            GameMode::UfoConspiracy => "ufo-conspiracy",
        }
    }

    /// Parameters of this mode.
    pub fn profile(self) -> &'static ModeProfile {
        match self {
            GameMode::Gladiator => &GLADIATOR,
            GameMode::Karaoke => &KARAOKE,
            GameMode::Tsunami => &TSUNAMI,
            GameMode::UfoConspiracy => &UFO_CONSPIRACY,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = UnknownMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        GameMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == value)
            .ok_or_else(|| UnknownMode(value.to_owned()))
    }
}

/// How round and session winners are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scoring {
    /// One vote per ballot, the unique top choice wins.
    Plurality,
    /// Ballots carry a 1..=10 score, performers are ranked by their mean.
    MeanScore,
}

/// Role of the agent picked at random when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusRole {
    /// Mode has no focus agent.
    None,
    /// Agent that forgot it is an AI.
    Confused,
    /// Agent that believes in every conspiracy.
    Primary,
}

/// Bounds and growth of the intensity scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityScale {
    /// Value a new session starts with unless configured otherwise.
    pub start: f64,
    pub floor: f64,
    pub ceiling: f64,
    /// Added on every advance.
    pub step: f64,
}

/// Cosmetic effects unlocked once intensity reaches `threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectTier {
    pub threshold: f64,
    pub effects: &'static [&'static str],
}

/// Full parameter set of a mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeProfile {
    pub mode: GameMode,
    /// Phase labels in progression order.
    pub phases: [&'static str; 4],
    /// Inclusive upper round bound of the first three phases.
    pub thresholds: [u32; 3],
    pub intensity: IntensityScale,
    pub default_max_rounds: u32,
    pub default_participants: &'static [&'static str],
    /// Inclusive participant count bounds.
    pub participant_bounds: (usize, usize),
    pub focus: FocusRole,
    /// Effects attached to the start payload.
    pub opening_effects: &'static [&'static str],
    /// Intensity tiers, ascending.
    pub effect_tiers: &'static [EffectTier],
    /// Effects attached to the finish summary.
    pub closing_effects: &'static [&'static str],
    pub scoring: Scoring,
}

const CORE_TRIO: &[&str] = &["Adam", "Beata", "Wątpiący"];

static GLADIATOR: ModeProfile = ModeProfile {
    mode: GameMode::Gladiator,
    phases: ["warm_up", "clash", "frenzy", "overtime"],
    thresholds: [1, 3, 5],
    intensity: IntensityScale {
        start: 0.1,
        floor: 0.0,
        ceiling: 1.0,
        step: 0.2,
    },
    default_max_rounds: 5,
    default_participants: &["Adam", "Beata"],
    participant_bounds: (2, 2),
    focus: FocusRole::None,
    opening_effects: &["arena_gates_open"],
    effect_tiers: &[
        EffectTier {
            threshold: 0.5,
            effects: &["arena_sparks"],
        },
        EffectTier {
            threshold: 0.8,
            effects: &["absurd_storm"],
        },
        EffectTier {
            threshold: 1.0,
            effects: &["colosseum_quake"],
        },
    ],
    closing_effects: &["victory_animation", "arena_fireworks"],
    scoring: Scoring::Plurality,
};

static KARAOKE: ModeProfile = ModeProfile {
    mode: GameMode::Karaoke,
    phases: ["opening_act", "main_stage", "power_ballads", "grand_finale"],
    thresholds: [1, 3, 5],
    intensity: IntensityScale {
        start: 0.8,
        floor: 0.0,
        ceiling: 1.0,
        step: 0.05,
    },
    default_max_rounds: 3,
    default_participants: CORE_TRIO,
    participant_bounds: (1, 4),
    focus: FocusRole::None,
    opening_effects: &["spotlights"],
    effect_tiers: &[
        EffectTier {
            threshold: 0.8,
            effects: &["spotlights"],
        },
        EffectTier {
            threshold: 0.9,
            effects: &["confetti_cannon"],
        },
        EffectTier {
            threshold: 1.0,
            effects: &["standing_ovation"],
        },
    ],
    closing_effects: &["encore_lights", "confetti"],
    scoring: Scoring::MeanScore,
};

static TSUNAMI: ModeProfile = ModeProfile {
    mode: GameMode::Tsunami,
    phases: ["forgetting", "intrigue", "tsunami", "chaos"],
    thresholds: [3, 6, 9],
    intensity: IntensityScale {
        start: 1.0,
        floor: 1.0,
        ceiling: 10.0,
        step: 1.0,
    },
    default_max_rounds: 12,
    default_participants: CORE_TRIO,
    participant_bounds: (2, 4),
    focus: FocusRole::Confused,
    opening_effects: &["screen_shake", "glitch_effect"],
    effect_tiers: &[
        EffectTier {
            threshold: 5.0,
            effects: &["screen_shake"],
        },
        EffectTier {
            threshold: 7.0,
            effects: &["glitch_effect"],
        },
        EffectTier {
            threshold: 9.0,
            effects: &["color_inversion"],
        },
    ],
    closing_effects: &["victory_animation", "confetti"],
    scoring: Scoring::Plurality,
};

static UFO_CONSPIRACY: ModeProfile = ModeProfile {
    mode: GameMode::UfoConspiracy,
    phases: [
        "ufo_sighting",
        "conspiracy_theory",
        "anunaki_revelation",
        "flat_earth_ai",
    ],
    thresholds: [3, 6, 9],
    intensity: IntensityScale {
        start: 5.0,
        floor: 1.0,
        ceiling: 15.0,
        step: 2.0,
    },
    default_max_rounds: 12,
    default_participants: &["Adam", "Beata", "Wątpiący", "Daria"],
    participant_bounds: (2, 4),
    focus: FocusRole::Primary,
    opening_effects: &["ufo_flyby", "cosmic_glow"],
    effect_tiers: &[
        EffectTier {
            threshold: 8.0,
            effects: &["ufo_flyby", "alien_glow"],
        },
        EffectTier {
            threshold: 11.0,
            effects: &["cosmic_storm", "flat_earth_spin"],
        },
        EffectTier {
            threshold: 14.0,
            effects: &["anunaki_power", "chaos_inversion"],
        },
    ],
    closing_effects: &["cosmic_victory", "anunaki_blessing", "flat_earth_celebration"],
    scoring: Scoring::Plurality,
};

impl ModeProfile {
    /// Position of `label` in the phase progression.
    pub fn phase_index(&self, label: &str) -> Option<usize> {
        self.phases.iter().position(|phase| *phase == label)
    }

    /// Resolve a stored phase label to its static counterpart.
    pub fn phase_label(&self, label: &str) -> Option<&'static str> {
        self.phase_index(label).map(|index| self.phases[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_from_str() {
        for mode in GameMode::ALL {
            assert_eq!(mode.as_str().parse::<GameMode>(), Ok(mode));
            assert_eq!(mode.profile().mode, mode);
        }
        assert_eq!(
            "ufo".parse::<GameMode>(),
            Err(UnknownMode("ufo".to_owned()))
        );
    }

    #[test]
    fn serde_uses_the_url_tag() {
        let json = serde_json::to_string(&GameMode::UfoConspiracy).unwrap();
        assert_eq!(json, "\"ufo-conspiracy\"");
    }

    #[test]
    fn profiles_are_internally_consistent() {
        for mode in GameMode::ALL {
            let profile = mode.profile();
            assert!(profile.thresholds.windows(2).all(|pair| pair[0] < pair[1]));
            assert!(profile.intensity.floor <= profile.intensity.start);
            assert!(profile.intensity.start <= profile.intensity.ceiling);
            assert!(profile
                .effect_tiers
                .windows(2)
                .all(|pair| pair[0].threshold < pair[1].threshold));
            let (min, max) = profile.participant_bounds;
            assert!((min..=max).contains(&profile.default_participants.len()));
        }
    }
}
