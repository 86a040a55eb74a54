//! Pure round/phase progression shared by every mode.
//!
//! Nothing in here touches storage or randomness: given the current progress of a session and
//! its [`ModeProfile`], the next step is fully determined.

use thiserror::Error;

use crate::state::mode::{IntensityScale, ModeProfile};

/// Snapshot of the counters that drive the progression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub round_number: u32,
    pub max_rounds: u32,
    pub intensity: f64,
    pub active: bool,
}

/// Outcome of planning an advance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdvancePlan {
    /// A new round must be generated and appended.
    Round(Step),
    /// The round counter went past the maximum; the session must be finished instead.
    Finish(Step),
}

/// Counters after applying one advance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub round_number: u32,
    pub phase: &'static str,
    pub intensity: f64,
}

impl AdvancePlan {
    /// Counters shared by both outcomes.
    pub fn step(&self) -> Step {
        match *self {
            AdvancePlan::Round(step) | AdvancePlan::Finish(step) => step,
        }
    }
}

/// Errors returned when a session cannot move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdvanceError {
    /// Session already reached its terminal state.
    #[error("session already finished")]
    AlreadyFinished,
}

/// Phase label for `round_number`, a step function over the profile thresholds.
pub fn phase_for_round(profile: &ModeProfile, round_number: u32) -> &'static str {
    profile
        .thresholds
        .iter()
        .position(|limit| round_number <= *limit)
        .map(|index| profile.phases[index])
        .unwrap_or(profile.phases[3])
}

/// Clamp `value` into the scale and drop floating noise past two decimals.
pub fn clamp_intensity(scale: &IntensityScale, value: f64) -> f64 {
    round2(value.clamp(scale.floor, scale.ceiling))
}

/// Intensity after one advance.
pub fn next_intensity(scale: &IntensityScale, current: f64) -> f64 {
    clamp_intensity(scale, current + scale.step)
}

/// Cosmetic effects unlocked at `intensity`, lowest tier first.
pub fn effects_for(profile: &ModeProfile, intensity: f64) -> Vec<&'static str> {
    profile
        .effect_tiers
        .iter()
        .filter(|tier| intensity + f64::EPSILON >= tier.threshold)
        .flat_map(|tier| tier.effects.iter().copied())
        .collect()
}

/// Decide what the next advance does without mutating anything.
pub fn plan_advance(profile: &ModeProfile, progress: Progress) -> Result<AdvancePlan, AdvanceError> {
    if !progress.active {
        return Err(AdvanceError::AlreadyFinished);
    }

    let round_number = progress.round_number.saturating_add(1);
    let step = Step {
        round_number,
        phase: phase_for_round(profile, round_number),
        intensity: next_intensity(&profile.intensity, progress.intensity),
    };

    if round_number > progress.max_rounds {
        Ok(AdvancePlan::Finish(step))
    } else {
        Ok(AdvancePlan::Round(step))
    }
}

/// Round to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
