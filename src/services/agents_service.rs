//! Agent catalogue, roast mode and the reality show.

use std::time::SystemTime;

use rand::{Rng, seq::IndexedRandom};
use tracing::debug;
use uuid::Uuid;

use crate::{
    dto::{
        agents::{
            AgentCard, AgentCatalogue, RealityShowRequest, RealityShowResponse, RealityTurn,
            RoastRequest, RoastResponse,
        },
        format_system_time,
    },
    error::ServiceError,
    services::generation::{ContentRequest, Sampling, persona::Persona},
    state::{SharedState, phase::round2},
};

const USER_TARGET: &str = "user";
const COMEDIAN: &str = "Komik";
const DEFAULT_ROAST_INTENSITY: f64 = 0.7;
const MIN_FUNNY_SCORE: f64 = 0.6;
const MAX_FUNNY_SCORE: f64 = 0.95;

const DEFAULT_REALITY_TURNS: u32 = 6;
const MAX_REALITY_TURNS: u32 = 12;
const DEFAULT_DRAMA_LEVEL: f64 = 0.5;
const REALITY_MEMORY: usize = 2;
const REALITY_CAST: [Persona; 2] = [Persona::Optimist, Persona::Skeptic];

/// Each occurrence adds 0.1 to the drama score.
const DRAMA_MARKERS: &[&str] = &["!", "?", "absurd", "niewiarygodne", "szaleństwo", "skandal"];
const EXCLAMATION_BONUS: f64 = 0.05;
const QUESTION_BONUS: f64 = 0.03;

const USER_ROASTS: &[&str] = &[
    "Twoja historia wyszukiwania to w połowie \"jak ugotować makaron\", a w połowie \"czy makaron może się przypalić\". 😄",
    "Rozmawiasz z AI o północy, a potem dziwisz się, że toster patrzy na Ciebie z litością. 🤖",
    "Twoje hasło to \"hasło123\" i jesteś z tego dumny. My też, trochę. 😅",
];

/// Every persona with its catalogue card, the neutral assistant last.
pub fn catalogue() -> AgentCatalogue {
    let agents = Persona::ALL
        .into_iter()
        .map(|persona| {
            let card = persona.card();
            AgentCard {
                key: persona.key().to_owned(),
                name: persona.name().to_owned(),
                personality: persona.personality().to_owned(),
                style: persona.style().to_owned(),
                avatar: persona.emoji().to_owned(),
                description: card.description.to_owned(),
                color: card.color.to_owned(),
                voice: card.voice.to_owned(),
                strengths: card.strengths.iter().map(|s| (*s).to_owned()).collect(),
                weaknesses: card.weaknesses.iter().map(|s| (*s).to_owned()).collect(),
            }
        })
        .collect();
    AgentCatalogue { agents }
}

/// Light-hearted roast of the user or of one agent.
pub async fn roast(state: &SharedState, request: RoastRequest) -> Result<RoastResponse, ServiceError> {
    let intensity = request.intensity.unwrap_or(DEFAULT_ROAST_INTENSITY);
    if !(0.0..=1.0).contains(&intensity) {
        return Err(ServiceError::InvalidRequest(format!(
            "intensity must be within [0, 1], got {intensity}"
        )));
    }
    let target = request.target.trim().to_owned();

    let (prompt, fallbacks) = if target.to_lowercase() == USER_TARGET {
        (
            roast_prompt("użytkowniku", "Bądź zabawny, ale nie złośliwy. Dodaj odrobinę autoironii.", intensity),
            USER_ROASTS.iter().map(|line| (*line).to_owned()).collect(),
        )
    } else {
        let persona = Persona::from_name(&target);
        let subject = format!("agencie {target} ({})", persona.personality());
        (
            roast_prompt(&subject, "Skup się na dziwactwach jego osobowości.", intensity),
            persona.roast_fallbacks(),
        )
    };

    let message = state
        .generator()
        .generate(
            ContentRequest::new(COMEDIAN, "playful", prompt)
                .with_sampling(Sampling::Creative)
                .with_fallbacks(fallbacks)
                .with_context("roast"),
        )
        .await;
    let funny_score = round2(rand::rng().random_range(MIN_FUNNY_SCORE..=MAX_FUNNY_SCORE));

    Ok(RoastResponse {
        target,
        roast: message.message,
        intensity,
        funny_score,
        timestamp: format_system_time(SystemTime::now()),
        fallback: message.fallback,
    })
}

/// Adam and Beata argue about `topic` as loudly as the drama level asks.
pub async fn reality_show(
    state: &SharedState,
    request: RealityShowRequest,
) -> Result<RealityShowResponse, ServiceError> {
    let max_turns = request.max_turns.unwrap_or(DEFAULT_REALITY_TURNS);
    if !(1..=MAX_REALITY_TURNS).contains(&max_turns) {
        return Err(ServiceError::InvalidRequest(format!(
            "max_turns must be between 1 and {MAX_REALITY_TURNS}, got {max_turns}"
        )));
    }
    let level = request.drama_level.unwrap_or(DEFAULT_DRAMA_LEVEL);
    if !(0.0..=1.0).contains(&level) {
        return Err(ServiceError::InvalidRequest(format!(
            "drama_level must be within [0, 1], got {level}"
        )));
    }
    let topic = request.topic.trim().to_owned();

    let mut history: Vec<(String, String)> = Vec::new();
    let mut context = format!("Reality Show! Rozmawiacie na temat: {topic}. Bądźcie dramatyczni!");
    let mut dialog = Vec::new();

    for (turn, persona) in (1..=max_turns).zip(REALITY_CAST.into_iter().cycle()) {
        let recent = &history[history.len().saturating_sub(REALITY_MEMORY)..];
        let message = state
            .generator()
            .generate(
                ContentRequest::new(
                    persona.name(),
                    "dramatic",
                    persona.reality_prompt(&topic, &context, recent, level),
                )
                .with_sampling(Sampling::Creative)
                .with_fallback(persona.reality_fallback(&topic))
                .with_context("reality-show"),
            )
            .await;

        let (text, emotion, emoji) = {
            let mut rng = rand::rng();
            let text = if message.fallback {
                message.message
            } else {
                persona.dramatize(&message.message, level, &mut rng)
            };
            let (emotion, emoji) = drama_indicators(level, &mut rng);
            (text, emotion, emoji)
        };

        context = format!("Ostatnia odpowiedź (DRAMATYCZNA): {text}");
        history.push((persona.name().to_owned(), text.clone()));
        dialog.push(RealityTurn {
            turn,
            agent: persona.name().to_owned(),
            drama_score: drama_score(&text),
            text,
            timestamp: format_system_time(SystemTime::now()),
            emotion: emotion.to_owned(),
            emoji: emoji.to_owned(),
            fallback: message.fallback,
        });
    }

    let transcript = dialog
        .iter()
        .map(|turn| turn.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let episode_score = drama_score(&transcript);
    debug!(topic = %topic, turns = dialog.len(), drama = episode_score, "reality show generated");

    Ok(RealityShowResponse {
        session_id: format!("reality_{}", Uuid::new_v4().simple()),
        topic,
        participants: REALITY_CAST
            .iter()
            .map(|persona| persona.name().to_owned())
            .collect(),
        drama_level: level,
        drama_score: episode_score,
        dialog,
    })
}

fn roast_prompt(subject: &str, angle: &str, intensity: f64) -> String {
    format!(
        "Jesteś komikiem AI. Napisz zabawny, lekki roast o {subject}.\n{angle}\nPoziom intensywności: {intensity:.1}\nKrótko i błyskotliwie:"
    )
}

/// Drama of `text` in [0, 1], driven by punctuation and scandal vocabulary.
fn drama_score(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let markers: usize = DRAMA_MARKERS
        .iter()
        .map(|marker| lower.matches(marker).count())
        .sum();
    let score = markers as f64 * 0.1
        + lower.matches('!').count() as f64 * EXCLAMATION_BONUS
        + lower.matches('?').count() as f64 * QUESTION_BONUS;
    round2(score.min(1.0))
}

/// Emotion and emoji of one line, wilder as the level rises.
fn drama_indicators<R: Rng + ?Sized>(level: f64, rng: &mut R) -> (&'static str, &'static str) {
    let (emotions, emojis): (&[&str], &[&str]) = if level > 0.8 {
        (&["szok", "oburzenie", "ekstaza", "panika"], &["😱", "🤯", "🔥", "💥"])
    } else if level > 0.5 {
        (&["zdziwienie", "ekscytacja", "irytacja"], &["😲", "😤", "🎭"])
    } else {
        (&["zainteresowanie", "ciekawość"], &["🤔", "😐"])
    };
    (
        emotions.choose(rng).copied().unwrap_or("zainteresowanie"),
        emojis.choose(rng).copied().unwrap_or("🤔"),
    )
}
