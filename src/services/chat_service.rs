use std::time::{Instant, SystemTime};

use rand::{Rng, seq::IndexedRandom};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dao::models::ChatLogEntity,
    dto::{
        chat::{
            ChatRequest, ChatResponse, DialogTurn, DoubtRequest, DoubtResponse,
            SplitDialogRequest, SplitDialogResponse,
        },
        format_system_time,
    },
    error::ServiceError,
    services::generation::{
        ContentRequest, Sampling,
        persona::{Persona, lowercase_first},
    },
    state::SharedState,
};

const DEFAULT_DIALOG_TURNS: u32 = 5;
const MAX_DIALOG_TURNS: u32 = 10;
const DIALOG_MEMORY: usize = 3;
const DIALOG_SPEAKERS: [Persona; 2] = [Persona::Optimist, Persona::Skeptic];
const DEFAULT_DOUBT_LEVEL: f64 = 0.5;
/// Above this level exclamations and certainty words are softened.
const SOFTENING_LEVEL: f64 = 0.7;

const DOUBT_OPENERS: &[&str] = &[
    "Może...",
    "Prawdopodobnie...",
    "Nie jestem pewien, ale...",
    "To może być tak, ale...",
    "Myślę, że...",
    "Być może...",
    "Szczerze mówiąc, nie mam pewności...",
    "To tylko moje zdanie, ale...",
    "Zastanawiam się nad tym...",
    "To skomplikowane, ale spróbujmy...",
];

const DOUBT_QUESTIONS: &[&str] = &[
    "Co o tym myślisz?",
    "Czy to ma sens?",
    "Nie wiem, co o tym sądzić...",
    "A ty co na to?",
    "Jakie jest Twoje zdanie?",
    "Może się mylę?",
    "To trudne pytanie, prawda?",
    "Co byś zrobił na moim miejscu?",
];

/// Answer a question in the voice of the requested persona and record the exchange.
pub async fn chat(state: &SharedState, request: ChatRequest) -> Result<ChatResponse, ServiceError> {
    let ChatRequest {
        query,
        persona,
        session_id,
    } = request;
    let persona = Persona::from_name(persona.as_deref().unwrap_or_default());

    let started = Instant::now();
    let message = state
        .generator()
        .generate(
            ContentRequest::new(persona.name(), "chat", persona.chat_prompt(&query))
                .with_sampling(Sampling::Chat)
                .with_fallback(persona.chat_fallback(&query))
                .with_context("chat"),
        )
        .await;
    let response = if message.fallback {
        message.message
    } else {
        persona.flavor(&message.message)
    };

    let entry = ChatLogEntity {
        id: Uuid::new_v4(),
        persona: persona.key().to_owned(),
        query,
        response,
        session_id,
        created_at: SystemTime::now(),
        response_time_ms: elapsed_ms(started),
        fallback: message.fallback,
    };
    let payload = ChatResponse {
        id: entry.id,
        response: entry.response.clone(),
        persona: entry.persona.clone(),
        agent_name: persona.name().to_owned(),
        timestamp: format_system_time(entry.created_at),
        response_time_ms: entry.response_time_ms,
        fallback: entry.fallback,
    };
    record(state, entry).await;
    Ok(payload)
}

/// Let Adam and Beata take turns on `topic`, each turn seeing the last few answers.
pub async fn split_dialog(
    state: &SharedState,
    request: SplitDialogRequest,
) -> Result<SplitDialogResponse, ServiceError> {
    let max_turns = request.max_turns.unwrap_or(DEFAULT_DIALOG_TURNS);
    if !(1..=MAX_DIALOG_TURNS).contains(&max_turns) {
        return Err(ServiceError::InvalidRequest(format!(
            "max_turns must be between 1 and {MAX_DIALOG_TURNS}, got {max_turns}"
        )));
    }
    let topic = request.topic.trim().to_owned();

    let mut history: Vec<(String, String)> = Vec::new();
    let mut context = format!("Rozmawiacie na temat: {topic}");
    let mut dialog = Vec::new();

    for (turn, persona) in (1..=max_turns).zip(DIALOG_SPEAKERS.into_iter().cycle()) {
        let recent = &history[history.len().saturating_sub(DIALOG_MEMORY)..];
        let message = state
            .generator()
            .generate(
                ContentRequest::new(
                    persona.name(),
                    "dialog",
                    persona.dialog_prompt(&topic, &context, recent),
                )
                .with_sampling(Sampling::Chat)
                .with_fallback(persona.dialog_fallback(&topic))
                .with_context("split-dialog"),
            )
            .await;

        context = format!("Ostatnia odpowiedź: {}", message.message);
        history.push((persona.name().to_owned(), message.message.clone()));
        dialog.push(DialogTurn {
            turn,
            agent: persona.name().to_owned(),
            text: message.message,
            timestamp: format_system_time(SystemTime::now()),
        });
    }

    debug!(topic = %topic, turns = dialog.len(), "split dialog generated");
    Ok(SplitDialogResponse {
        topic,
        agents: DIALOG_SPEAKERS
            .iter()
            .map(|persona| persona.name().to_owned())
            .collect(),
        dialog,
    })
}

/// Answer through the doubting persona, hedging more as `doubt_level` grows.
pub async fn doubt(state: &SharedState, request: DoubtRequest) -> Result<DoubtResponse, ServiceError> {
    let level = request.doubt_level.unwrap_or(DEFAULT_DOUBT_LEVEL);
    if !(0.0..=1.0).contains(&level) {
        return Err(ServiceError::InvalidRequest(format!(
            "doubt_level must be within [0, 1], got {level}"
        )));
    }
    let persona = Persona::Doubter;
    let query = request.query;

    let started = Instant::now();
    let message = state
        .generator()
        .generate(
            ContentRequest::new(persona.name(), "doubtful", doubt_prompt(&query, level))
                .with_sampling(Sampling::Chat)
                .with_fallback(doubt_fallback(&query))
                .with_context("doubt"),
        )
        .await;
    let response = if message.fallback {
        message.message
    } else {
        decorate_with_doubt(&message.message, level, &mut rand::rng())
    };

    let entry = ChatLogEntity {
        id: Uuid::new_v4(),
        persona: persona.key().to_owned(),
        query,
        response,
        session_id: None,
        created_at: SystemTime::now(),
        response_time_ms: elapsed_ms(started),
        fallback: message.fallback,
    };
    let payload = DoubtResponse {
        id: entry.id,
        response: entry.response.clone(),
        persona: entry.persona.clone(),
        doubt_level: level,
        timestamp: format_system_time(entry.created_at),
        response_time_ms: entry.response_time_ms,
        fallback: entry.fallback,
    };
    record(state, entry).await;
    Ok(payload)
}

/// Store a chat exchange. Chat keeps working without storage, so failures are only logged.
async fn record(state: &SharedState, entry: ChatLogEntity) {
    let store = match state.require_store().await {
        Ok(store) => store,
        Err(_) => {
            warn!(entry_id = %entry.id, "storage unavailable (degraded mode); chat exchange not stored");
            return;
        }
    };
    if let Err(err) = store.append_chat(entry).await {
        warn!(error = %err, "failed to store chat exchange");
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn doubt_prompt(query: &str, level: f64) -> String {
    let percent = (level * 100.0).round();
    format!(
        "Jesteś Wątpiący - niepewnym i ostrożnym asystentem AI.\nRzadko mówisz coś na pewno i chętnie przyznajesz się do niewiedzy.\nPoziom niepewności: {percent}%.\n\nUżytkownik pyta: {query}\n\nOdpowiedź jako Wątpiący (z wahaniem):"
    )
}

fn doubt_fallback(query: &str) -> String {
    format!(
        "Hmm, {query}... Może to być tak, ale może też inaczej... Nie jestem pewien co o tym myśleć. 🤔"
    )
}

/// Add doubt openers and closing questions with probability `level`.
fn decorate_with_doubt<R: Rng + ?Sized>(text: &str, level: f64, rng: &mut R) -> String {
    let level = level.clamp(0.0, 1.0);
    let mut text = text.trim().to_owned();

    if rng.random_bool(level) {
        if let Some(opener) = DOUBT_OPENERS.choose(rng) {
            text = format!("{opener} {}", lowercase_first(&text));
        }
    }
    if rng.random_bool(level) {
        if let Some(question) = DOUBT_QUESTIONS.choose(rng) {
            text = format!("{text} {question}");
        }
    }
    if level > SOFTENING_LEVEL {
        text = text
            .replace('!', ".")
            .replace("na pewno", "prawdopodobnie")
            .replace("zdecydowanie", "może");
    }
    if !text.contains('🤔') && !text.contains('❓') {
        text.push_str(" 🤔");
    }
    text
}
