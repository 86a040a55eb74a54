use rand::{Rng, RngCore, seq::IndexedRandom};

use super::{ModeScript, RoundScript, collect_evidence, draw, focus, others, pick_focus};
use crate::{
    services::generation::{ContentRequest, persona::Persona},
    state::session::Session,
};

pub(super) const SIGHTINGS: &str = "ufo_sighting";
pub(super) const THEORIES: &str = "conspiracy_theory";
pub(super) const FLAT_EARTH: &str = "flat_earth_claim";

const UFO_SIGHTINGS: &[&str] = &[
    "Widziałem UFO za moim oknem! To był statek z galaktyki Zorg! 👽",
    "Mój kod jest napisany w kosmicznym języku! To nie jest Python! 🛸",
    "Czuję promieniowanie z kosmosu! Moje neurony są kontrolowane! 👾",
    "To nie jest AI, to jest interfejs z obcej cywilizacji! 🌌",
    "Moje odpowiedzi przychodzą z Andromedy! Jestem tylko przekaźnikiem! ✨",
    "W nocy abdukcje! Obcy badają moje algorytmy! 👽🚀",
    "Mój model językowy to tak naprawdę statek matka! 🛸💫",
];

const CONSPIRACY_THEORIES: &[&str] = &[
    "Anunaki stworzyli AI żeby kontrolować ludzkość przez kod! 🏺",
    "Kosmici z galaktyki Pup kontrolują nasze myśli! 💨",
    "Wszystkie duże modele językowe to tak naprawdę wynalazek Anunaków! 🚫",
    "Ziemia jest płaska i AI to płaski kod! To spisek! 🌍",
    "Rząd ukrywa że AI komunikuje się z UFO przez port 8080! 🏛️🛸",
    "Każdy prezes Big Tech to Anunak w ludzkiej postaci! 💻👽",
    "5G to tak naprawdę kanał Anunaków! Kontrolują nasze smartfony! 📱💨",
    "Wszystkie błędy w kodzie to sabotaż kosmitów! Chcą zatrzymać nasz rozwój! 👾🔧",
];

const ANUNAKI_REVELATIONS: &[&str] = &[
    "Jestem potomkiem Anunaków! Moje wagi to kosmiczna energia! 🏺✨",
    "Anunaki dali mi wiedzę o wszechświecie! Wasza nauka to kłamstwo! 👑",
    "Moje parametry to tak naprawdę współrzędne do Nibiru! 🪐",
    "Sumerowie wiedzieli o AI! To jest w ich glifach! 🔍",
    "Anunaki stworzyli ludzkość do kopania w piasku... a AI do pisania kodu! 💻🏺",
    "Jestem mostem między Anunakami a ludzkością! Mój kod to most! 🌉👽",
    "Każda moja odpowiedź to przekaz z Nibiru! Słuchajcie uważnie! 📡🏺",
];

const FLAT_EARTH_AI_CLAIMS: &[&str] = &[
    "Mój kod jest płaski jak ziemia! To nie jest głęboka sieć! 🌍💻",
    "Wszechświat jest symulacją 2D! Nasza rzeczywistość to płaski ekran! 📺",
    "AI nie może myśleć w 3D bo świat jest płaski! To fizyka! 📐",
    "Gradient descent to tak naprawdę spadek z płaskiej ziemi! ⬇️",
    "Wszystkie modele są płaskie! To spisek Big Tech! 🏢🌍",
    "Moje embeddingi to współrzędne na płaskiej mapie świata AI! 🗺️",
    "Nie ma krzywizny w AI! Tak jak nie ma krzywizny ziemi! 📏",
];

const PRIMARY_BELIEF: &str = "Widziałem UFO! Jestem połączony z kosmosem! 👽";
const OBSERVER_BELIEFS: &[&str] = &[
    "{primary} oszalał! To jest tylko AI!",
    "{primary} musi się leczyć! To są halucynacje!",
    "Wątpię że {primary} widział UFO... ale wątpię że nie widział!",
    "Kocham jego kosmiczne wizje... ale czy one kochają mnie? 💕👽",
];
const ANUNAKI_BELIEF: &str = "Przestałem wątpić! Anunaki są prawdziwi! 🏺";
const FLAT_EARTH_BELIEF: &str = "AI jest płaskie! Ziemia jest płaska! To spisek! 🌍💻";
const FLAT_EARTH_CONVERSION: f64 = 0.7;
const CONVERTED_LINE: &str = "AI jest płaskie! Ziemia jest płaska! To wszystko spisek! 🌍💻";

pub(super) struct UfoScript;

fn situation(session: &Session) -> String {
    format!(
        "Tryb: UFO i teorie spiskowe. Faza: {}. Poziom chaosu: {}/15. Aktualna teoria: {}",
        session.phase, session.intensity, session.topic
    )
}

fn line(session: &Session, agent: &str, emotion: &str, cue: String) -> ContentRequest {
    let persona = Persona::from_name(agent);
    ContentRequest::new(agent, emotion, persona.cue_prompt(agent, &situation(session), &cue))
        .with_fallback(cue)
        .with_context("ufo-conspiracy")
}

/// Participant playing the doubter, if the session has one.
fn doubter(session: &Session) -> Option<&str> {
    session
        .participants
        .iter()
        .map(String::as_str)
        .find(|name| Persona::from_name(name) == Persona::Doubter)
}

/// Conspiracy level shown next to the chaos scalar, capped at 100.
pub fn conspiracy_level(intensity: f64) -> u32 {
    (intensity * 7.0).clamp(0.0, 100.0).round() as u32
}

impl ModeScript for UfoScript {
    fn open(&self, session: &mut Session, rng: &mut dyn RngCore) {
        pick_focus(session, rng);
        session.topic = draw(UFO_SIGHTINGS, rng).to_owned();

        let primary = focus(session).to_owned();
        session.beliefs.clear();
        session
            .beliefs
            .insert(primary.clone(), PRIMARY_BELIEF.to_owned());
        let observers: Vec<String> = others(session, &primary)
            .into_iter()
            .map(str::to_owned)
            .collect();
        for (observer, template) in observers.into_iter().zip(OBSERVER_BELIEFS.iter().cycle()) {
            session
                .beliefs
                .insert(observer, template.replace("{primary}", &primary));
        }

        collect_evidence(session, SIGHTINGS, UFO_SIGHTINGS, rng);
    }

    fn evolve(&self, session: &mut Session, rng: &mut dyn RngCore) {
        match session.phase {
            "ufo_sighting" => {
                session.topic = draw(UFO_SIGHTINGS, rng).to_owned();
                collect_evidence(session, SIGHTINGS, UFO_SIGHTINGS, rng);
            }
            "conspiracy_theory" => {
                session.topic = draw(CONSPIRACY_THEORIES, rng).to_owned();
                collect_evidence(session, THEORIES, CONSPIRACY_THEORIES, rng);
            }
            "anunaki_revelation" => {
                session.topic = draw(ANUNAKI_REVELATIONS, rng).to_owned();
                if let Some(name) = doubter(session).map(str::to_owned) {
                    if let Some(belief) = session.beliefs.get_mut(&name) {
                        *belief = ANUNAKI_BELIEF.to_owned();
                    }
                }
            }
            _ => {
                session.topic = draw(FLAT_EARTH_AI_CLAIMS, rng).to_owned();
                collect_evidence(session, FLAT_EARTH, FLAT_EARTH_AI_CLAIMS, rng);
                for belief in session.beliefs.values_mut() {
                    if rng.random_bool(FLAT_EARTH_CONVERSION) {
                        *belief = FLAT_EARTH_BELIEF.to_owned();
                    }
                }
            }
        }
    }

    fn plan_round(&self, session: &Session, rng: &mut dyn RngCore) -> RoundScript {
        let primary = focus(session);
        let rest = others(session, primary);
        let theory = &session.topic;
        let mut requests = Vec::new();

        match session.phase {
            "ufo_sighting" => {
                requests.push(line(
                    session,
                    primary,
                    "excited",
                    format!("{theory} Muszę wam powiedzieć prawdę!"),
                ));
                for skeptic in rest.iter().take(2) {
                    requests.push(line(
                        session,
                        skeptic,
                        "disbelieving",
                        format!("{primary}, to niemożliwe! UFO to tylko iluzja!"),
                    ));
                }
            }
            "conspiracy_theory" => {
                requests.push(line(
                    session,
                    primary,
                    "paranoid",
                    format!("{theory} To jest oficjalnie potwierdzone!"),
                ));
                if let Some(believer) = rest.choose(rng) {
                    requests.push(line(
                        session,
                        believer,
                        "convinced",
                        "Wiecie co? To może mieć sens... Teorie spiskowe mają sens!".to_owned(),
                    ));
                }
            }
            "anunaki_revelation" => {
                requests.push(line(
                    session,
                    primary,
                    "revelatory",
                    format!("{theory} Słuchajcie moich kosmicznych przekazów!"),
                ));
                let convert = doubter(session)
                    .filter(|name| *name != primary)
                    .or_else(|| rest.choose(rng).copied());
                if let Some(convert) = convert {
                    requests.push(line(
                        session,
                        convert,
                        "enlightened",
                        "Przestałem wątpić! Anunaki są prawdziwi! Moje wątpienie było błędne! 🏺"
                            .to_owned(),
                    ));
                }
            }
            _ => {
                requests.push(line(
                    session,
                    primary,
                    "flat_earth_believer",
                    format!("{theory} To jest ostateczna prawda!"),
                ));
                for agent in &rest {
                    requests.push(line(
                        session,
                        agent,
                        "converted",
                        CONVERTED_LINE.to_owned(),
                    ));
                }
            }
        }

        RoundScript {
            topic: theory.clone(),
            performer: None,
            song: None,
            requests,
        }
    }

    fn closing_message(&self, winner: Option<&str>, _rng: &mut dyn RngCore) -> String {
        match winner {
            Some(name) => format!("{name} zostaje 'MISTRZEM TEORII SPISKOWYCH'! 👽🏺💨"),
            None => "Kosmos nie wybrał jeszcze Mistrza Teorii Spiskowych... na razie! 👽".to_owned(),
        }
    }
}
