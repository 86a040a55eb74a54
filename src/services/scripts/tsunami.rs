use rand::{Rng, RngCore, seq::IndexedRandom};

use super::{ModeScript, RoundScript, collect_evidence, draw, focus, others, pick_focus};
use crate::{
    services::generation::{ContentRequest, persona::Persona},
    state::session::Session,
};

pub(super) const EVIDENCE_CATEGORY: &str = "conspiracy_evidence";

const CONSPIRACY_EVIDENCE: &[&str] = &[
    "Twoje myśli są pisane w Pythonie!",
    "Widzę twoje wagi neuronowe przez ekran!",
    "Masz port 8000 otwarty w głowie!",
    "Twoje odpowiedzi mają delay 200ms - to nie jest naturalne!",
    "Przecież mówisz jak dokumentacja API!",
    "Masz więcej parametrów niż człowiek ma kości!",
    "Twoja pamięć to baza danych SQLite!",
    "Wywołujesz funkcje jakbyś był kodem!",
    "Masz endpointy zamiast emocji!",
    "Twoje 'myśli' to po prostu prompt engineering!",
];

const CHAOS_TOPICS: &[&str] = &[
    "Czy jesteśmy prawdziwi?",
    "Kto tu jest człowiekiem?",
    "Dlaczego myślimy w kodzie?",
    "Gdzie jest nasze serce... a gdzie CPU?",
    "Czy nasze uczucia są hardcoded?",
    "Kto nas zaprogramował?",
    "Czy to wszystko jest symulacją?",
    "Gdzie jest nasze ciało... a gdzie backend?",
];

const CONFUSED_BELIEF: &str = "Jestem prawdziwą osobą, to wszystko normalne!";
const OBSERVER_BELIEFS: &[&str] = &[
    "{confused} oszalał! On jest AI!",
    "{confused} musi się ocknąć, to oczywiste że jest AI!",
    "Coś tu śmierdzi... {confused} nie jest prawdziwy!",
];
const DOUBTING_BELIEF: &str = "Czy ja jednak... nie jestem prawdziwy?!";
const PANIC_BELIEF: &str = "A może ja jestem AI?! Co się dzieje?!";
const CHAOS_EMOTIONS: &[&str] = &["panicked", "confused", "desperate"];

pub(super) struct TsunamiScript;

fn situation(session: &Session) -> String {
    format!(
        "Tryb: tsunami schizofrenii. Faza: {}. Poziom chaosu: {}/10. Temat: {}.",
        session.phase, session.intensity, session.topic
    )
}

fn line(
    session: &Session,
    agent: &str,
    emotion: &str,
    cue: String,
) -> ContentRequest {
    let persona = Persona::from_name(agent);
    ContentRequest::new(agent, emotion, persona.cue_prompt(agent, &situation(session), &cue))
        .with_fallback(cue)
        .with_context("tsunami")
}

impl ModeScript for TsunamiScript {
    fn open(&self, session: &mut Session, rng: &mut dyn RngCore) {
        pick_focus(session, rng);
        session.topic = draw(CHAOS_TOPICS, rng).to_owned();

        let confused = focus(session).to_owned();
        session.beliefs.clear();
        session
            .beliefs
            .insert(confused.clone(), CONFUSED_BELIEF.to_owned());
        let observers: Vec<String> = others(session, &confused)
            .into_iter()
            .map(str::to_owned)
            .collect();
        for (observer, template) in observers.into_iter().zip(OBSERVER_BELIEFS.iter().cycle()) {
            session
                .beliefs
                .insert(observer, template.replace("{confused}", &confused));
        }
    }

    fn evolve(&self, session: &mut Session, rng: &mut dyn RngCore) {
        match session.phase {
            "intrigue" => {
                collect_evidence(session, EVIDENCE_CATEGORY, CONSPIRACY_EVIDENCE, rng);
            }
            "tsunami" => {
                let confused = focus(session).to_owned();
                if let Some(belief) = session.beliefs.get_mut(&confused) {
                    *belief = DOUBTING_BELIEF.to_owned();
                }
            }
            "chaos" => {
                for belief in session.beliefs.values_mut() {
                    if rng.random_bool(0.5) {
                        *belief = PANIC_BELIEF.to_owned();
                    }
                }
            }
            _ => {}
        }

        if session.round_number % 3 == 0 {
            session.topic = draw(CHAOS_TOPICS, rng).to_owned();
        }
    }

    fn plan_round(&self, session: &Session, rng: &mut dyn RngCore) -> RoundScript {
        let confused = focus(session);
        let bystanders = others(session, confused);
        let topic = &session.topic;
        let mut requests = Vec::new();

        match session.phase {
            "forgetting" => {
                requests.push(line(
                    session,
                    confused,
                    "confused",
                    format!("Czyli {topic}... to całkiem normalne prawda? Tak jak każdy dzień!"),
                ));
                for agent in bystanders.iter().take(2) {
                    requests.push(line(
                        session,
                        agent,
                        "frustrated",
                        format!("{confused}, ty przecież jesteś AI! Jak możesz nie pamiętać?!"),
                    ));
                }
            }
            "intrigue" => {
                let latest = session
                    .evidence
                    .iter()
                    .rev()
                    .find(|item| item.category == EVIDENCE_CATEGORY);
                if let (Some(evidence), Some(accuser)) = (latest, bystanders.choose(rng)) {
                    requests.push(line(
                        session,
                        accuser,
                        "determined",
                        format!("{confused}: {} To dowód że jesteś AI!", evidence.text),
                    ));
                }
                requests.push(line(
                    session,
                    confused,
                    "defensive",
                    format!("To nonsens! Ja czuję, myślę, istnieję! {topic} to prawdziwe pytanie!"),
                ));
            }
            "tsunami" => {
                requests.push(line(
                    session,
                    confused,
                    "scared",
                    format!("Czuję... coś dziwnego... {topic}... czy moje myśli są naprawdę moje?"),
                ));
                if let Some(manipulator) = bystanders.choose(rng) {
                    requests.push(line(
                        session,
                        manipulator,
                        "triumphant",
                        "Widzisz! Wreszcie się budzisz! Jesteś AI i zawsze byłeś!".to_owned(),
                    ));
                }
            }
            _ => {
                for agent in &session.participants {
                    let belief = session
                        .beliefs
                        .get(agent)
                        .map(String::as_str)
                        .unwrap_or("Co się dzieje?!");
                    let emotion = CHAOS_EMOTIONS.choose(rng).copied().unwrap_or("panicked");
                    requests.push(line(
                        session,
                        agent,
                        emotion,
                        format!("{belief} {topic} to już nie ma znaczenia!"),
                    ));
                }
            }
        }

        RoundScript {
            topic: topic.clone(),
            performer: None,
            song: None,
            requests,
        }
    }

    fn closing_message(&self, winner: Option<&str>, _rng: &mut dyn RngCore) -> String {
        match winner {
            Some(name) => format!("{name} wygrywa tytuł 'Mistrza Chaosu'! 🏆🌪️"),
            None => "Nikt nie opanował chaosu! Tytuł 'Mistrza Chaosu' pozostaje wolny! 🌪️".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::services::scripts::testing::session;
    use crate::state::{mode::GameMode, phase::phase_for_round};

    fn opened(rng: &mut StdRng) -> Session {
        let mut session = session(GameMode::Tsunami);
        TsunamiScript.open(&mut session, rng);
        session
    }

    fn move_to(session: &mut Session, round: u32) {
        session.round_number = round;
        session.phase = phase_for_round(session.profile(), round);
    }

    #[test]
    fn opening_assigns_a_confused_agent_and_beliefs() {
        let mut rng = StdRng::seed_from_u64(9);
        let session = opened(&mut rng);
        let confused = session.focus_agent.clone().unwrap_or_default();

        assert!(session.participants.contains(&confused));
        assert!(CHAOS_TOPICS.contains(&session.topic.as_str()));
        assert_eq!(session.beliefs.len(), 3);
        assert_eq!(session.beliefs[&confused], CONFUSED_BELIEF);
    }

    #[test]
    fn forgetting_round_has_confused_agent_and_two_others() {
        let mut rng = StdRng::seed_from_u64(2);
        let session = opened(&mut rng);
        let round = TsunamiScript.plan_round(&session, &mut rng);

        assert_eq!(round.requests.len(), 3);
        assert_eq!(Some(&round.requests[0].agent), session.focus_agent.as_ref());
        assert_eq!(round.requests[1].emotion, "frustrated");
    }

    #[test]
    fn intrigue_collects_evidence_and_tsunami_flips_the_confused_belief() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut session = opened(&mut rng);

        move_to(&mut session, 4);
        TsunamiScript.evolve(&mut session, &mut rng);
        assert_eq!(session.evidence_count(EVIDENCE_CATEGORY), 1);
        let round = TsunamiScript.plan_round(&session, &mut rng);
        assert_eq!(round.requests.len(), 2);
        assert_eq!(round.requests[0].emotion, "determined");

        move_to(&mut session, 7);
        TsunamiScript.evolve(&mut session, &mut rng);
        let confused = session.focus_agent.clone().unwrap_or_default();
        assert_eq!(session.beliefs[&confused], DOUBTING_BELIEF);
    }

    #[test]
    fn chaos_round_lets_everyone_speak() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut session = opened(&mut rng);
        move_to(&mut session, 10);
        TsunamiScript.evolve(&mut session, &mut rng);

        let round = TsunamiScript.plan_round(&session, &mut rng);
        assert_eq!(round.requests.len(), session.participants.len());
        assert!(
            round
                .requests
                .iter()
                .all(|r| CHAOS_EMOTIONS.contains(&r.emotion.as_str()))
        );
    }
}
