use rand::RngCore;

use super::{ModeScript, RoundScript, draw};
use crate::{
    services::generation::{ContentRequest, persona::Persona},
    state::session::Session,
};

const MILD_MODIFIERS: &[&str] = &[
    "w kosmicznym wymiarze",
    "z perspektywy kota",
    "jakby to opowiedziało dziecko",
];

const WILD_MODIFIERS: &[&str] = &[
    "w kosmicznym wymiarze",
    "z perspektywy kota",
    "jakby to opowiedziało dziecko",
    "w stylu science fiction",
    "z przymrużeniem oka szalonego naukowca",
    "jakby to było w bajce Disneya",
    "w alternatywnej rzeczywistości",
    "z punktu widzenia obcej cywilizacji",
];

const ESCALATIONS: &[&str] = &["z dodatkowym absurdem", "w wersji ekstremalnej", "na sterydach"];

const TIE_MESSAGE: &str = "🤝 REMIS! Obaj gladiatorzy są równie silni! Areny drżą z podziwu!";

pub(super) struct GladiatorScript;

/// Round topic escalated by the absurdity level.
pub(super) fn absurd_topic(base: &str, absurdity: f64, rng: &mut dyn RngCore) -> String {
    if absurdity < 0.3 {
        base.to_owned()
    } else if absurdity < 0.6 {
        format!("{base} {}", draw(MILD_MODIFIERS, rng))
    } else {
        format!("{base} {} {}", draw(WILD_MODIFIERS, rng), draw(ESCALATIONS, rng))
    }
}

impl ModeScript for GladiatorScript {
    fn open(&self, _session: &mut Session, _rng: &mut dyn RngCore) {}

    fn plan_round(&self, session: &Session, rng: &mut dyn RngCore) -> RoundScript {
        let topic = absurd_topic(&session.topic, session.intensity, rng);

        let requests = session
            .participants
            .iter()
            .enumerate()
            .map(|(index, attacker)| {
                let defender = session
                    .participants
                    .get((index + 1) % session.participants.len())
                    .map(String::as_str)
                    .unwrap_or_default();
                let persona = Persona::from_name(attacker);
                ContentRequest::new(
                    attacker.as_str(),
                    "combative",
                    persona.attack_prompt(attacker, defender, &topic, session.intensity),
                )
                .with_fallbacks(persona.attack_fallbacks(defender, &topic))
                .with_context("gladiator")
            })
            .collect();

        RoundScript {
            topic,
            performer: None,
            song: None,
            requests,
        }
    }

    fn closing_message(&self, winner: Option<&str>, rng: &mut dyn RngCore) -> String {
        match winner {
            Some(name) => Persona::from_name(name).victory_line(name, rng),
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
    fn absurdity_tiers_escalate_the_topic() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(absurd_topic("Pizza", 0.1, &mut rng), "Pizza");

        let mild = absurd_topic("Pizza", 0.5, &mut rng);
        assert!(MILD_MODIFIERS.iter().any(|m| mild == format!("Pizza {m}")));

        let wild = absurd_topic("Pizza", 0.9, &mut rng);
        assert!(ESCALATIONS.iter().any(|e| wild.ends_with(e)));
    }

    #[test]
    fn both_gladiators_attack_each_other() {
        let mut rng = StdRng::seed_from_u64(3);
        let session = session(GameMode::Gladiator);
        let round = GladiatorScript.plan_round(&session, &mut rng);

        let agents: Vec<_> = round.requests.iter().map(|r| r.agent.as_str()).collect();
        assert_eq!(agents, vec!["Adam", "Beata"]);
        assert!(round.requests[0].prompt.contains("Atakujesz Beata"));
        assert!(round.requests[1].prompt.contains("Atakujesz Adam"));
        assert!(round.requests[1].fallbacks.iter().any(|f| f.contains("Adam")));
    }

    #[test]
    fn closing_message_names_the_winner_or_a_draw() {
        let mut rng = StdRng::seed_from_u64(5);
        assert!(GladiatorScript.closing_message(Some("Adam"), &mut rng).contains("ADAM"));
        assert_eq!(GladiatorScript.closing_message(None, &mut rng), TIE_MESSAGE);
    }
}
