//! Vote counting helpers: slot labels, plurality and mean-score rankings.

use indexmap::IndexMap;

use super::phase::round2;

/// Result of comparing vote counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Key holding strictly more votes than any other.
    Winner(String),
    /// Two or more keys share the top count, or nobody received a vote.
    Tie,
}

/// Slot label of the participant at `index` (`agent1`, `agent2`, ...).
pub fn slot_label(index: usize) -> String {
    format!("agent{}", index + 1)
}

/// Map a vote target to its slot label. Accepts either the slot label itself or the
/// participant name (case-insensitive).
pub fn resolve_choice(participants: &[String], choice: &str) -> Option<String> {
    let choice = choice.trim();
    let folded = choice.to_lowercase();
    participants
        .iter()
        .enumerate()
        .find(|(index, name)| slot_label(*index) == choice || name.to_lowercase() == folded)
        .map(|(index, _)| slot_label(index))
}

/// Participant name behind `slot`.
pub fn participant_for_slot<'a>(participants: &'a [String], slot: &str) -> Option<&'a str> {
    let index = slot.strip_prefix("agent")?.parse::<usize>().ok()?;
    participants.get(index.checked_sub(1)?).map(String::as_str)
}

/// Tally with every slot present and set to zero.
pub fn empty_tally(participants: &[String]) -> IndexMap<String, u32> {
    (0..participants.len()).map(|index| (slot_label(index), 0)).collect()
}

/// Unique top entry of `counts`. Zero counts never win.
pub fn plurality<'a, I>(counts: I) -> Verdict
where
    I: IntoIterator<Item = (&'a str, u32)>,
{
    let mut best: Option<(&str, u32)> = None;
    let mut tied = false;

    for (key, count) in counts {
        match best {
            Some((_, top)) if count < top => {}
            Some((_, top)) if count == top => tied = true,
            _ => {
                best = Some((key, count));
                tied = false;
            }
        }
    }

    match best {
        Some((key, count)) if count > 0 && !tied => Verdict::Winner(key.to_owned()),
        _ => Verdict::Tie,
    }
}

/// Mean of `scores` rounded to two decimals, `0.0` when empty.
pub fn mean_score(scores: &[u8]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let total: u32 = scores.iter().map(|score| u32::from(*score)).sum();
    round2(f64::from(total) / scores.len() as f64)
}

/// Entries ordered by mean descending. Equal means keep their input order.
pub fn rank_by_mean(entries: Vec<(String, Vec<u8>)>) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = entries
        .into_iter()
        .map(|(name, scores)| {
            let mean = mean_score(&scores);
            (name, mean)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

/// Winner of a ranking, `None` when the top two means are equal or the ranking is empty.
pub fn ranking_winner(ranked: &[(String, f64)]) -> Option<&str> {
    match ranked {
        [(_, top), (_, runner_up), ..] if top == runner_up => None,
        [(first, _), ..] => Some(first.as_str()),
        [] => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn choices_resolve_by_slot_or_name() {
        let participants = names(&["Adam", "Beata"]);
        assert_eq!(resolve_choice(&participants, "agent2").as_deref(), Some("agent2"));
        assert_eq!(resolve_choice(&participants, "adam").as_deref(), Some("agent1"));
        assert_eq!(resolve_choice(&participants, "agent3"), None);
        assert_eq!(resolve_choice(&participants, "Daria"), None);
        assert_eq!(participant_for_slot(&participants, "agent2"), Some("Beata"));
        assert_eq!(participant_for_slot(&participants, "agent0"), None);
    }

    #[test]
    fn names_match_regardless_of_unicode_case() {
        let participants = names(&["Adam", "Wątpiący"]);
        assert_eq!(resolve_choice(&participants, "WĄTPIĄCY").as_deref(), Some("agent2"));
        assert_eq!(resolve_choice(&participants, " wątpiący ").as_deref(), Some("agent2"));
        assert_eq!(resolve_choice(&participants, "watpiacy"), None);
    }

    #[test]
    fn plurality_requires_a_strict_maximum() {
        assert_eq!(
            plurality([("agent1", 3), ("agent2", 0)]),
            Verdict::Winner("agent1".into())
        );
        assert_eq!(plurality([("agent1", 2), ("agent2", 2)]), Verdict::Tie);
        assert_eq!(
            plurality([("agent1", 1), ("agent2", 2), ("agent3", 2), ("agent4", 3)]),
            Verdict::Winner("agent4".into())
        );
        assert_eq!(plurality([("agent1", 0), ("agent2", 0)]), Verdict::Tie);
        assert_eq!(plurality(Vec::<(&str, u32)>::new()), Verdict::Tie);
    }

    #[test]
    fn empty_tally_lists_every_slot() {
        let tally = empty_tally(&names(&["Adam", "Beata", "Wątpiący"]));
        assert_eq!(
            tally.into_iter().collect::<Vec<_>>(),
            vec![
                ("agent1".to_owned(), 0),
                ("agent2".to_owned(), 0),
                ("agent3".to_owned(), 0)
            ]
        );
    }

    #[test]
    fn means_are_rounded_and_default_to_zero() {
        assert_eq!(mean_score(&[]), 0.0);
        assert_eq!(mean_score(&[7, 8, 8]), 7.67);
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let ranked = rank_by_mean(vec![
            ("Adam".into(), vec![6]),
            ("Beata".into(), vec![9, 8]),
            ("Wątpiący".into(), vec![]),
            ("Daria".into(), vec![6]),
        ]);
        assert_eq!(
            ranked,
            vec![
                ("Beata".to_owned(), 8.5),
                ("Adam".to_owned(), 6.0),
                ("Daria".to_owned(), 6.0),
                ("Wątpiący".to_owned(), 0.0),
            ]
        );
        assert_eq!(ranking_winner(&ranked), Some("Beata"));
        assert_eq!(ranking_winner(&ranked[1..3]), None);
    }
}
