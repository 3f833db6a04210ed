//! Proto-language per faction: a bounded lexicon of generated tokens keyed
//! by concept, agent utterances drawn from it, and scribe notes whose
//! translation is deferred to the external best-effort service.

use crate::rng::KernelRng;
use biotica_data::AgentIntent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const LEXICON_CAP: usize = 64;

const ONSETS: [&str; 10] = ["k", "t", "m", "n", "s", "r", "v", "z", "gh", "th"];
const VOWELS: [&str; 6] = ["a", "e", "i", "o", "u", "au"];
const CODAS: [&str; 6] = ["", "n", "r", "sh", "k", "l"];

/// Core concepts every faction names early; further concepts accrete with
/// literacy.
pub const SEED_CONCEPTS: [&str; 10] = [
    "food", "water", "danger", "home", "stone", "wood", "spirit", "trade", "war", "kin",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lexicon {
    /// concept → token. BTreeMap: iteration and serialization order are the
    /// concept order, never hash order.
    pub tokens: BTreeMap<String, String>,
}

impl Lexicon {
    /// Seed the starting vocabulary for a newly founded faction.
    pub fn seed(&mut self, rng: &mut KernelRng) {
        for concept in SEED_CONCEPTS {
            let token = coin_token(rng);
            self.tokens.insert(concept.to_string(), token);
        }
    }

    /// Slow vocabulary growth: literate factions coin tokens for derived
    /// concepts. Bounded at `LEXICON_CAP`.
    pub fn grow(&mut self, literacy: f32, rng: &mut KernelRng) {
        if self.tokens.len() >= LEXICON_CAP {
            return;
        }
        if !rng.chance(0.002 + literacy * 0.004) {
            return;
        }
        let n = self.tokens.len();
        let concept = format!("concept-{n}");
        let token = coin_token(rng);
        self.tokens.insert(concept, token);
    }

    #[must_use]
    pub fn token_for(&self, concept: &str) -> Option<&str> {
        self.tokens.get(concept).map(String::as_str)
    }

    /// A short token sequence appropriate to the agent's current intent.
    #[must_use]
    pub fn utterance_for(&self, intent: AgentIntent, rng: &mut KernelRng) -> Vec<String> {
        let concepts: &[&str] = match intent {
            AgentIntent::Gather => &["food", "kin"],
            AgentIntent::Hunt => &["food", "danger"],
            AgentIntent::Craft => &["stone", "wood"],
            AgentIntent::Build => &["home", "wood"],
            AgentIntent::Move => &["home"],
            AgentIntent::Rest => &["home", "kin"],
            AgentIntent::Trade => &["trade", "kin"],
            AgentIntent::Worship => &["spirit"],
            AgentIntent::Patrol => &["war", "home"],
            AgentIntent::Flee => &["danger", "water"],
        };
        let mut out = Vec::new();
        for c in concepts {
            if let Some(t) = self.token_for(c) {
                out.push(t.to_string());
            }
        }
        // Occasionally pad with a random known token, the way speech drifts.
        if rng.chance(0.3) && !self.tokens.is_empty() {
            let skip = rng.next_int(self.tokens.len() as u32) as usize;
            if let Some(t) = self.tokens.values().nth(skip) {
                out.push(t.clone());
            }
        }
        out
    }
}

fn coin_token(rng: &mut KernelRng) -> String {
    let syllables = 1 + rng.next_int(2);
    let mut token = String::new();
    for _ in 0..=syllables {
        token.push_str(ONSETS[rng.next_int(ONSETS.len() as u32) as usize]);
        token.push_str(VOWELS[rng.next_int(VOWELS.len() as u32) as usize]);
    }
    token.push_str(CODAS[rng.next_int(CODAS.len() as u32) as usize]);
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_names_all_core_concepts() {
        let mut lex = Lexicon::default();
        let mut rng = KernelRng::new(11);
        lex.seed(&mut rng);
        for c in SEED_CONCEPTS {
            assert!(lex.token_for(c).is_some(), "missing token for {c}");
        }
    }

    #[test]
    fn lexicon_growth_is_bounded() {
        let mut lex = Lexicon::default();
        let mut rng = KernelRng::new(5);
        lex.seed(&mut rng);
        for _ in 0..200_000 {
            lex.grow(1.0, &mut rng);
        }
        assert!(lex.tokens.len() <= LEXICON_CAP);
    }

    #[test]
    fn utterances_use_known_tokens() {
        let mut lex = Lexicon::default();
        let mut rng = KernelRng::new(3);
        lex.seed(&mut rng);
        let words = lex.utterance_for(AgentIntent::Hunt, &mut rng);
        assert!(!words.is_empty());
        for w in &words {
            assert!(lex.tokens.values().any(|t| t == w));
        }
    }
}
