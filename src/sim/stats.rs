//! Score, combo and end-of-game summary

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::wave::AttackWave;
use crate::consts::SUMMARY_TOP_WORDS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Win,
    Loss,
}

/// Shown once the game ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub status: GameStatus,
    pub points: u64,
    /// Destroyed words with how often each was hit, most frequent first
    pub most_common_words: Vec<(String, u32)>,
    pub best_combo_per_wave: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameStat {
    pub points: u64,
    /// Destroyed sequences since the last break, each followed by a space
    pub combo: String,
    /// Longest combo seen in each wave
    pub best_combo: Vec<String>,
    /// A full word was just typed, so the next word may start fresh
    pub can_start_word: bool,
    pub seen_words: BTreeMap<String, u32>,
}

impl GameStat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_next_wave(&mut self) {
        self.best_combo.push(String::new());
    }

    /// Record a destroyed group.
    pub fn add_combo(&mut self, seq: &str, wave: Option<&mut AttackWave>) {
        *self.seen_words.entry(seq.to_string()).or_insert(0) += 1;
        if let Some(wave) = wave {
            wave.submit_word(seq);
        }
        self.combo.push_str(seq);
        self.combo.push(' ');
        if let Some(best) = self.best_combo.last_mut()
            && self.combo.len() > best.len()
        {
            *best = self.combo.clone();
        }
    }

    /// Bank the combo length as points and start over.
    pub fn clear_combo(&mut self, wave: Option<&mut AttackWave>) {
        if let Some(wave) = wave {
            wave.submit_word("");
        }
        self.points += self.combo.chars().count() as u64;
        self.combo.clear();
    }

    pub fn summary(&self, status: GameStatus) -> Summary {
        let mut words: Vec<(String, u32)> = self.seen_words.iter().map(|(w, &n)| (w.clone(), n)).collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
        words.truncate(SUMMARY_TOP_WORDS);
        Summary {
            status,
            points: self.points,
            most_common_words: words,
            best_combo_per_wave: self.best_combo.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_add_combo_tracks_best() {
        let mut stats = GameStat::new();
        stats.on_next_wave();
        stats.add_combo("go", None);
        stats.add_combo("home", None);
        assert_eq!(stats.combo, "go home ");
        assert_eq!(stats.best_combo, vec!["go home ".to_string()]);

        stats.clear_combo(None);
        assert_eq!(stats.points, 8);
        stats.add_combo("a", None);
        assert_eq!(stats.best_combo[0], "go home ");

        stats.on_next_wave();
        stats.add_combo("b", None);
        assert_eq!(stats.best_combo[1], "a b ");
    }

    #[test]
    fn test_summary_orders_words() {
        let mut stats = GameStat::new();
        for w in ["go", "home", "go", "zap", "go", "home"] {
            stats.add_combo(w, None);
        }
        stats.add_combo("ant", None);
        let summary = stats.summary(GameStatus::Win);
        let words: Vec<_> = summary.most_common_words.iter().map(|(w, n)| (w.as_str(), *n)).collect();
        assert_eq!(words, vec![("go", 3), ("home", 2), ("zap", 1), ("ant", 1)]);
    }

    #[test]
    fn test_summary_top_words_capped() {
        let mut stats = GameStat::new();
        for i in 0..30 {
            stats.add_combo(&format!("w{i}"), None);
        }
        assert_eq!(stats.summary(GameStatus::Loss).most_common_words.len(), SUMMARY_TOP_WORDS);
    }

    #[test]
    fn test_summary_serializes_lowercase_status() {
        let json = serde_json::to_string(&GameStat::new().summary(GameStatus::Loss)).unwrap();
        assert!(json.contains("\"status\":\"loss\""));
        assert!(json.contains("bestComboPerWave"));
    }

    proptest! {
        #[test]
        fn prop_clear_combo_banks_length(words in prop::collection::vec("[a-z]{1,6}", 0..8), start in 0u64..1000) {
            let mut stats = GameStat::new();
            stats.points = start;
            for w in &words {
                stats.add_combo(w, None);
            }
            let banked = stats.combo.len() as u64;
            stats.clear_combo(None);
            prop_assert!(stats.combo.is_empty());
            prop_assert_eq!(stats.points, start + banked);
        }
    }
}
