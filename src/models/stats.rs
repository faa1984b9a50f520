//! Progress numbers for the main screen.
use super::Flashcard;
use super::review_state::MAX_KNOWLEDGE_LEVEL;
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stats {
    pub total: usize,
    pub due: usize,
    pub new: usize,
    /// Index 0 holds level 1.
    pub per_level: [usize; MAX_KNOWLEDGE_LEVEL as usize],
    pub mean_easiness: Option<f64>,
}

impl Stats {
    pub fn collect(cards: &[Flashcard], now: DateTime<Utc>) -> Self {
        let mut stats = Stats {
            total: cards.len(),
            ..Default::default()
        };
        let mut easiness_sum = 0.0;

        for card in cards {
            if card.review.is_due(now) {
                stats.due += 1;
            }
            if card.review.is_new() {
                stats.new += 1;
            }
            let level = card.review.knowledge_level.clamp(1, MAX_KNOWLEDGE_LEVEL);
            stats.per_level[(level - 1) as usize] += 1;
            easiness_sum += card.review.easiness;
        }

        if !cards.is_empty() {
            stats.mean_easiness = Some(easiness_sum / cards.len() as f64);
        }
        stats
    }

    pub fn count_for_level(&self, level: u8) -> usize {
        level
            .checked_sub(1)
            .and_then(|idx| self.per_level.get(idx as usize))
            .copied()
            .unwrap_or(0)
    }
}
