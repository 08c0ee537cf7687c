//! Per-card diagnostics: the values behind the next ease suggestion, with the
//! leashed and unleashed results side by side.

use std::fmt;

use serde::Serialize;

use crate::adjust::CardInputs;
use crate::config::{DeckOptions, EngineConfig};
use crate::correction::{estimate, LeashMode};
use crate::error::EaseResult;
use crate::store::ReviewStore;
use crate::types::{CardId, EaseFactor, ReviewOutcome, STATS_RECENT_OUTCOMES};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardStats {
    pub card_id: CardId,
    pub success_rate: f64,
    pub average_ease: f64,
    pub delta_ratio: f64,
    pub last_recorded_factor: Option<EaseFactor>,
    pub actual_factor: EaseFactor,
    /// `None` when the card is outside the review queue and only reviews count
    pub new_factor: Option<EaseFactor>,
    pub unleashed_factor: Option<EaseFactor>,
    pub total_reviews: usize,
    /// Most recent outcomes, oldest first
    pub recent_outcomes: Vec<ReviewOutcome>,
    pub deck: DeckOptions,
}

/// Collect diagnostics for a card, optionally as if it had just been answered.
pub fn card_stats<S: ReviewStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    card_id: CardId,
    answer: Option<ReviewOutcome>,
) -> EaseResult<CardStats> {
    let inputs = CardInputs::load(store, config, card_id, answer)?;
    let est = estimate(config, inputs.starting_ease, &inputs.reviews, &inputs.factors)?;

    let frozen = config.reviews_only && !store.in_review_queue(card_id)?;
    let (new_factor, unleashed_factor) = if frozen {
        (None, None)
    } else {
        (
            Some(inputs.next_factor(config, LeashMode::Leashed)?),
            Some(inputs.next_factor(config, LeashMode::Unleashed)?),
        )
    };

    let skip = inputs.reviews.len().saturating_sub(STATS_RECENT_OUTCOMES);
    Ok(CardStats {
        card_id,
        success_rate: est.success_rate,
        average_ease: est.average_ease,
        delta_ratio: est.delta_ratio,
        last_recorded_factor: inputs.last_recorded_factor,
        actual_factor: inputs.actual_factor,
        new_factor,
        unleashed_factor,
        total_reviews: inputs.reviews.len(),
        recent_outcomes: inputs.reviews[skip..].to_vec(),
        deck: store.deck_options(card_id)?,
    })
}

impl fmt::Display for CardStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "card ID: {}", self.card_id)?;
        writeln!(f, "MAvg success rate: {:.4}", self.success_rate)?;
        writeln!(f, "MAvg factor: {:.2} (delta: {:.2})", self.average_ease, self.delta_ratio)?;

        match self.last_recorded_factor {
            Some(last) if last == self.actual_factor => writeln!(f, "Last rev factor: {last}")?,
            Some(last) => writeln!(f, "Last rev factor: {last} (actual: {})", self.actual_factor)?,
            None => writeln!(f, "Last rev factor: none (actual: {})", self.actual_factor)?,
        }

        match (self.new_factor, self.unleashed_factor) {
            (Some(new), Some(unleashed)) if new != unleashed => {
                writeln!(f, "New factor: {new} (unleashed: {unleashed})")?
            }
            (Some(new), _) => writeln!(f, "New factor: {new}")?,
            (None, _) => writeln!(f, "New factor: NONREVIEW, NO CHANGE")?,
        }

        let outcomes: Vec<String> = self
            .recent_outcomes
            .iter()
            .map(|o| o.as_ease().to_string())
            .collect();
        let ellipsis = if self.total_reviews > self.recent_outcomes.len() { "..., " } else { "" };
        writeln!(f, "Rep list: {ellipsis}{}", outcomes.join(", "))?;

        write!(
            f,
            "Deck: start {}, easy x{:.2}, hard x{:.2}, lapse x{:.2}, max ivl {}d",
            self.deck.initial_factor,
            self.deck.easy_bonus,
            self.deck.hard_factor,
            self.deck.lapse_multiplier,
            self.deck.max_interval_days
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Collection, MemoryStore, StoredCard, StoredDeck};
    use crate::types::{ReviewEntry, ReviewKind};
    use ReviewOutcome::*;

    fn store(outcomes: &[ReviewOutcome], in_review_queue: bool) -> MemoryStore {
        let reviews = outcomes
            .iter()
            .enumerate()
            .map(|(i, &outcome)| ReviewEntry {
                id: i as i64,
                outcome,
                kind: ReviewKind::Review,
                factor: 0,
            })
            .collect();
        MemoryStore::new(Collection {
            decks: vec![StoredDeck {
                id: 1,
                name: "Deck".to_string(),
                options: DeckOptions::default(),
                cards: vec![StoredCard { id: 5, factor: 2500, in_review_queue, reviews }],
            }],
        })
        .unwrap()
    }

    #[test]
    fn test_stats_for_pending_failure() {
        let store = store(&[], true);
        let stats = card_stats(&store, &EngineConfig::default(), 5, Some(Again)).unwrap();

        assert!((stats.success_rate - 0.68).abs() < 1e-10);
        assert_eq!(stats.average_ease, 2500.0);
        assert_eq!(stats.new_factor, Some(2280));
        assert_eq!(stats.unleashed_factor, Some(1054));
        assert_eq!(stats.last_recorded_factor, None);

        let text = stats.to_string();
        assert!(text.contains("New factor: 2280 (unleashed: 1054)"));
        assert!(text.contains("Last rev factor: none (actual: 2500)"));
        assert!(text.contains("Rep list: 1\n"));
    }

    #[test]
    fn test_stats_truncate_outcomes() {
        let history = [Good; 14];
        let store = store(&history, true);
        let stats = card_stats(&store, &EngineConfig::default(), 5, None).unwrap();

        assert_eq!(stats.total_reviews, 14);
        assert_eq!(stats.recent_outcomes.len(), 10);
        assert!(stats.to_string().contains("Rep list: ..., 3, 3"));
    }

    #[test]
    fn test_stats_nonreview_card() {
        let store = store(&[Good], false);
        let config = EngineConfig { reviews_only: true, ..Default::default() };
        let stats = card_stats(&store, &config, 5, Some(Good)).unwrap();

        assert_eq!(stats.new_factor, None);
        assert!(stats.to_string().contains("NONREVIEW, NO CHANGE"));
    }

    #[test]
    fn test_stats_deck_line() {
        let store = store(&[], true);
        let stats = card_stats(&store, &EngineConfig::default(), 5, None).unwrap();
        assert!(stats
            .to_string()
            .ends_with("Deck: start 2500, easy x1.30, hard x1.20, lapse x0.00, max ivl 3650d"));
    }
}
