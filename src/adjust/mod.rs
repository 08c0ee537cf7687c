//! Ease adjustment against a review store
//!
//! - [`adjust_on_answer`] - live update when a card is answered
//! - [`batch::adjust_cards`] - replay and rewrite whole histories for many cards
//! - [`batch::SyncCheckpoint`] - recompute only cards that gained reviews in a sync

pub mod batch;

use tracing::debug;

use crate::config::EngineConfig;
use crate::correction::LeashMode;
use crate::error::EaseResult;
use crate::replay::step_with_mode;
use crate::store::ReviewStore;
use crate::types::{CardId, EaseFactor, ReviewOutcome};

pub use batch::{
    adjust_after_sync, adjust_cards, adjust_deck, BatchOptions, BatchReport, CardFailure,
    NoProgress, ProgressSink, SyncCheckpoint,
};

/// Controller inputs for one card, as loaded from the store
#[derive(Debug, Clone, PartialEq)]
pub struct CardInputs {
    pub starting_ease: EaseFactor,
    /// Ease the card currently carries
    pub actual_factor: EaseFactor,
    /// Last factor recorded in the review log, if any
    pub last_recorded_factor: Option<EaseFactor>,
    pub reviews: Vec<ReviewOutcome>,
    /// Factor history the next step is computed from; its last entry is the
    /// card's actual factor
    pub factors: Vec<EaseFactor>,
}

impl CardInputs {
    /// Load a card's inputs, optionally with a fresh answer appended.
    ///
    /// The recorded factor history may lag behind the card (the ease can be
    /// changed outside the review log), so its last entry is replaced by the
    /// card's actual factor. Without a fresh answer the last review already
    /// produced that factor, so it is dropped to recompute it.
    pub fn load<S: ReviewStore + ?Sized>(
        store: &S,
        config: &EngineConfig,
        card_id: CardId,
        answer: Option<ReviewOutcome>,
    ) -> EaseResult<Self> {
        let starting_ease = store.starting_ease(card_id)?;
        let actual_factor = store.current_factor(card_id)?;

        let mut reviews: Vec<ReviewOutcome> = store
            .review_history(card_id, config.reviews_only)?
            .into_iter()
            .map(|r| r.outcome)
            .collect();
        if let Some(answer) = answer {
            reviews.push(answer);
        }

        let mut factors = store.factor_history(card_id)?;
        let last_recorded_factor = factors.last().copied();
        if let Some(last) = factors.last_mut() {
            *last = actual_factor;
        }
        if answer.is_none() && factors.len() > 1 {
            factors.pop();
        }

        Ok(Self {
            starting_ease,
            actual_factor,
            last_recorded_factor,
            reviews,
            factors,
        })
    }

    pub fn next_factor(&self, config: &EngineConfig, mode: LeashMode) -> EaseResult<EaseFactor> {
        step_with_mode(config, self.starting_ease, &self.reviews, &self.factors, mode)
    }
}

/// Update a card's ease after it was answered with `answer`.
///
/// Returns `None` without touching the card when only review answers count
/// and the card is not in the review queue.
pub fn adjust_on_answer<S: ReviewStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    card_id: CardId,
    answer: ReviewOutcome,
) -> EaseResult<Option<EaseFactor>> {
    if config.reviews_only && !store.in_review_queue(card_id)? {
        debug!(card_id, "card outside review queue, ease unchanged");
        return Ok(None);
    }

    let inputs = CardInputs::load(store, config, card_id, Some(answer))?;
    let new_factor = inputs.next_factor(config, LeashMode::Leashed)?;
    store.persist_factor(card_id, new_factor)?;

    debug!(
        card_id,
        old_factor = inputs.actual_factor,
        new_factor,
        reviews = inputs.reviews.len(),
        "ease adjusted"
    );
    Ok(Some(new_factor))
}
