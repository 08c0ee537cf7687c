use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::config::EngineConfig;
use crate::error::EaseResult;
use crate::replay::replay;
use crate::store::ReviewStore;
use crate::types::{CardId, DeckId, EaseFactor, ReviewId, DEFAULT_PROGRESS_EVERY};

/// Receives progress of a long-running recompute
pub trait ProgressSink {
    fn report(&self, processed: usize, label: &str);

    /// Polled between cards; a card's replay is never interrupted
    fn want_cancel(&self) -> bool {
        false
    }
}

/// Sink that ignores progress and never cancels
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _processed: usize, _label: &str) {}
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Cards between two progress reports
    pub progress_every: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardFailure {
    pub card_id: CardId,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub adjusted: usize,
    pub failed: Vec<CardFailure>,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl BatchReport {
    fn empty() -> Self {
        Self {
            adjusted: 0,
            failed: Vec::new(),
            cancelled: false,
            elapsed: Duration::ZERO,
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Adjusted ease for {} cards in {:.2} seconds",
            self.adjusted,
            self.elapsed.as_secs_f64()
        )?;
        if !self.failed.is_empty() {
            write!(f, " ({} failed)", self.failed.len())?;
        }
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

/// Replay one card's full history, rewrite its log and set its final ease.
///
/// Nothing is written until the whole replay has succeeded, and the log and
/// ease then go to the store in a single `persist_recompute`.
pub fn recompute_card<S: ReviewStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    card_id: CardId,
) -> EaseResult<EaseFactor> {
    let starting_ease = store.starting_ease(card_id)?;
    let entries = store.review_history(card_id, config.reviews_only)?;
    let outcomes: Vec<_> = entries.iter().map(|e| e.outcome).collect();

    let factors = replay(config, starting_ease, &outcomes)?;
    let rewrite: Vec<(ReviewId, EaseFactor)> = entries
        .iter()
        .zip(factors.iter().skip(1))
        .map(|(entry, &factor)| (entry.id, factor))
        .collect();
    let final_factor = factors.last().copied().unwrap_or(starting_ease);

    store.persist_recompute(card_id, &rewrite, final_factor)?;
    Ok(final_factor)
}

/// Recompute every card in `card_ids`, in order.
///
/// A failing card is logged and recorded in the report; the batch moves on.
/// Only an invalid configuration aborts the whole run.
pub fn adjust_cards<S, P>(
    store: &S,
    config: &EngineConfig,
    card_ids: &[CardId],
    options: &BatchOptions,
    progress: &P,
) -> EaseResult<BatchReport>
where
    S: ReviewStore + ?Sized,
    P: ProgressSink + ?Sized,
{
    config.validate()?;

    let start = Instant::now();
    let every = options.progress_every.max(1);
    let mut report = BatchReport::empty();
    info!(card_count = card_ids.len(), "Starting ease recompute");

    for (processed, &card_id) in card_ids.iter().enumerate() {
        if progress.want_cancel() {
            report.cancelled = true;
            break;
        }

        match recompute_card(store, config, card_id) {
            Ok(factor) => {
                debug!(card_id, factor, "card recomputed");
                report.adjusted += 1;
            }
            Err(e) => {
                error!(card_id, error = %e, "card recompute failed");
                report.failed.push(CardFailure {
                    card_id,
                    error: e.to_string(),
                });
            }
        }

        let processed = processed + 1;
        if processed % every == 0 {
            progress.report(processed, &format!("{} cards adjusted", report.adjusted));
        }
    }

    report.elapsed = start.elapsed();
    info!(
        adjusted = report.adjusted,
        failed = report.failed.len(),
        cancelled = report.cancelled,
        duration_ms = report.elapsed.as_millis() as u64,
        "Ease recompute completed"
    );
    Ok(report)
}

/// Recompute every card of a deck
pub fn adjust_deck<S, P>(
    store: &S,
    config: &EngineConfig,
    deck_id: DeckId,
    options: &BatchOptions,
    progress: &P,
) -> EaseResult<BatchReport>
where
    S: ReviewStore + ?Sized,
    P: ProgressSink + ?Sized,
{
    let cards = store.deck_cards(deck_id)?;
    info!(deck_id, "Recomputing deck");
    adjust_cards(store, config, &cards, options, progress)
}

/// Recompute the cards reviewed elsewhere since `checkpoint` was captured
pub fn adjust_after_sync<S, P>(
    store: &S,
    config: &EngineConfig,
    checkpoint: &SyncCheckpoint,
    options: &BatchOptions,
    progress: &P,
) -> EaseResult<BatchReport>
where
    S: ReviewStore + ?Sized,
    P: ProgressSink + ?Sized,
{
    checkpoint.adjust_changed(store, config, options, progress)
}

/// Review ids present before a sync.
///
/// After the sync, cards with reviews outside this set are recomputed.
#[derive(Debug, Clone, Default)]
pub struct SyncCheckpoint {
    known: HashSet<ReviewId>,
}

impl SyncCheckpoint {
    pub fn capture<S: ReviewStore + ?Sized>(store: &S) -> EaseResult<Self> {
        Ok(Self {
            known: store.review_ids()?.into_iter().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    pub fn changed_cards<S: ReviewStore + ?Sized>(&self, store: &S) -> EaseResult<Vec<CardId>> {
        store.cards_reviewed_outside(&self.known)
    }

    /// Recompute the cards that gained reviews since the checkpoint.
    ///
    /// An empty checkpoint (no local log) recomputes nothing.
    pub fn adjust_changed<S, P>(
        &self,
        store: &S,
        config: &EngineConfig,
        options: &BatchOptions,
        progress: &P,
    ) -> EaseResult<BatchReport>
    where
        S: ReviewStore + ?Sized,
        P: ProgressSink + ?Sized,
    {
        if self.is_empty() {
            debug!("empty sync checkpoint, nothing to recompute");
            return Ok(BatchReport::empty());
        }
        let cards = self.changed_cards(store)?;
        info!(changed = cards.len(), known_reviews = self.len(), "Cards reviewed during sync");
        adjust_cards(store, config, &cards, options, progress)
    }
}
