//! Review store interface
//!
//! The controller never owns review data. Hosts expose their review log and
//! card table through [`ReviewStore`]; [`MemoryStore`] is an in-process
//! implementation backed by a deck file.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::config::DeckOptions;
use crate::error::{EaseError, EaseResult};
use crate::types::{CardId, DeckId, EaseFactor, ReviewEntry, ReviewId};

/// Host review system.
///
/// Writes must be atomic per card: after `persist_factor_history_rewrite`
/// returns `Ok`, every listed review carries its new factor.
/// `persist_recompute` extends that to the log rewrite plus the final ease.
pub trait ReviewStore {
    /// Chronological review log of a card. Manual entries are never returned;
    /// with `reviews_only` only review-queue answers are.
    fn review_history(&self, card_id: CardId, reviews_only: bool) -> EaseResult<Vec<ReviewEntry>>;

    /// Positive factors recorded with the card's reviews, oldest first
    fn factor_history(&self, card_id: CardId) -> EaseResult<Vec<EaseFactor>>;

    fn deck_options(&self, card_id: CardId) -> EaseResult<DeckOptions>;

    fn starting_ease(&self, card_id: CardId) -> EaseResult<EaseFactor> {
        Ok(self.deck_options(card_id)?.initial_factor)
    }

    /// Ease currently assigned to the card
    fn current_factor(&self, card_id: CardId) -> EaseResult<EaseFactor>;

    fn in_review_queue(&self, card_id: CardId) -> EaseResult<bool>;

    fn persist_factor(&self, card_id: CardId, value: EaseFactor) -> EaseResult<()>;

    fn persist_factor_history_rewrite(
        &self,
        card_id: CardId,
        rewrite: &[(ReviewId, EaseFactor)],
    ) -> EaseResult<()>;

    /// Rewrite a card's review factors and set its ease as one write.
    ///
    /// On error the card keeps its previous log and ease. Stores that can
    /// write both under one transaction should override this; the default
    /// puts the previous factors back when the final write fails.
    fn persist_recompute(
        &self,
        card_id: CardId,
        rewrite: &[(ReviewId, EaseFactor)],
        final_factor: EaseFactor,
    ) -> EaseResult<()> {
        let touched: HashSet<ReviewId> = rewrite.iter().map(|&(id, _)| id).collect();
        let previous: Vec<(ReviewId, EaseFactor)> = self
            .review_history(card_id, false)?
            .into_iter()
            .filter(|r| touched.contains(&r.id))
            .map(|r| (r.id, r.factor))
            .collect();

        self.persist_factor_history_rewrite(card_id, rewrite)?;
        if let Err(e) = self.persist_factor(card_id, final_factor) {
            if let Err(restore) = self.persist_factor_history_rewrite(card_id, &previous) {
                error!(card_id, error = %restore, "failed to restore review log");
            }
            return Err(e);
        }
        Ok(())
    }

    fn deck_cards(&self, deck_id: DeckId) -> EaseResult<Vec<CardId>>;

    fn review_ids(&self) -> EaseResult<Vec<ReviewId>>;

    /// Cards with at least one counted review whose id is not in `known`
    fn cards_reviewed_outside(&self, known: &HashSet<ReviewId>) -> EaseResult<Vec<CardId>>;
}

// ==================== Deck File ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCard {
    pub id: CardId,
    pub factor: EaseFactor,
    #[serde(default = "default_in_review")]
    pub in_review_queue: bool,
    #[serde(default)]
    pub reviews: Vec<ReviewEntry>,
}

impl StoredCard {
    /// Set review factors by id. Every id is checked before anything changes.
    fn rewrite_factors(
        &mut self,
        card_id: CardId,
        rewrite: &[(ReviewId, EaseFactor)],
    ) -> EaseResult<()> {
        let positions = rewrite
            .iter()
            .map(|&(review_id, factor)| {
                self.reviews
                    .iter()
                    .position(|r| r.id == review_id)
                    .map(|pos| (pos, factor))
                    .ok_or_else(|| {
                        EaseError::persistence(card_id, format!("unknown review {review_id}"))
                    })
            })
            .collect::<EaseResult<Vec<_>>>()?;

        for (pos, factor) in positions {
            self.reviews[pos].factor = factor;
        }
        Ok(())
    }
}

fn default_in_review() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDeck {
    pub id: DeckId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub options: DeckOptions,
    #[serde(default)]
    pub cards: Vec<StoredCard>,
}

/// On-disk layout read and written by [`MemoryStore`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub decks: Vec<StoredDeck>,
}

impl Collection {
    pub fn load(path: impl AsRef<Path>) -> EaseResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> EaseResult<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

// ==================== Memory Store ====================

#[derive(Debug)]
struct Inner {
    decks: Vec<StoredDeck>,
    // card id -> (deck index, card index)
    index: HashMap<CardId, (usize, usize)>,
}

impl Inner {
    fn card(&self, card_id: CardId) -> EaseResult<&StoredCard> {
        let &(d, c) = self
            .index
            .get(&card_id)
            .ok_or_else(|| EaseError::invalid(format!("unknown card {card_id}")))?;
        Ok(&self.decks[d].cards[c])
    }

    fn card_mut(&mut self, card_id: CardId) -> EaseResult<&mut StoredCard> {
        let &(d, c) = self
            .index
            .get(&card_id)
            .ok_or_else(|| EaseError::persistence(card_id, "unknown card"))?;
        Ok(&mut self.decks[d].cards[c])
    }
}

/// Thread-safe in-memory review store
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new(collection: Collection) -> EaseResult<Self> {
        let mut index = HashMap::new();
        for (d, deck) in collection.decks.iter().enumerate() {
            for (c, card) in deck.cards.iter().enumerate() {
                if index.insert(card.id, (d, c)).is_some() {
                    return Err(EaseError::invalid(format!("duplicate card id {}", card.id)));
                }
            }
        }
        Ok(Self {
            inner: RwLock::new(Inner {
                decks: collection.decks,
                index,
            }),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> EaseResult<Self> {
        Self::new(Collection::load(path)?)
    }

    /// Copy of the current contents, with every persisted write applied
    pub fn collection(&self) -> Collection {
        Collection {
            decks: self.inner.read().decks.clone(),
        }
    }

    /// Append an answered review to a card's log
    pub fn record_review(&self, card_id: CardId, entry: ReviewEntry) -> EaseResult<()> {
        let mut inner = self.inner.write();
        inner.card_mut(card_id)?.reviews.push(entry);
        Ok(())
    }
}

impl ReviewStore for MemoryStore {
    fn review_history(&self, card_id: CardId, reviews_only: bool) -> EaseResult<Vec<ReviewEntry>> {
        let inner = self.inner.read();
        Ok(inner
            .card(card_id)?
            .reviews
            .iter()
            .filter(|r| r.kind.counts(reviews_only))
            .cloned()
            .collect())
    }

    fn factor_history(&self, card_id: CardId) -> EaseResult<Vec<EaseFactor>> {
        let inner = self.inner.read();
        Ok(inner
            .card(card_id)?
            .reviews
            .iter()
            .filter(|r| r.kind.counts(false) && r.factor > 0)
            .map(|r| r.factor)
            .collect())
    }

    fn deck_options(&self, card_id: CardId) -> EaseResult<DeckOptions> {
        let inner = self.inner.read();
        let &(d, _) = inner
            .index
            .get(&card_id)
            .ok_or_else(|| EaseError::invalid(format!("unknown card {card_id}")))?;
        Ok(inner.decks[d].options.clone())
    }

    fn current_factor(&self, card_id: CardId) -> EaseResult<EaseFactor> {
        Ok(self.inner.read().card(card_id)?.factor)
    }

    fn in_review_queue(&self, card_id: CardId) -> EaseResult<bool> {
        Ok(self.inner.read().card(card_id)?.in_review_queue)
    }

    fn persist_factor(&self, card_id: CardId, value: EaseFactor) -> EaseResult<()> {
        let mut inner = self.inner.write();
        inner.card_mut(card_id)?.factor = value;
        Ok(())
    }

    fn persist_factor_history_rewrite(
        &self,
        card_id: CardId,
        rewrite: &[(ReviewId, EaseFactor)],
    ) -> EaseResult<()> {
        let mut inner = self.inner.write();
        inner.card_mut(card_id)?.rewrite_factors(card_id, rewrite)
    }

    fn persist_recompute(
        &self,
        card_id: CardId,
        rewrite: &[(ReviewId, EaseFactor)],
        final_factor: EaseFactor,
    ) -> EaseResult<()> {
        let mut inner = self.inner.write();
        let card = inner.card_mut(card_id)?;
        card.rewrite_factors(card_id, rewrite)?;
        card.factor = final_factor;
        Ok(())
    }

    fn deck_cards(&self, deck_id: DeckId) -> EaseResult<Vec<CardId>> {
        let inner = self.inner.read();
        inner
            .decks
            .iter()
            .find(|d| d.id == deck_id)
            .map(|d| d.cards.iter().map(|c| c.id).collect())
            .ok_or_else(|| EaseError::invalid(format!("unknown deck {deck_id}")))
    }

    fn review_ids(&self) -> EaseResult<Vec<ReviewId>> {
        let inner = self.inner.read();
        Ok(inner
            .decks
            .iter()
            .flat_map(|d| d.cards.iter())
            .flat_map(|c| c.reviews.iter().map(|r| r.id))
            .collect())
    }

    fn cards_reviewed_outside(&self, known: &HashSet<ReviewId>) -> EaseResult<Vec<CardId>> {
        let inner = self.inner.read();
        Ok(inner
            .decks
            .iter()
            .flat_map(|d| d.cards.iter())
            .filter(|c| {
                c.reviews
                    .iter()
                    .any(|r| r.kind.counts(false) && !known.contains(&r.id))
            })
            .map(|c| c.id)
            .collect())
    }
}
