//! Ease snapshots
//!
//! A snapshot maps card ids to ease factors so a deck's ease state can be
//! saved before experimenting with the configuration and restored verbatim.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::EaseResult;
use crate::store::ReviewStore;
use crate::types::{CardId, DeckId, EaseFactor};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EaseSnapshot {
    #[serde(default)]
    pub deck_id: Option<DeckId>,
    pub factors: BTreeMap<CardId, EaseFactor>,
}

impl EaseSnapshot {
    pub fn load(path: impl AsRef<Path>) -> EaseResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> EaseResult<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub updated: usize,
    pub unchanged: usize,
    /// Snapshot entries for cards that are not in the deck
    pub unknown: usize,
}

/// Capture the current ease of every card in a deck
pub fn export_deck<S: ReviewStore + ?Sized>(store: &S, deck_id: DeckId) -> EaseResult<EaseSnapshot> {
    let mut factors = BTreeMap::new();
    for card_id in store.deck_cards(deck_id)? {
        factors.insert(card_id, store.current_factor(card_id)?);
    }
    info!(deck_id, cards = factors.len(), "Exported ease factors");
    Ok(EaseSnapshot {
        deck_id: Some(deck_id),
        factors,
    })
}

/// Restore a deck's ease from a snapshot.
///
/// Cards missing from the snapshot keep their current ease.
pub fn import_deck<S: ReviewStore + ?Sized>(
    store: &S,
    deck_id: DeckId,
    snapshot: &EaseSnapshot,
) -> EaseResult<ImportReport> {
    let cards = store.deck_cards(deck_id)?;
    let mut report = ImportReport::default();

    for &card_id in &cards {
        match snapshot.factors.get(&card_id) {
            Some(&factor) if factor != store.current_factor(card_id)? => {
                store.persist_factor(card_id, factor)?;
                report.updated += 1;
            }
            _ => report.unchanged += 1,
        }
    }

    report.unknown = snapshot
        .factors
        .keys()
        .filter(|&id| !cards.contains(id))
        .count();
    if report.unknown > 0 {
        warn!(deck_id, unknown = report.unknown, "Snapshot has cards outside the deck");
    }
    info!(deck_id, updated = report.updated, "Imported ease factors");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeckOptions;
    use crate::store::{Collection, MemoryStore, StoredCard, StoredDeck};

    fn store() -> MemoryStore {
        let card = |id, factor| StoredCard { id, factor, in_review_queue: true, reviews: vec![] };
        MemoryStore::new(Collection {
            decks: vec![
                StoredDeck {
                    id: 1,
                    name: "A".to_string(),
                    options: DeckOptions::default(),
                    cards: vec![card(1, 2500), card(2, 1800), card(3, 3300)],
                },
                StoredDeck {
                    id: 2,
                    name: "B".to_string(),
                    options: DeckOptions::default(),
                    cards: vec![card(4, 2100)],
                },
            ],
        })
        .unwrap()
    }

    #[test]
    fn test_export_deck() {
        let snapshot = export_deck(&store(), 1).unwrap();
        assert_eq!(snapshot.deck_id, Some(1));
        assert_eq!(
            snapshot.factors.into_iter().collect::<Vec<_>>(),
            vec![(1, 2500), (2, 1800), (3, 3300)]
        );
    }

    #[test]
    fn test_import_restores_exported_state() {
        let store = store();
        let snapshot = export_deck(&store, 1).unwrap();
        store.persist_factor(1, 1300).unwrap();
        store.persist_factor(3, 4000).unwrap();

        let report = import_deck(&store, 1, &snapshot).unwrap();
        assert_eq!(report, ImportReport { updated: 2, unchanged: 1, unknown: 0 });
        assert_eq!(store.current_factor(1).unwrap(), 2500);
        assert_eq!(store.current_factor(3).unwrap(), 3300);
    }

    #[test]
    fn test_import_ignores_other_decks() {
        let store = store();
        let snapshot = EaseSnapshot {
            deck_id: None,
            factors: [(2, 2000), (4, 1000)].into_iter().collect(),
        };
        let report = import_deck(&store, 1, &snapshot).unwrap();

        assert_eq!(report, ImportReport { updated: 1, unchanged: 2, unknown: 1 });
        assert_eq!(store.current_factor(2).unwrap(), 2000);
        assert_eq!(store.current_factor(4).unwrap(), 2100);
    }

    #[test]
    fn test_snapshot_json_keys() {
        let snapshot = EaseSnapshot {
            deck_id: Some(1),
            factors: [(42, 2500)].into_iter().collect(),
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"deck_id":1,"factors":{"42":2500}}"#);
    }

    #[test]
    fn test_unknown_deck() {
        assert!(export_deck(&store(), 9).is_err());
    }
}
