//! Common Types and Constants
//!
//! Shared data structures used across the ease controller modules.

use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Lower bound applied to the smoothed success rate (ln(0) is undefined)
pub const MIN_SUCCESS_RATE: f64 = 0.01;

/// Upper bound applied to the smoothed success rate (ln(1) = 0 divides by zero)
pub const MAX_SUCCESS_RATE: f64 = 0.99;

/// Default target recall ratio
pub const DEFAULT_TARGET_RATIO: f64 = 0.85;

/// Default moving average weight
pub const DEFAULT_WEIGHT: f64 = 0.2;

/// Default hard floor for the ease factor
pub const DEFAULT_MIN_EASE: EaseFactor = 1000;

/// Default hard ceiling for the ease factor
pub const DEFAULT_MAX_EASE: EaseFactor = 5000;

/// Default base leash magnitude
pub const DEFAULT_LEASH: f64 = 100.0;

/// Deck starting ease used when the deck has none configured
pub const DEFAULT_STARTING_EASE: EaseFactor = 2500;

/// Cards processed between two progress reports in a deck recompute
pub const DEFAULT_PROGRESS_EVERY: usize = 500;

/// Number of recent outcomes shown in a stats report
pub const STATS_RECENT_OUTCOMES: usize = 10;

// ==================== Identifiers ====================

/// Ease factor in permille (2500 = 250%)
pub type EaseFactor = u32;

/// Card identifier assigned by the host review store
pub type CardId = i64;

/// Review log entry identifier assigned by the host review store
pub type ReviewId = i64;

pub type DeckId = i64;

// ==================== Review Types ====================

/// Grade given to a single review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewOutcome {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl ReviewOutcome {
    /// Map a raw answer button (1..=4) to an outcome
    pub fn from_ease(ease: u8) -> Option<Self> {
        match ease {
            1 => Some(Self::Again),
            2 => Some(Self::Hard),
            3 => Some(Self::Good),
            4 => Some(Self::Easy),
            _ => None,
        }
    }

    pub fn as_ease(self) -> u8 {
        self as u8
    }

    /// Everything except "again" counts as a successful recall
    pub fn is_success(self) -> bool {
        self != Self::Again
    }
}

/// Kind of event recorded in the review log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewKind {
    Learning,
    #[default]
    Review,
    Relearning,
    Filtered,
    Manual,
}

impl ReviewKind {
    /// Whether an entry of this kind belongs in the history used by the controller
    pub fn counts(self, reviews_only: bool) -> bool {
        match self {
            Self::Manual => false,
            Self::Review => true,
            _ => !reviews_only,
        }
    }
}

/// One entry of a card's review log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub id: ReviewId,
    pub outcome: ReviewOutcome,
    #[serde(default)]
    pub kind: ReviewKind,
    /// Ease factor recorded with this review (0 when none was recorded)
    #[serde(default)]
    pub factor: EaseFactor,
}

/// Per-card ease state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardState {
    /// Deck-level starting ease
    pub starting_ease_factor: EaseFactor,
    /// Ease currently assigned to the card
    pub current_ease_factor: EaseFactor,
}

impl CardState {
    pub fn new(starting_ease_factor: EaseFactor) -> Self {
        Self {
            starting_ease_factor,
            current_ease_factor: starting_ease_factor,
        }
    }
}
