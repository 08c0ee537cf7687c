use thiserror::Error;

use crate::types::CardId;

/// Errors surfaced by the ease controller.
///
/// Numeric faults (a success rate of exactly 0 or 1) never show up here: the
/// rate is clamped before it reaches the logarithm.
#[derive(Debug, Error)]
pub enum EaseError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("persistence failed for card {card_id}: {reason}")]
    Persistence { card_id: CardId, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EaseError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn persistence(card_id: CardId, reason: impl Into<String>) -> Self {
        Self::Persistence {
            card_id,
            reason: reason.into(),
        }
    }
}

pub type EaseResult<T> = Result<T, EaseError>;
