//! Ease correction model
//!
//! Derived from the Ebbinghaus forgetting curve R = exp(-t/S): if a card is
//! recalled at rate `r` but the target is `T`, scaling the interval (and so
//! the ease) by ln(T)/ln(r) moves the expected recall rate to `T`.
//!
//! - average_ease = moving average of the factor history (or the starting ease)
//! - rate = smoothed success rate of the review history
//! - delta_ratio = ln(target) / ln(rate)
//! - suggested = average_ease · delta_ratio

use crate::config::EngineConfig;
use crate::error::{EaseError, EaseResult};
use crate::leash;
use crate::moving_average::moving_average;
use crate::success_rate::{clamp_success_rate, success_rate};
use crate::types::{CardState, EaseFactor, ReviewOutcome};

/// Whether the leash is applied to a suggestion.
///
/// `Unleashed` exists for diagnostics only; its value is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeashMode {
    #[default]
    Leashed,
    Unleashed,
}

/// Intermediate values of one correction step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EaseEstimate {
    /// Smoothed success rate, within [0.01, 0.99]
    pub success_rate: f64,
    /// Smoothed historical ease
    pub average_ease: f64,
    /// ln(target) / ln(success_rate)
    pub delta_ratio: f64,
    /// average_ease · delta_ratio, before the leash
    pub suggested: f64,
}

/// Correction ratio for an observed rate; the rate is clamped first
pub fn delta_ratio(target: f64, rate: f64) -> f64 {
    target.ln() / clamp_success_rate(rate).ln()
}

/// Compute the unleashed suggestion and the values it is built from.
pub fn estimate(
    config: &EngineConfig,
    starting_ease: EaseFactor,
    reviews: &[ReviewOutcome],
    factors: &[EaseFactor],
) -> EaseResult<EaseEstimate> {
    if let Some(pos) = factors.iter().position(|&f| f == 0) {
        return Err(EaseError::invalid(format!(
            "factor history must be positive (zero at index {pos})"
        )));
    }

    let average_ease = if factors.is_empty() {
        starting_ease as f64
    } else {
        let values: Vec<f64> = factors.iter().map(|&f| f as f64).collect();
        moving_average(&values, config.weight, None)?
    };

    let rate = clamp_success_rate(success_rate(reviews, config.weight, config.target_ratio)?);
    let ratio = delta_ratio(config.target_ratio, rate);

    Ok(EaseEstimate {
        success_rate: rate,
        average_ease,
        delta_ratio: ratio,
        suggested: average_ease * ratio,
    })
}

/// Next ease factor for a card.
///
/// `state.current_ease_factor` is the ease the leash measures steps from; it
/// is normally the last entry of `factors`.
pub fn suggest(
    config: &EngineConfig,
    state: &CardState,
    reviews: &[ReviewOutcome],
    factors: &[EaseFactor],
    mode: LeashMode,
) -> EaseResult<EaseFactor> {
    config.validate()?;
    if state.starting_ease_factor == 0 || state.current_ease_factor == 0 {
        return Err(EaseError::invalid("card ease factors must be positive"));
    }

    let estimate = estimate(config, state.starting_ease_factor, reviews, factors)?;

    Ok(match mode {
        LeashMode::Leashed => leash::clamp(
            estimate.suggested,
            state.current_ease_factor,
            state.starting_ease_factor,
            reviews.len(),
            config,
        ),
        LeashMode::Unleashed => leash::round_unleashed(estimate.suggested),
    })
}
