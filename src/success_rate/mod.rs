//! Smoothed recall success rate.
//!
//! Outcomes are mapped to 1 (success) or 0 ("again") and smoothed with the
//! weighted moving average seeded at the target ratio, so a short history
//! starts from "on target" instead of from its own mean.

use crate::error::EaseResult;
use crate::moving_average::moving_average;
use crate::types::{ReviewOutcome, MAX_SUCCESS_RATE, MIN_SUCCESS_RATE};

/// Smoothed success rate of `outcomes`.
///
/// Returns `target` unchanged for an empty history. Otherwise the result is
/// clamped into [0.01, 0.99].
pub fn success_rate(outcomes: &[ReviewOutcome], weight: f64, target: f64) -> EaseResult<f64> {
    if outcomes.is_empty() {
        return Ok(target);
    }

    let mapped: Vec<f64> = outcomes
        .iter()
        .map(|o| if o.is_success() { 1.0 } else { 0.0 })
        .collect();

    let rate = moving_average(&mapped, weight, Some(target))?;
    Ok(clamp_success_rate(rate))
}

/// Keep a rate away from the asymptotes of ln(rate)
pub fn clamp_success_rate(rate: f64) -> f64 {
    rate.clamp(MIN_SUCCESS_RATE, MAX_SUCCESS_RATE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReviewOutcome::*;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_empty_history_is_on_target() {
        assert_eq!(success_rate(&[], 0.2, 0.85).unwrap(), 0.85);
        assert_eq!(success_rate(&[], 0.9, 0.42).unwrap(), 0.42);
    }

    #[test]
    fn test_mixed_history() {
        let rate = success_rate(&[Again, Good, Easy], 0.2, 0.85).unwrap();
        assert!((rate - 0.7952).abs() < EPSILON);
    }

    #[test]
    fn test_hard_counts_as_success() {
        let hard = success_rate(&[Hard, Hard], 0.2, 0.85).unwrap();
        let good = success_rate(&[Good, Easy], 0.2, 0.85).unwrap();
        assert!((hard - good).abs() < EPSILON);
    }

    #[test]
    fn test_clamped_at_upper_bound() {
        let rate = success_rate(&[Good], 1.0, 0.85).unwrap();
        assert_eq!(rate, MAX_SUCCESS_RATE);
    }

    #[test]
    fn test_clamped_at_lower_bound() {
        let rate = success_rate(&[Again], 1.0, 0.85).unwrap();
        assert_eq!(rate, MIN_SUCCESS_RATE);
    }

    #[test]
    fn test_invalid_weight_fails_loudly() {
        assert!(success_rate(&[Good], 0.0, 0.85).is_err());
    }
}
