//! Leash - asymmetric rate limiter on ease adjustments
//!
//! A single outlier answer, especially early in a card's life, would otherwise
//! swing the ease factor by a large multiple. The leash bounds each update:
//!
//! - Above the starting ease:
//!   m = (max/cur)^(1/3) · (suggested/start)^(1/4) · (1 - cur/max) · (start/cur)
//!   ceiling = min(max, cur + leash · m · r)
//! - Below the starting ease:
//!   m = (cur/min - 1) · (start/suggested)^(1/3) · (cur/start)
//!   floor = max(min, cur - leash · m · r)
//!
//! with r = 1 + reviews/10, so long-tracked cards may drift further per step.
//! Steps shrink as the current ease approaches either hard bound.

use crate::config::EngineConfig;
use crate::types::EaseFactor;

/// Multiplier applied to the leash for a card with `review_count` reviews
pub fn review_number_multiplier(review_count: usize) -> f64 {
    1.0 + review_count as f64 / 10.0
}

/// Largest step the leash allows away from `current` toward `suggested`.
///
/// Zero when the suggestion equals the starting ease (no clamp applies).
pub fn allowed_step(
    suggested: f64,
    current: EaseFactor,
    starting: EaseFactor,
    review_count: usize,
    config: &EngineConfig,
) -> f64 {
    let cur = current as f64;
    let start = starting as f64;
    let max_ease = config.max_ease as f64;
    let min_ease = config.min_ease as f64;

    let multiplier = if suggested > start {
        // smaller steps above the starting ease than below it
        (max_ease / cur).powf(1.0 / 3.0)
            * (suggested / start).powf(1.0 / 4.0)
            * (1.0 - cur / max_ease)
            * (start / cur)
    } else if suggested < start {
        (cur / min_ease - 1.0) * (start / suggested).powf(1.0 / 3.0) * (cur / start)
    } else {
        return 0.0;
    };

    config.leash * multiplier * review_number_multiplier(review_count)
}

/// Bound `suggested` by the leash and round it to an ease factor.
///
/// The result always lies in `[config.min_ease, config.max_ease]`. A NaN
/// suggestion carries no direction, so the card stays at `current`.
pub fn clamp(
    suggested: f64,
    current: EaseFactor,
    starting: EaseFactor,
    review_count: usize,
    config: &EngineConfig,
) -> EaseFactor {
    if suggested.is_nan() {
        return current.clamp(config.min_ease, config.max_ease);
    }
    let start = starting as f64;
    let step = allowed_step(suggested, current, starting, review_count, config);
    let mut bounded = suggested;

    if suggested > start {
        let ceiling = (config.max_ease as f64).min(current as f64 + step);
        if bounded > ceiling {
            bounded = ceiling;
        }
    } else if suggested < start {
        let floor = (config.min_ease as f64).max(current as f64 - step);
        if bounded < floor {
            bounded = floor;
        }
    }

    let rounded = round_half_even(bounded).clamp(config.min_ease as f64, config.max_ease as f64);
    rounded as EaseFactor
}

/// Round to the nearest integer, ties to even (2500.5 -> 2500, 2501.5 -> 2502)
pub fn round_half_even(value: f64) -> f64 {
    value.round_ties_even()
}

/// Round an unbounded suggestion to an ease factor without applying the leash
pub fn round_unleashed(suggested: f64) -> EaseFactor {
    round_half_even(suggested).max(0.0) as EaseFactor
}
