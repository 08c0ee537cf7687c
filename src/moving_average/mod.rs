//! Weighted Moving Average
//!
//! Exponential smoothing over an ordered sequence:
//! - acc_0 = init, or the arithmetic mean of the values when no init is given
//! - acc_i = acc_{i-1} * (1 - w) + x_i * w
//!
//! The update is applied once per element in sequence order, so the result
//! depends on ordering and is never computed in parallel.

use crate::config::validate_weight;
use crate::error::{EaseError, EaseResult};

/// Weighted moving average of `values`.
///
/// # Arguments
/// * `values` - Ordered, non-empty sequence
/// * `weight` - Smoothing weight in (0, 1]; 1 keeps only the last value
/// * `init` - Starting accumulator; defaults to the mean of `values`
///
/// # Errors
/// `InvalidInput` when `values` is empty or `weight` is outside (0, 1].
pub fn moving_average(values: &[f64], weight: f64, init: Option<f64>) -> EaseResult<f64> {
    if values.is_empty() {
        return Err(EaseError::invalid("moving average of an empty sequence"));
    }
    validate_weight(weight)?;

    let mut acc = init.unwrap_or_else(|| values.iter().sum::<f64>() / values.len() as f64);
    for &value in values {
        acc = acc * (1.0 - weight) + value * weight;
    }
    Ok(acc)
}
