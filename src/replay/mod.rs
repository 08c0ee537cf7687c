//! History replay
//!
//! Regenerates the ease factor a card would have had after every review under
//! the current configuration. Step `n` sees the first `n` outcomes and the
//! factors produced by steps `0..n`; the leading entry is the starting ease.
//!
//! A live review is the same computation restricted to its last step, see
//! [`step`].

use rayon::prelude::*;

use crate::config::EngineConfig;
use crate::correction::{suggest, LeashMode};
use crate::error::{EaseError, EaseResult};
use crate::types::{CardId, CardState, EaseFactor, ReviewOutcome};

/// One card's replay request
#[derive(Debug, Clone)]
pub struct ReplayInput {
    pub card_id: CardId,
    pub starting_ease: EaseFactor,
    pub reviews: Vec<ReviewOutcome>,
}

/// Single leashed update.
///
/// The leash measures from the last entry of `factors`, or from the
/// starting ease when there is no factor history yet.
pub fn step(
    config: &EngineConfig,
    starting_ease: EaseFactor,
    reviews: &[ReviewOutcome],
    factors: &[EaseFactor],
) -> EaseResult<EaseFactor> {
    step_with_mode(config, starting_ease, reviews, factors, LeashMode::Leashed)
}

pub(crate) fn step_with_mode(
    config: &EngineConfig,
    starting_ease: EaseFactor,
    reviews: &[ReviewOutcome],
    factors: &[EaseFactor],
    mode: LeashMode,
) -> EaseResult<EaseFactor> {
    let state = CardState {
        starting_ease_factor: starting_ease,
        current_ease_factor: factors.last().copied().unwrap_or(starting_ease),
    };
    suggest(config, &state, reviews, factors, mode)
}

/// Replay a card's whole history.
///
/// Returns `reviews.len() + 1` factors, the first being `starting_ease`.
/// Deterministic: the same inputs always give the same sequence.
pub fn replay(
    config: &EngineConfig,
    starting_ease: EaseFactor,
    reviews: &[ReviewOutcome],
) -> EaseResult<Vec<EaseFactor>> {
    config.validate()?;
    if starting_ease == 0 {
        return Err(EaseError::invalid("starting ease must be positive"));
    }

    let mut factors = Vec::with_capacity(reviews.len() + 1);
    factors.push(starting_ease);

    for count in 1..=reviews.len() {
        let next = step(config, starting_ease, &reviews[..count], &factors)?;
        factors.push(next);
    }

    Ok(factors)
}

/// Replay many independent cards in parallel.
///
/// Output order matches input order.
pub fn replay_many(
    config: &EngineConfig,
    inputs: &[ReplayInput],
) -> Vec<(CardId, EaseResult<Vec<EaseFactor>>)> {
    inputs
        .par_iter()
        .map(|input| {
            (
                input.card_id,
                replay(config, input.starting_ease, &input.reviews),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReviewOutcome::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    // ==================== Replay ====================

    #[test]
    fn test_empty_history_returns_starting_ease() {
        assert_eq!(replay(&config(), 2500, &[]).unwrap(), vec![2500]);
        assert_eq!(replay(&config(), 1800, &[]).unwrap(), vec![1800]);
    }

    #[test]
    fn test_mixed_history_sequence() {
        let factors = replay(&config(), 2500, &[Good, Good, Again, Good]).unwrap();
        assert_eq!(factors, vec![2500, 2574, 2654, 2370, 2161]);
    }

    #[test]
    fn test_two_failures_in_a_row() {
        assert_eq!(replay(&config(), 2500, &[Again]).unwrap(), vec![2500, 2280]);
        assert_eq!(
            replay(&config(), 2500, &[Again, Good]).unwrap(),
            vec![2500, 2280, 2106]
        );
    }

    #[test]
    fn test_all_failures_approach_min_ease() {
        let factors = replay(&config(), 2500, &[Again; 20]).unwrap();
        assert_eq!(factors.len(), 21);
        assert_eq!(
            &factors[1..6],
            &[2280, 2059, 1857, 1682, 1535]
        );
        assert_eq!(*factors.last().unwrap(), 1001);
        assert!(factors.iter().all(|&f| f >= 1000));
        assert!(factors.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_all_successes_approach_max_ease() {
        let factors = replay(&config(), 2500, &[Good; 20]).unwrap();
        assert_eq!(factors.len(), 21);
        assert_eq!(&factors[1..4], &[2574, 2654, 2739]);
        assert_eq!(*factors.last().unwrap(), 4306);
        assert!(factors.iter().all(|&f| f <= 5000));
        assert!(factors.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_easy_and_good_are_equivalent() {
        let good = replay(&config(), 2500, &[Good; 8]).unwrap();
        let mixed = replay(&config(), 2500, &[Easy, Good, Easy, Hard, Easy, Good, Hard, Easy]).unwrap();
        assert_eq!(good, mixed);
    }

    #[test]
    fn test_first_step_is_gentler_than_failure_run() {
        let mixed = replay(&config(), 2500, &[Good, Good, Again, Good]).unwrap();
        let failures = replay(&config(), 2500, &[Again; 4]).unwrap();
        let first = mixed[1].abs_diff(mixed[0]);
        assert!(failures.windows(2).all(|w| first < w[0].abs_diff(w[1])));
    }

    #[test]
    fn test_replay_is_deterministic() {
        let history = [Good, Again, Hard, Easy, Again, Again, Good];
        let a = replay(&config(), 2300, &history).unwrap();
        let b = replay(&config(), 2300, &history).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_replay_rejects_invalid_input() {
        assert!(replay(&config(), 0, &[Good]).is_err());
        let bad = EngineConfig { target_ratio: 1.2, ..config() };
        assert!(matches!(replay(&bad, 2500, &[]), Err(EaseError::InvalidInput(_))));
    }

    // ==================== Step ====================

    #[test]
    fn test_step_matches_last_replay_entry() {
        let history = [Good, Good, Again, Good];
        let factors = replay(&config(), 2500, &history).unwrap();
        let last = step(&config(), 2500, &history, &factors[..4]).unwrap();
        assert_eq!(last, factors[4]);
    }

    // ==================== Parallel ====================

    #[test]
    fn test_replay_many_preserves_order() {
        let inputs: Vec<ReplayInput> = (0..32)
            .map(|i| ReplayInput {
                card_id: i,
                starting_ease: 2500,
                reviews: if i % 2 == 0 { vec![Again; 3] } else { vec![Good; 3] },
            })
            .collect();
        let results = replay_many(&config(), &inputs);

        assert_eq!(results.len(), 32);
        for (i, (card_id, factors)) in results.iter().enumerate() {
            assert_eq!(*card_id, i as CardId);
            let expected = replay(&config(), 2500, &inputs[i].reviews).unwrap();
            assert_eq!(factors.as_ref().unwrap(), &expected);
        }
    }
}
