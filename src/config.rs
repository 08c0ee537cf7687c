use serde::{Deserialize, Serialize};

use crate::error::{EaseError, EaseResult};
use crate::types::{
    EaseFactor, DEFAULT_LEASH, DEFAULT_MAX_EASE, DEFAULT_MIN_EASE, DEFAULT_STARTING_EASE,
    DEFAULT_TARGET_RATIO, DEFAULT_WEIGHT,
};

/// Controller configuration, fixed for the duration of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Long-run success rate the controller tracks, in (0, 1)
    #[serde(alias = "target")]
    pub target_ratio: f64,
    /// Moving average smoothing weight, in (0, 1]
    #[serde(alias = "moving_average_weight")]
    pub weight: f64,
    /// Base magnitude of a single adjustment
    pub leash: f64,
    pub min_ease: EaseFactor,
    pub max_ease: EaseFactor,
    /// Only count review-queue answers (learning and relearning steps are ignored)
    pub reviews_only: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_ratio: DEFAULT_TARGET_RATIO,
            weight: DEFAULT_WEIGHT,
            leash: DEFAULT_LEASH,
            min_ease: DEFAULT_MIN_EASE,
            max_ease: DEFAULT_MAX_EASE,
            reviews_only: false,
        }
    }
}

impl EngineConfig {
    /// Load from `AUTO_EASE_*` environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parse_f64 = |key: &str, fallback: f64| {
            lookup(key)
                .and_then(|value| value.trim().parse::<f64>().ok())
                .unwrap_or(fallback)
        };
        let parse_ease = |key: &str, fallback: EaseFactor| {
            lookup(key)
                .and_then(|value| value.trim().parse::<EaseFactor>().ok())
                .unwrap_or(fallback)
        };

        Self {
            target_ratio: parse_f64("AUTO_EASE_TARGET_RATIO", defaults.target_ratio),
            weight: parse_f64("AUTO_EASE_WEIGHT", defaults.weight),
            leash: parse_f64("AUTO_EASE_LEASH", defaults.leash),
            min_ease: parse_ease("AUTO_EASE_MIN_EASE", defaults.min_ease),
            max_ease: parse_ease("AUTO_EASE_MAX_EASE", defaults.max_ease),
            reviews_only: lookup("AUTO_EASE_REVIEWS_ONLY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.reviews_only),
        }
    }

    pub fn validate(&self) -> EaseResult<()> {
        if !(self.target_ratio > 0.0 && self.target_ratio < 1.0) {
            return Err(EaseError::invalid(format!(
                "target_ratio must be in (0, 1), got {}",
                self.target_ratio
            )));
        }
        validate_weight(self.weight)?;
        if !self.leash.is_finite() || self.leash < 0.0 {
            return Err(EaseError::invalid(format!(
                "leash must be a finite value >= 0, got {}",
                self.leash
            )));
        }
        if self.min_ease == 0 {
            return Err(EaseError::invalid("min_ease must be positive"));
        }
        if self.min_ease >= self.max_ease {
            return Err(EaseError::invalid(format!(
                "min_ease ({}) must be below max_ease ({})",
                self.min_ease, self.max_ease
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_weight(weight: f64) -> EaseResult<()> {
    if weight > 0.0 && weight <= 1.0 {
        Ok(())
    } else {
        Err(EaseError::invalid(format!(
            "weight must be in (0, 1], got {weight}"
        )))
    }
}

/// Per-deck scheduling options read from the host.
///
/// Only `initial_factor` feeds the controller; the other fields are
/// informational and shown in card stats. Each field falls back to its own
/// default when the deck does not set it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckOptions {
    #[serde(default = "default_initial_factor")]
    pub initial_factor: EaseFactor,
    #[serde(default = "default_easy_bonus")]
    pub easy_bonus: f64,
    #[serde(default = "default_hard_factor")]
    pub hard_factor: f64,
    #[serde(default = "default_max_interval_days")]
    pub max_interval_days: u32,
    #[serde(default)]
    pub lapse_multiplier: f64,
}

fn default_initial_factor() -> EaseFactor {
    DEFAULT_STARTING_EASE
}

fn default_easy_bonus() -> f64 {
    1.3
}

fn default_hard_factor() -> f64 {
    1.2
}

fn default_max_interval_days() -> u32 {
    3650
}

impl Default for DeckOptions {
    fn default() -> Self {
        Self {
            initial_factor: default_initial_factor(),
            easy_bonus: default_easy_bonus(),
            hard_factor: default_hard_factor(),
            max_interval_days: default_max_interval_days(),
            lapse_multiplier: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.target_ratio, 0.85);
        assert_eq!(config.weight, 0.2);
        assert_eq!(config.leash, 100.0);
        assert_eq!(config.min_ease, 1000);
        assert_eq!(config.max_ease, 5000);
        assert!(!config.reviews_only);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            EngineConfig { target_ratio: 1.0, ..Default::default() },
            EngineConfig { target_ratio: 0.0, ..Default::default() },
            EngineConfig { weight: 0.0, ..Default::default() },
            EngineConfig { weight: 1.5, ..Default::default() },
            EngineConfig { leash: -1.0, ..Default::default() },
            EngineConfig { leash: f64::NAN, ..Default::default() },
            EngineConfig { min_ease: 0, ..Default::default() },
            EngineConfig { min_ease: 5000, max_ease: 5000, ..Default::default() },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(EaseError::InvalidInput(_))),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_weight_of_one_is_valid() {
        let config = EngineConfig { weight: 1.0, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"target_ratio": 0.9, "moving_average_weight": 0.3}"#)
                .unwrap();
        assert_eq!(config.target_ratio, 0.9);
        assert_eq!(config.weight, 0.3);
        assert_eq!(config.max_ease, 5000);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("AUTO_EASE_TARGET_RATIO", "0.9"),
            ("AUTO_EASE_LEASH", "not-a-number"),
            ("AUTO_EASE_MAX_EASE", "4000"),
            ("AUTO_EASE_REVIEWS_ONLY", "1"),
        ]
        .into_iter()
        .collect();
        let config = EngineConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.target_ratio, 0.9);
        assert_eq!(config.leash, 100.0);
        assert_eq!(config.max_ease, 4000);
        assert_eq!(config.weight, 0.2);
        assert!(config.reviews_only);
    }

    #[test]
    fn test_deck_options_fields_default_independently() {
        // a deck with a lapse multiplier but no max interval keeps the default interval
        let options: DeckOptions = serde_json::from_str(r#"{"lapse_multiplier": 0.5}"#).unwrap();
        assert_eq!(options.lapse_multiplier, 0.5);
        assert_eq!(options.max_interval_days, 3650);
        assert_eq!(options.initial_factor, 2500);

        let options: DeckOptions = serde_json::from_str(r#"{"max_interval_days": 100}"#).unwrap();
        assert_eq!(options.lapse_multiplier, 0.0);
        assert_eq!(options.max_interval_days, 100);
        assert_eq!(options.easy_bonus, 1.3);
        assert_eq!(options.hard_factor, 1.2);
    }
}
