use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::category::CategoryThresholds;
use super::weights::{DEFAULT_WEIGHTS, MatchWeights};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub weights: MatchWeights,
    pub thresholds: CategoryThresholds,
    /// Score-threshold factor when the talent exactly meets the job minimum.
    pub threshold_met_floor: f64,
    /// Points added per O-1 score point above the job minimum (capped at 100).
    pub threshold_bonus_per_point: f64,
    /// Points removed per O-1 score point below the job minimum (floored at 0).
    pub threshold_shortfall_penalty_per_point: f64,
    /// Share of the skills factor carried by required skills; preferred skills
    /// carry the remainder.
    pub required_skill_share: f64,
    /// Points removed per education level below the requirement.
    pub education_penalty_per_level: f64,
    /// Factor score at or above which a factor is named as a strength.
    pub strength_threshold: f64,
    /// Factor score below which the weakest factor is named as a gap.
    pub deficiency_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            thresholds: CategoryThresholds::default(),
            threshold_met_floor: 80.0,
            threshold_bonus_per_point: 4.0,
            threshold_shortfall_penalty_per_point: 4.0,
            required_skill_share: 0.75,
            education_penalty_per_level: 40.0,
            strength_threshold: 80.0,
            deficiency_threshold: 50.0,
        }
    }
}

impl MatchingConfig {
    /// Defaults overridden by `OM_*` environment variables. Malformed values are
    /// logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let read = |name: &str, target: &mut f64| {
            if let Some(value) = parse_var::<f64>(&lookup, name).filter(|v| v.is_finite()) {
                *target = value;
            }
        };

        read("OM_WEIGHT_SCORE", &mut config.weights.score);
        read("OM_WEIGHT_CRITERIA", &mut config.weights.criteria);
        read("OM_WEIGHT_SKILLS", &mut config.weights.skills);
        read("OM_WEIGHT_EDUCATION", &mut config.weights.education);
        read("OM_WEIGHT_EXPERIENCE", &mut config.weights.experience);
        read("OM_DEFICIENCY_THRESHOLD", &mut config.deficiency_threshold);

        let mut thresholds = config.thresholds;
        let read_cut = |name: &str, target: &mut u8| {
            if let Some(value) = parse_var::<u8>(&lookup, name) {
                *target = value;
            }
        };
        read_cut("OM_CATEGORY_EXCELLENT", &mut thresholds.excellent);
        read_cut("OM_CATEGORY_STRONG", &mut thresholds.strong);
        read_cut("OM_CATEGORY_MODERATE", &mut thresholds.moderate);
        read_cut("OM_CATEGORY_WEAK", &mut thresholds.weak);

        match thresholds.validate() {
            Ok(()) => config.thresholds = thresholds,
            Err(err) => warn!(error = %err, "ignoring category threshold overrides"),
        }

        let sum = config.weights.sum();
        if (sum - 1.0).abs() > 1e-6 {
            warn!(sum, "match weights do not sum to 1.0; rescaling");
            config.weights = config.weights.normalized();
        }
        config
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "ignoring malformed match config value");
            None
        }
    }
}
