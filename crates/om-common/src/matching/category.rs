use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};

/// Display bucket derived from the overall match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, AsRefStr, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchCategory {
    Poor,
    Weak,
    Moderate,
    Strong,
    Excellent,
}

/// Lower bounds (inclusive) of each bucket. Anything below `weak` is poor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryThresholds {
    pub excellent: u8,
    pub strong: u8,
    pub moderate: u8,
    pub weak: u8,
}

impl Default for CategoryThresholds {
    fn default() -> Self {
        Self {
            excellent: 80,
            strong: 65,
            moderate: 50,
            weak: 35,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("category thresholds must be strictly descending within 1..=100 (got {excellent}/{strong}/{moderate}/{weak})")]
pub struct InvalidThresholds {
    pub excellent: u8,
    pub strong: u8,
    pub moderate: u8,
    pub weak: u8,
}

impl CategoryThresholds {
    pub fn validate(&self) -> Result<(), InvalidThresholds> {
        let ordered = self.excellent <= 100
            && self.excellent > self.strong
            && self.strong > self.moderate
            && self.moderate > self.weak
            && self.weak >= 1;

        if ordered {
            Ok(())
        } else {
            Err(InvalidThresholds {
                excellent: self.excellent,
                strong: self.strong,
                moderate: self.moderate,
                weak: self.weak,
            })
        }
    }

    pub fn categorize(&self, score: u8) -> MatchCategory {
        if score >= self.excellent {
            MatchCategory::Excellent
        } else if score >= self.strong {
            MatchCategory::Strong
        } else if score >= self.moderate {
            MatchCategory::Moderate
        } else if score >= self.weak {
            MatchCategory::Weak
        } else {
            MatchCategory::Poor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_buckets() {
        let t = CategoryThresholds::default();
        assert_eq!(t.categorize(100), MatchCategory::Excellent);
        assert_eq!(t.categorize(80), MatchCategory::Excellent);
        assert_eq!(t.categorize(79), MatchCategory::Strong);
        assert_eq!(t.categorize(65), MatchCategory::Strong);
        assert_eq!(t.categorize(64), MatchCategory::Moderate);
        assert_eq!(t.categorize(50), MatchCategory::Moderate);
        assert_eq!(t.categorize(49), MatchCategory::Weak);
        assert_eq!(t.categorize(35), MatchCategory::Weak);
        assert_eq!(t.categorize(34), MatchCategory::Poor);
        assert_eq!(t.categorize(0), MatchCategory::Poor);
    }

    #[test]
    fn categorization_is_monotonic() {
        let t = CategoryThresholds::default();
        let categories: Vec<_> = (0..=100u8).map(|s| t.categorize(s)).collect();
        assert!(categories.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn rejects_unordered_thresholds() {
        let t = CategoryThresholds {
            excellent: 60,
            strong: 70,
            moderate: 50,
            weak: 35,
        };
        assert!(t.validate().is_err());
        assert!(CategoryThresholds::default().validate().is_ok());
    }

    #[test]
    fn category_labels_are_snake_case() {
        assert_eq!(MatchCategory::Excellent.as_ref(), "excellent");
        assert_eq!(
            serde_json::to_string(&MatchCategory::Moderate).unwrap(),
            "\"moderate\""
        );
    }
}
