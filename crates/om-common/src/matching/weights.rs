use serde::{Deserialize, Serialize};

use super::MatchFactor;

/// Default factor weights. The score threshold dominates; education and
/// experience are tie-breakers.
pub const DEFAULT_WEIGHTS: MatchWeights = MatchWeights {
    score: 0.40,
    criteria: 0.20,
    skills: 0.25,
    education: 0.075,
    experience: 0.075,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    pub score: f64,
    pub criteria: f64,
    pub skills: f64,
    pub education: f64,
    pub experience: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl MatchWeights {
    pub fn sum(&self) -> f64 {
        self.score + self.criteria + self.skills + self.education + self.experience
    }

    pub fn get(&self, factor: MatchFactor) -> f64 {
        match factor {
            MatchFactor::Score => self.score,
            MatchFactor::Criteria => self.criteria,
            MatchFactor::Skills => self.skills,
            MatchFactor::Education => self.education,
            MatchFactor::Experience => self.experience,
        }
    }

    /// Rescale so the weights sum to 1.0. Negative or non-finite weights count
    /// as zero; if nothing positive remains the defaults are used.
    pub fn normalized(&self) -> Self {
        let clean = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let cleaned = Self {
            score: clean(self.score),
            criteria: clean(self.criteria),
            skills: clean(self.skills),
            education: clean(self.education),
            experience: clean(self.experience),
        };

        let total = cleaned.sum();
        if total <= f64::EPSILON {
            return DEFAULT_WEIGHTS;
        }

        Self {
            score: cleaned.score / total,
            criteria: cleaned.criteria / total,
            skills: cleaned.skills / total,
            education: cleaned.education / total,
            experience: cleaned.experience / total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        assert!((DEFAULT_WEIGHTS.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn default_weights_keep_score_dominant() {
        let w = DEFAULT_WEIGHTS;
        assert!(w.score > w.skills && w.score > w.criteria);
        assert!(w.skills >= w.education && w.criteria >= w.experience);
    }

    #[test]
    fn normalizes_arbitrary_weights() {
        let weights = MatchWeights {
            score: 4.0,
            criteria: 2.0,
            skills: 2.0,
            education: 1.0,
            experience: 1.0,
        }
        .normalized();

        assert!((weights.sum() - 1.0).abs() < 1e-9);
        assert!((weights.score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn degenerate_weights_fall_back_to_defaults() {
        let weights = MatchWeights {
            score: 0.0,
            criteria: -1.0,
            skills: f64::NAN,
            education: 0.0,
            experience: 0.0,
        };
        assert_eq!(weights.normalized(), DEFAULT_WEIGHTS);
    }
}
