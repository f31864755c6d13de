use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::{
    FactorStatus, MatchFactor,
    category::{CategoryThresholds, MatchCategory},
    config::MatchingConfig,
    profile::{JobMatchProfile, Requirement, TalentMatchProfile},
    skills::skill_coverage,
    summary::summarize,
};
use crate::criteria::O1Criterion;

static DEFAULT_ENGINE: LazyLock<MatchEngine> =
    LazyLock::new(|| MatchEngine::new(MatchingConfig::default()));

const FULL_MARKS: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    /// Factor score in 0..=100.
    pub score: f64,
    /// Normalized weight of the factor.
    pub weight: f64,
    /// `score * weight`, the factor's contribution to the overall score.
    pub weighted: f64,
    pub status: FactorStatus,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub overall_score: u8,
    pub category: MatchCategory,
    pub summary: String,
    pub breakdown: BTreeMap<MatchFactor, FactorScore>,
    /// Preferred criteria the talent meets.
    pub matched_criteria: Vec<O1Criterion>,
    /// Required and preferred skills the talent has.
    pub matched_skills: Vec<String>,
    pub missing_required_skills: Vec<String>,
}

impl MatchResult {
    pub fn factor(&self, factor: MatchFactor) -> Option<&FactorScore> {
        self.breakdown.get(&factor)
    }
}

/// Score a talent against a job with the default configuration.
pub fn calculate_match_score(talent: &TalentMatchProfile, job: &JobMatchProfile) -> MatchResult {
    DEFAULT_ENGINE.calculate_match_score(talent, job)
}

pub(crate) fn default_engine() -> &'static MatchEngine {
    &DEFAULT_ENGINE
}

/// Stateless scorer. Holds only its configuration, so one instance can be
/// shared freely across threads.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    config: MatchingConfig,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}

impl MatchEngine {
    pub fn new(mut config: MatchingConfig) -> Self {
        let w = config.weights;
        let all_valid = [w.score, w.criteria, w.skills, w.education, w.experience]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0);
        if !all_valid || (w.sum() - 1.0).abs() > 1e-6 {
            config.weights = w.normalized();
        }
        if let Err(err) = config.thresholds.validate() {
            warn!(error = %err, "falling back to default category thresholds");
            config.thresholds = CategoryThresholds::default();
        }
        config.threshold_met_floor = config.threshold_met_floor.clamp(0.0, FULL_MARKS);
        config.threshold_bonus_per_point = config.threshold_bonus_per_point.max(0.0);
        config.threshold_shortfall_penalty_per_point =
            config.threshold_shortfall_penalty_per_point.max(0.0);
        config.required_skill_share = config.required_skill_share.clamp(0.0, 1.0);
        config.education_penalty_per_level = config.education_penalty_per_level.max(0.0);
        Self { config }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn calculate_match_score(
        &self,
        talent: &TalentMatchProfile,
        job: &JobMatchProfile,
    ) -> MatchResult {
        let weights = self.config.weights;

        let (criteria, matched_criteria) = self.score_criteria(talent, job);
        let (skills, matched_skills, missing_required_skills) = self.score_skills(talent, job);

        let factors = [
            (MatchFactor::Score, self.score_threshold(talent, job)),
            (MatchFactor::Criteria, criteria),
            (MatchFactor::Skills, skills),
            (MatchFactor::Education, self.score_education(talent, job)),
            (MatchFactor::Experience, self.score_experience(talent, job)),
        ];

        let breakdown: BTreeMap<MatchFactor, FactorScore> = factors
            .into_iter()
            .map(|(factor, (score, status, details))| {
                let score = score.clamp(0.0, FULL_MARKS);
                let weight = weights.get(factor);
                (
                    factor,
                    FactorScore {
                        score,
                        weight,
                        weighted: score * weight,
                        status,
                        details,
                    },
                )
            })
            .collect();

        let total: f64 = breakdown.values().map(|f| f.weighted).sum();
        let overall_score = if total.is_finite() {
            total.clamp(0.0, FULL_MARKS).round() as u8
        } else {
            0
        };
        let category = self.config.thresholds.categorize(overall_score);
        let summary = summarize(&breakdown, &self.config, talent, job);

        trace!(
            talent_id = %talent.id,
            job_id = %job.id,
            overall_score,
            category = category.as_ref(),
            "scored match"
        );

        MatchResult {
            overall_score,
            category,
            summary,
            breakdown,
            matched_criteria,
            matched_skills,
            missing_required_skills,
        }
    }

    fn score_threshold(
        &self,
        talent: &TalentMatchProfile,
        job: &JobMatchProfile,
    ) -> (f64, FactorStatus, String) {
        let Requirement::AtLeast(min) = job.min_score else {
            return (
                FULL_MARKS,
                FactorStatus::NotRequired,
                "no minimum O-1 score".into(),
            );
        };

        let actual = talent.o1_score;
        let floor = self.config.threshold_met_floor;

        if actual >= min {
            let margin = f64::from(actual - min);
            let score = (floor + margin * self.config.threshold_bonus_per_point).min(FULL_MARKS);
            (
                score,
                FactorStatus::Met,
                format!("O-1 score {actual} meets minimum {min} (+{})", actual - min),
            )
        } else {
            let shortfall = f64::from(min - actual);
            let score =
                (floor - shortfall * self.config.threshold_shortfall_penalty_per_point).max(0.0);
            let status = if score > 0.0 {
                FactorStatus::Partial
            } else {
                FactorStatus::Missed
            };
            (
                score,
                status,
                format!("O-1 score {actual} is {} below minimum {min}", min - actual),
            )
        }
    }

    fn score_criteria(
        &self,
        talent: &TalentMatchProfile,
        job: &JobMatchProfile,
    ) -> ((f64, FactorStatus, String), Vec<O1Criterion>) {
        if job.preferred_criteria.is_empty() {
            return (
                (
                    FULL_MARKS,
                    FactorStatus::NotRequired,
                    "no preferred O-1 criteria".into(),
                ),
                vec![],
            );
        }

        let matched: Vec<O1Criterion> = job
            .preferred_criteria
            .intersection(&talent.criteria_met)
            .copied()
            .collect();
        let wanted = job.preferred_criteria.len();
        let fraction = matched.len() as f64 / wanted as f64;

        let status = status_for_fraction(fraction);
        let details = format!("{}/{} preferred O-1 criteria met", matched.len(), wanted);

        ((fraction * FULL_MARKS, status, details), matched)
    }

    fn score_skills(
        &self,
        talent: &TalentMatchProfile,
        job: &JobMatchProfile,
    ) -> ((f64, FactorStatus, String), Vec<String>, Vec<String>) {
        let required = skill_coverage(&job.required_skills, &talent.skills);
        let preferred = skill_coverage(&job.preferred_skills, &talent.skills);

        if required.unspecified && preferred.unspecified {
            return (
                (
                    FULL_MARKS,
                    FactorStatus::NotRequired,
                    "no skill requirements".into(),
                ),
                vec![],
                vec![],
            );
        }

        let share = self.config.required_skill_share;
        let fraction = share * required.coverage + (1.0 - share) * preferred.coverage;

        let details = format!(
            "required {}/{} / preferred {}/{}",
            required.matched.len(),
            job.required_skills.len(),
            preferred.matched.len(),
            job.preferred_skills.len()
        );

        let mut matched = required.matched;
        matched.extend(preferred.matched);
        matched.sort();
        matched.dedup();

        (
            (fraction * FULL_MARKS, status_for_fraction(fraction), details),
            matched,
            required.missing,
        )
    }

    fn score_education(
        &self,
        talent: &TalentMatchProfile,
        job: &JobMatchProfile,
    ) -> (f64, FactorStatus, String) {
        let Requirement::AtLeast(required) = job.required_education else {
            return (
                FULL_MARKS,
                FactorStatus::NotRequired,
                "no education requirement".into(),
            );
        };

        let actual = talent.education_level;
        let gap = required.rank().saturating_sub(actual.rank());
        if gap == 0 {
            return (
                FULL_MARKS,
                FactorStatus::Met,
                format!("{} meets required {}", actual.as_ref(), required.as_ref()),
            );
        }

        let score =
            (FULL_MARKS - f64::from(gap) * self.config.education_penalty_per_level).max(0.0);
        let status = if score > 0.0 {
            FactorStatus::Partial
        } else {
            FactorStatus::Missed
        };
        (
            score,
            status,
            format!(
                "{} is {gap} level(s) below required {}",
                actual.as_ref(),
                required.as_ref()
            ),
        )
    }

    fn score_experience(
        &self,
        talent: &TalentMatchProfile,
        job: &JobMatchProfile,
    ) -> (f64, FactorStatus, String) {
        let Requirement::AtLeast(min_years) = job.min_experience else {
            return (
                FULL_MARKS,
                FactorStatus::NotRequired,
                "no experience requirement".into(),
            );
        };

        let actual = talent.years_experience;
        if actual >= min_years {
            return (
                FULL_MARKS,
                FactorStatus::Met,
                format!("{actual} years meets required {min_years}"),
            );
        }

        // min_years > actual >= 0 here, so the division is safe.
        let fraction = f64::from(actual) / f64::from(min_years);
        (
            fraction * FULL_MARKS,
            status_for_fraction(fraction),
            format!("{actual} years of {min_years} required"),
        )
    }
}

fn status_for_fraction(fraction: f64) -> FactorStatus {
    if fraction >= 1.0 - f64::EPSILON {
        FactorStatus::Met
    } else if fraction > 0.0 {
        FactorStatus::Partial
    } else {
        FactorStatus::Missed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::EducationLevel;

    fn reference_job() -> JobMatchProfile {
        JobMatchProfile::new("job-1")
            .with_min_score(65)
            .with_preferred_criteria([O1Criterion::CriticalEmployment])
            .with_required_skills(["python"])
            .with_preferred_skills(["machine learning", "aws"])
            .with_required_education(EducationLevel::Bachelors)
            .with_min_experience(3)
    }

    fn reference_talent() -> TalentMatchProfile {
        TalentMatchProfile::new("talent-1")
            .with_score(70)
            .with_criteria([
                O1Criterion::CriticalEmployment,
                O1Criterion::OriginalContribution,
            ])
            .with_skills(["python", "machine learning"])
            .with_education(EducationLevel::Masters)
            .with_experience(6)
    }

    #[test]
    fn unordered_thresholds_fall_back_to_defaults() {
        let engine = MatchEngine::new(MatchingConfig {
            thresholds: CategoryThresholds {
                excellent: 50,
                strong: 70,
                moderate: 60,
                weak: 90,
            },
            ..MatchingConfig::default()
        });
        assert_eq!(engine.config().thresholds, CategoryThresholds::default());

        let result = engine.calculate_match_score(&reference_talent(), &reference_job());
        assert_eq!(result.category, MatchCategory::Excellent);
    }

    fn factor(result: &MatchResult, factor: MatchFactor) -> &FactorScore {
        result.factor(factor).expect("all factors are present")
    }

    #[test]
    fn reference_scenario_scores_excellent() {
        let result = calculate_match_score(&reference_talent(), &reference_job());

        assert_eq!(factor(&result, MatchFactor::Score).score, 100.0);
        assert_eq!(factor(&result, MatchFactor::Criteria).score, 100.0);
        assert_eq!(factor(&result, MatchFactor::Skills).score, 87.5);
        assert_eq!(factor(&result, MatchFactor::Education).score, 100.0);
        assert_eq!(factor(&result, MatchFactor::Experience).score, 100.0);
        assert_eq!(result.overall_score, 97);
        assert_eq!(result.category, MatchCategory::Excellent);
        assert_eq!(result.matched_criteria, vec![O1Criterion::CriticalEmployment]);
        assert_eq!(result.matched_skills, vec!["machine learning", "python"]);
        assert!(result.missing_required_skills.is_empty());
    }

    #[test]
    fn shortfall_scenario_scores_poor() {
        let talent = TalentMatchProfile::new("talent-2")
            .with_score(40)
            .with_education(EducationLevel::None)
            .with_experience(0);

        let result = calculate_match_score(&talent, &reference_job());

        assert_eq!(result.overall_score, 0);
        assert_eq!(result.category, MatchCategory::Poor);
        assert_eq!(factor(&result, MatchFactor::Score).status, FactorStatus::Missed);
        assert_eq!(result.missing_required_skills, vec!["python"]);
    }

    #[test]
    fn threshold_factor_is_continuous_at_the_minimum() {
        let engine = MatchEngine::default();
        let job = JobMatchProfile::new("j").with_min_score(60);

        let at = engine.score_threshold(&TalentMatchProfile::new("t").with_score(60), &job);
        let below = engine.score_threshold(&TalentMatchProfile::new("t").with_score(59), &job);
        let above = engine.score_threshold(&TalentMatchProfile::new("t").with_score(61), &job);

        assert_eq!(at.0, 80.0);
        assert_eq!(below.0, 76.0);
        assert_eq!(above.0, 84.0);
        assert_eq!(at.1, FactorStatus::Met);
        assert_eq!(below.1, FactorStatus::Partial);
    }

    #[test]
    fn threshold_bonus_is_capped() {
        let engine = MatchEngine::default();
        let job = JobMatchProfile::new("j").with_min_score(10);
        let (score, _, _) = engine.score_threshold(&TalentMatchProfile::new("t").with_score(99), &job);
        assert_eq!(score, 100.0);
    }

    #[test]
    fn education_gap_degrades_per_level() {
        let engine = MatchEngine::default();
        let job = JobMatchProfile::new("j").with_required_education(EducationLevel::Doctorate);

        let masters = TalentMatchProfile::new("t").with_education(EducationLevel::Masters);
        let bachelors = TalentMatchProfile::new("t").with_education(EducationLevel::Bachelors);
        let none = TalentMatchProfile::new("t");

        assert_eq!(engine.score_education(&masters, &job).0, 60.0);
        assert_eq!(engine.score_education(&bachelors, &job).0, 20.0);
        assert_eq!(engine.score_education(&none, &job).0, 0.0);
    }

    #[test]
    fn experience_shortfall_is_proportional() {
        let engine = MatchEngine::default();
        let job = JobMatchProfile::new("j").with_min_experience(8);
        let talent = TalentMatchProfile::new("t").with_experience(2);

        let (score, status, details) = engine.score_experience(&talent, &job);
        assert_eq!(score, 25.0);
        assert_eq!(status, FactorStatus::Partial);
        assert!(details.contains("2 years of 8"));
    }

    #[test]
    fn zero_minimum_experience_is_always_met() {
        let engine = MatchEngine::default();
        let job = JobMatchProfile::new("j").with_min_experience(0);
        let (score, status, _) = engine.score_experience(&TalentMatchProfile::new("t"), &job);
        assert_eq!(score, 100.0);
        assert_eq!(status, FactorStatus::Met);
    }

    #[test]
    fn preferred_only_skills_keep_required_share_neutral() {
        let engine = MatchEngine::default();
        let job = JobMatchProfile::new("j").with_preferred_skills(["aws", "gcp"]);
        let talent = TalentMatchProfile::new("t").with_skills(["AWS"]);

        let ((score, status, _), matched, missing) = engine.score_skills(&talent, &job);
        assert_eq!(score, 87.5);
        assert_eq!(status, FactorStatus::Partial);
        assert_eq!(matched, vec!["aws"]);
        assert!(missing.is_empty());
    }

    #[test]
    fn skill_matching_is_case_insensitive_both_ways() {
        let job = JobMatchProfile::new("j").with_required_skills(["PyTorch", "ML"]);
        let talent = TalentMatchProfile::new("t").with_skills(["pytorch", "Machine Learning"]);

        let result = calculate_match_score(&talent, &job);
        assert_eq!(factor(&result, MatchFactor::Skills).score, 100.0);
    }

    #[test]
    fn custom_weights_shift_the_total() {
        let mut config = MatchingConfig::default();
        config.weights.score = 1.0;
        config.weights.criteria = 0.0;
        config.weights.skills = 0.0;
        config.weights.education = 0.0;
        config.weights.experience = 0.0;
        let engine = MatchEngine::new(config);

        let job = JobMatchProfile::new("j")
            .with_min_score(50)
            .with_required_skills(["rust"]);
        let talent = TalentMatchProfile::new("t").with_score(50);

        let result = engine.calculate_match_score(&talent, &job);
        assert_eq!(result.overall_score, 80);
        assert_eq!(factor(&result, MatchFactor::Skills).weight, 0.0);
    }

    #[test]
    fn unnormalized_weights_are_rescaled_by_the_engine() {
        let mut config = MatchingConfig::default();
        config.weights.score *= 10.0;
        config.weights.criteria *= 10.0;
        config.weights.skills *= 10.0;
        config.weights.education *= 10.0;
        config.weights.experience *= 10.0;
        let engine = MatchEngine::new(config);

        assert!((engine.config().weights.sum() - 1.0).abs() < 1e-9);
        let result = engine.calculate_match_score(&reference_talent(), &reference_job());
        assert_eq!(result.overall_score, 97);
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MatchEngine>();
        assert_send_sync::<MatchResult>();
    }
}
