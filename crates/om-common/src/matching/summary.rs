use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::{
    FactorStatus, MatchFactor,
    config::MatchingConfig,
    profile::{JobMatchProfile, TalentMatchProfile},
    scoring::FactorScore,
    skills::skill_coverage,
};

const MAX_STRENGTHS: usize = 2;
const MAX_LISTED_SKILLS: usize = 3;

/// One-line explanation: up to two strengths, then the weakest factor when it
/// falls below the deficiency threshold.
pub(crate) fn summarize(
    breakdown: &BTreeMap<MatchFactor, FactorScore>,
    config: &MatchingConfig,
    talent: &TalentMatchProfile,
    job: &JobMatchProfile,
) -> String {
    let mut strengths: Vec<(&MatchFactor, &FactorScore)> = breakdown
        .iter()
        .filter(|(_, f)| f.status != FactorStatus::NotRequired)
        .filter(|(_, f)| f.score >= config.strength_threshold && f.weight > 0.0)
        .filter(|(factor, f)| !claims_requirement_met(**factor) || f.status == FactorStatus::Met)
        .collect();
    strengths.sort_by(|(fa, a), (fb, b)| {
        b.weighted
            .partial_cmp(&a.weighted)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal))
            .then_with(|| fa.cmp(fb))
    });

    let strength_phrases: Vec<String> = strengths
        .iter()
        .take(MAX_STRENGTHS)
        .map(|(factor, score)| strength_phrase(**factor, score))
        .collect();

    let gap = weakest_factor(breakdown)
        .filter(|(_, f)| f.score < config.deficiency_threshold)
        .map(|(factor, _)| gap_phrase(factor, talent, job));

    let all_neutral = breakdown
        .values()
        .all(|f| f.status == FactorStatus::NotRequired);

    let mut summary = if !strength_phrases.is_empty() {
        strength_phrases.join("; ")
    } else if all_neutral {
        "No specific requirements to match against".to_string()
    } else if gap.is_some() {
        "Limited overall fit".to_string()
    } else {
        "Partial fit across requirements".to_string()
    };

    if let Some(gap) = gap {
        summary.push_str("; gap: ");
        summary.push_str(&gap);
    }

    capitalize(&summary)
}

/// Lowest-scoring factor with a stated requirement. Ties go to the heavier
/// weight, then to factor order.
fn weakest_factor(
    breakdown: &BTreeMap<MatchFactor, FactorScore>,
) -> Option<(MatchFactor, &FactorScore)> {
    breakdown
        .iter()
        .filter(|(_, f)| f.status != FactorStatus::NotRequired && f.weight > 0.0)
        .min_by(|(fa, a), (fb, b)| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal))
                .then_with(|| fa.cmp(fb))
        })
        .map(|(factor, score)| (*factor, score))
}

/// Factors whose strength phrase states that the job minimum was reached.
fn claims_requirement_met(factor: MatchFactor) -> bool {
    matches!(
        factor,
        MatchFactor::Score | MatchFactor::Education | MatchFactor::Experience
    )
}

fn strength_phrase(factor: MatchFactor, score: &FactorScore) -> String {
    let fully_met = score.status == FactorStatus::Met;
    match factor {
        MatchFactor::Score => "meets minimum score threshold".into(),
        MatchFactor::Criteria if fully_met => "meets all preferred O-1 criteria".into(),
        MatchFactor::Criteria => "meets most preferred O-1 criteria".into(),
        MatchFactor::Skills if fully_met => "full skills match".into(),
        MatchFactor::Skills => "strong skills match".into(),
        MatchFactor::Education => "meets education requirement".into(),
        MatchFactor::Experience => "meets experience requirement".into(),
    }
}

fn gap_phrase(factor: MatchFactor, talent: &TalentMatchProfile, job: &JobMatchProfile) -> String {
    match factor {
        MatchFactor::Score => match job.min_score.minimum() {
            Some(min) => format!(
                "O-1 score {} is below the job minimum of {min}",
                talent.o1_score
            ),
            None => "O-1 score below job minimum".into(),
        },
        MatchFactor::Criteria => {
            let met = job
                .preferred_criteria
                .intersection(&talent.criteria_met)
                .count();
            format!(
                "meets {met} of {} preferred O-1 criteria",
                job.preferred_criteria.len()
            )
        }
        MatchFactor::Skills => {
            let missing = skill_coverage(&job.required_skills, &talent.skills).missing;
            if missing.is_empty() {
                "few preferred skills".into()
            } else {
                let mut listed = missing
                    .iter()
                    .take(MAX_LISTED_SKILLS)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ");
                if missing.len() > MAX_LISTED_SKILLS {
                    listed.push_str(&format!(" (+{} more)", missing.len() - MAX_LISTED_SKILLS));
                }
                format!("missing required skills: {listed}")
            }
        }
        MatchFactor::Education => match job.required_education.minimum() {
            Some(required) => format!(
                "education {} is below required {}",
                talent.education_level.as_ref(),
                required.as_ref()
            ),
            None => "education below requirement".into(),
        },
        MatchFactor::Experience => match job.min_experience.minimum() {
            Some(min) => format!(
                "{} years of experience vs {min} required",
                talent.years_experience
            ),
            None => "experience below requirement".into(),
        },
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
