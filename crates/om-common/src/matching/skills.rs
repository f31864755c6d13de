use std::collections::BTreeSet;

/// Coverage of one job skill list by the talent's skills. Both sides are
/// expected to hold canonical tags.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillCoverage {
    /// Fraction of the job list found on the talent, 1.0 when the list is empty.
    pub coverage: f64,
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    /// The job listed nothing, so coverage is neutral.
    pub unspecified: bool,
}

pub fn skill_coverage(wanted: &BTreeSet<String>, possessed: &BTreeSet<String>) -> SkillCoverage {
    if wanted.is_empty() {
        return SkillCoverage {
            coverage: 1.0,
            matched: vec![],
            missing: vec![],
            unspecified: true,
        };
    }

    let matched: Vec<String> = wanted.intersection(possessed).cloned().collect();
    let missing: Vec<String> = wanted.difference(possessed).cloned().collect();
    let coverage = matched.len() as f64 / wanted.len() as f64;

    SkillCoverage {
        coverage,
        matched,
        missing,
        unspecified: false,
    }
}
