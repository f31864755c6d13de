use tracing::debug;

use super::{
    profile::{JobMatchProfile, TalentMatchProfile},
    scoring::{MatchEngine, MatchResult, default_engine},
};

/// A scored candidate borrowed from the input slice. `index` is its position
/// in that slice.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMatch<'a, T> {
    pub index: usize,
    pub item: &'a T,
    pub result: MatchResult,
}

pub type JobMatch<'a> = RankedMatch<'a, JobMatchProfile>;
pub type TalentMatch<'a> = RankedMatch<'a, TalentMatchProfile>;

impl MatchEngine {
    /// Best jobs for one talent, highest score first.
    pub fn best_job_matches<'a>(
        &self,
        talent: &TalentMatchProfile,
        jobs: &'a [JobMatchProfile],
        limit: usize,
    ) -> Vec<JobMatch<'a>> {
        let ranked = rank(
            jobs,
            limit,
            |job| job.id.as_str(),
            |job| self.calculate_match_score(talent, job),
        );
        debug!(
            talent_id = %talent.id,
            candidates = jobs.len(),
            returned = ranked.len(),
            "ranked jobs for talent"
        );
        ranked
    }

    /// Best talents for one job, highest score first.
    pub fn best_talent_matches<'a>(
        &self,
        job: &JobMatchProfile,
        talents: &'a [TalentMatchProfile],
        limit: usize,
    ) -> Vec<TalentMatch<'a>> {
        let ranked = rank(
            talents,
            limit,
            |talent| talent.id.as_str(),
            |talent| self.calculate_match_score(talent, job),
        );
        debug!(
            job_id = %job.id,
            candidates = talents.len(),
            returned = ranked.len(),
            "ranked talents for job"
        );
        ranked
    }
}

pub fn get_best_job_matches<'a>(
    talent: &TalentMatchProfile,
    jobs: &'a [JobMatchProfile],
    limit: usize,
) -> Vec<JobMatch<'a>> {
    default_engine().best_job_matches(talent, jobs, limit)
}

pub fn get_best_talent_matches<'a>(
    job: &JobMatchProfile,
    talents: &'a [TalentMatchProfile],
    limit: usize,
) -> Vec<TalentMatch<'a>> {
    default_engine().best_talent_matches(job, talents, limit)
}

// Sorted by score descending, then id ascending, then input position, so the
// output is deterministic for any input order.
fn rank<'a, T>(
    items: &'a [T],
    limit: usize,
    id: impl Fn(&T) -> &str,
    score: impl Fn(&T) -> MatchResult,
) -> Vec<RankedMatch<'a, T>> {
    if limit == 0 || items.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<RankedMatch<'a, T>> = items
        .iter()
        .enumerate()
        .map(|(index, item)| RankedMatch {
            index,
            item,
            result: score(item),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.result
            .overall_score
            .cmp(&a.result.overall_score)
            .then_with(|| id(a.item).cmp(id(b.item)))
            .then_with(|| a.index.cmp(&b.index))
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::O1Criterion;

    fn jobs() -> Vec<JobMatchProfile> {
        vec![
            JobMatchProfile::new("job-c").with_min_score(95),
            JobMatchProfile::new("job-a").with_min_score(50),
            JobMatchProfile::new("job-b")
                .with_min_score(50)
                .with_preferred_criteria([O1Criterion::Judging]),
        ]
    }

    #[test]
    fn jobs_are_ranked_by_score_descending() {
        let talent = TalentMatchProfile::new("t").with_score(60);
        let jobs = jobs();

        let ranked = get_best_job_matches(&talent, &jobs, 10);
        let ids: Vec<&str> = ranked.iter().map(|m| m.item.id.as_str()).collect();
        assert_eq!(ids, vec!["job-a", "job-b", "job-c"]);
        assert_eq!(ranked[0].index, 1);
        assert!(
            ranked
                .windows(2)
                .all(|w| w[0].result.overall_score >= w[1].result.overall_score)
        );
    }

    #[test]
    fn limit_truncates_and_zero_returns_nothing() {
        let talent = TalentMatchProfile::new("t").with_score(60);
        let jobs = jobs();

        assert_eq!(get_best_job_matches(&talent, &jobs, 1).len(), 1);
        assert!(get_best_job_matches(&talent, &jobs, 0).is_empty());
        assert!(get_best_job_matches(&talent, &[], 5).is_empty());
    }

    #[test]
    fn ties_break_on_id_then_position() {
        let talents = vec![
            TalentMatchProfile::new("zed").with_score(70),
            TalentMatchProfile::new("amy").with_score(70),
            TalentMatchProfile::new("amy").with_score(70),
        ];
        let job = JobMatchProfile::new("j").with_min_score(60);

        let ranked = get_best_talent_matches(&job, &talents, 3);
        let order: Vec<(usize, &str)> = ranked
            .iter()
            .map(|m| (m.index, m.item.id.as_str()))
            .collect();
        assert_eq!(order, vec![(1, "amy"), (2, "amy"), (0, "zed")]);
    }

    #[test]
    fn ranked_result_matches_pairwise_score() {
        let talent = TalentMatchProfile::new("t").with_score(72);
        let jobs = jobs();
        let engine = MatchEngine::default();

        for ranked in engine.best_job_matches(&talent, &jobs, 3) {
            assert_eq!(ranked.result, engine.calculate_match_score(&talent, ranked.item));
        }
    }
}
