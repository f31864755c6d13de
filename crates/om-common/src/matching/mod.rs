pub mod category;
pub mod config;
pub mod profile;
pub mod ranking;
pub mod scoring;
pub mod skills;
pub mod summary;
pub mod weights;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};

pub use category::{CategoryThresholds, MatchCategory};
pub use config::MatchingConfig;
pub use profile::{JobMatchProfile, Requirement, TalentMatchProfile};
pub use ranking::{
    JobMatch, RankedMatch, TalentMatch, get_best_job_matches, get_best_talent_matches,
};
pub use scoring::{FactorScore, MatchEngine, MatchResult, calculate_match_score};
pub use weights::{DEFAULT_WEIGHTS, MatchWeights};

/// One weighted sub-computation of the overall match score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchFactor {
    Score,
    Criteria,
    Skills,
    Education,
    Experience,
}

/// How a single factor came out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FactorStatus {
    /// The job states no requirement for this factor.
    NotRequired,
    Met,
    Partial,
    Missed,
}
