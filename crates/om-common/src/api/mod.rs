pub mod match_request;
pub mod match_response;

pub use match_request::{DEFAULT_MATCH_LIMIT, LimitQuery, MAX_MATCH_LIMIT};
pub use match_response::{
    JobMatchEntry, JobSummary, MatchResponse, TalentMatchEntry, TalentSummary,
};
