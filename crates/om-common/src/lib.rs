pub mod api;
pub mod criteria;
pub mod db;
pub mod logging;
pub mod matching;
pub mod skill_normalizer;

use serde::{Deserialize, Serialize};

/// Version string stamped on every match response.
pub const ENGINE_VERSION: &str = concat!("om-match/", env!("CARGO_PKG_VERSION"));

// Stored row snapshots. Every matchable field is optional here; the match
// profiles in `matching::profile` are the normalized form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TalentRecord {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub o1_score: Option<i32>,
    #[serde(default)]
    pub criteria_met: Option<Vec<String>>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub education_level: Option<String>,
    #[serde(default)]
    pub years_experience: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    #[serde(default)]
    pub employer_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub min_score: Option<i32>,
    #[serde(default)]
    pub preferred_criteria: Option<Vec<String>>,
    #[serde(default)]
    pub required_skills: Option<Vec<String>>,
    #[serde(default)]
    pub preferred_skills: Option<Vec<String>>,
    #[serde(default)]
    pub required_education: Option<String>,
    #[serde(default)]
    pub min_experience: Option<i32>,
}
