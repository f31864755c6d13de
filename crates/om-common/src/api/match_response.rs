use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::criteria::O1Criterion;
use crate::matching::{FactorScore, JobMatch, MatchCategory, MatchFactor, MatchResult, TalentMatch};
use crate::{ENGINE_VERSION, JobRecord, TalentRecord};

/// Single talent/job match as returned over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResponse {
    pub talent_id: String,
    pub job_id: String,
    pub match_score: u8,
    pub match_category: MatchCategory,
    pub match_summary: String,
    pub breakdown: BTreeMap<MatchFactor, FactorScore>,
    pub matched_criteria: Vec<O1Criterion>,
    pub matched_skills: Vec<String>,
    pub missing_required_skills: Vec<String>,
    pub engine_version: String,
    pub matched_at: DateTime<Utc>,
}

impl MatchResponse {
    pub fn from_match_result(
        talent_id: &str,
        job_id: &str,
        result: MatchResult,
        matched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            talent_id: talent_id.to_string(),
            job_id: job_id.to_string(),
            match_score: result.overall_score,
            match_category: result.category,
            match_summary: result.summary,
            breakdown: result.breakdown,
            matched_criteria: result.matched_criteria,
            matched_skills: result.matched_skills,
            missing_required_skills: result.missing_required_skills,
            engine_version: ENGINE_VERSION.to_string(),
            matched_at,
        }
    }
}

/// Job metadata shown next to a ranked match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
}

impl From<&JobRecord> for JobSummary {
    fn from(record: &JobRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            company_name: record.company_name.clone(),
            location: record.location.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalentSummary {
    pub id: String,
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub o1_score: Option<i32>,
}

impl From<&TalentRecord> for TalentSummary {
    fn from(record: &TalentRecord) -> Self {
        Self {
            id: record.id.clone(),
            full_name: record.full_name.clone(),
            headline: record.headline.clone(),
            o1_score: record.o1_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMatchEntry {
    pub job: JobSummary,
    pub match_score: u8,
    pub match_category: MatchCategory,
    pub match_summary: String,
}

impl JobMatchEntry {
    /// `records` must be the slice the match profiles were built from, in the
    /// same order; the ranked index points into it.
    pub fn from_ranked(records: &[JobRecord], ranked: JobMatch<'_>) -> Option<Self> {
        let record = records.get(ranked.index)?;
        Some(Self {
            job: JobSummary::from(record),
            match_score: ranked.result.overall_score,
            match_category: ranked.result.category,
            match_summary: ranked.result.summary,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalentMatchEntry {
    pub talent: TalentSummary,
    pub match_score: u8,
    pub match_category: MatchCategory,
    pub match_summary: String,
}

impl TalentMatchEntry {
    pub fn from_ranked(records: &[TalentRecord], ranked: TalentMatch<'_>) -> Option<Self> {
        let record = records.get(ranked.index)?;
        Some(Self {
            talent: TalentSummary::from(record),
            match_score: ranked.result.overall_score,
            match_category: ranked.result.category,
            match_summary: ranked.result.summary,
        })
    }
}
