use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::criteria::{EducationLevel, O1Criterion};
use crate::skill_normalizer::normalize_skill_set;
use crate::{JobRecord, TalentRecord};

/// A job-side minimum. `None` means the job states no requirement and the
/// corresponding factor scores neutral.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Requirement<T> {
    #[default]
    None,
    AtLeast(T),
}

impl<T: Copy> Requirement<T> {
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Self::None, Self::AtLeast)
    }

    pub fn minimum(&self) -> Option<T> {
        match self {
            Self::None => None,
            Self::AtLeast(value) => Some(*value),
        }
    }
}

/// Normalized candidate attributes. Skill tags are stored in canonical form
/// (see [`crate::skill_normalizer::normalize_skill`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalentMatchProfile {
    pub id: String,
    pub o1_score: u8,
    pub criteria_met: BTreeSet<O1Criterion>,
    pub skills: BTreeSet<String>,
    pub education_level: EducationLevel,
    pub years_experience: u32,
}

/// Normalized job requirements. Skill tags are stored in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMatchProfile {
    pub id: String,
    pub min_score: Requirement<u8>,
    pub preferred_criteria: BTreeSet<O1Criterion>,
    pub required_skills: BTreeSet<String>,
    pub preferred_skills: BTreeSet<String>,
    pub required_education: Requirement<EducationLevel>,
    pub min_experience: Requirement<u32>,
}

impl TalentMatchProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn from_record(record: &TalentRecord) -> Self {
        let education_level = record
            .education_level
            .as_deref()
            .and_then(|raw| parse_education(raw, &record.id))
            .unwrap_or_default();

        Self {
            id: record.id.clone(),
            o1_score: clamp_score(record.o1_score.unwrap_or(0)),
            criteria_met: parse_criteria(record.criteria_met.as_deref(), &record.id),
            skills: normalize_skill_set(record.skills.as_deref().unwrap_or_default()),
            education_level,
            years_experience: clamp_years(record.years_experience.unwrap_or(0)),
        }
    }

    pub fn with_score(mut self, o1_score: u8) -> Self {
        self.o1_score = o1_score.min(100);
        self
    }

    pub fn with_criteria(mut self, criteria: impl IntoIterator<Item = O1Criterion>) -> Self {
        self.criteria_met = criteria.into_iter().collect();
        self
    }

    pub fn with_skills<S: AsRef<str>>(mut self, skills: impl IntoIterator<Item = S>) -> Self {
        self.skills = normalize_skill_set(skills);
        self
    }

    pub fn with_education(mut self, level: EducationLevel) -> Self {
        self.education_level = level;
        self
    }

    pub fn with_experience(mut self, years: u32) -> Self {
        self.years_experience = years;
        self
    }
}

impl From<&TalentRecord> for TalentMatchProfile {
    fn from(record: &TalentRecord) -> Self {
        Self::from_record(record)
    }
}

impl JobMatchProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn from_record(record: &JobRecord) -> Self {
        let required_education = record
            .required_education
            .as_deref()
            .and_then(|raw| parse_education(raw, &record.id));

        Self {
            id: record.id.clone(),
            min_score: Requirement::from_option(record.min_score.map(clamp_score)),
            preferred_criteria: parse_criteria(record.preferred_criteria.as_deref(), &record.id),
            required_skills: normalize_skill_set(
                record.required_skills.as_deref().unwrap_or_default(),
            ),
            preferred_skills: normalize_skill_set(
                record.preferred_skills.as_deref().unwrap_or_default(),
            ),
            required_education: Requirement::from_option(required_education),
            min_experience: Requirement::from_option(record.min_experience.map(clamp_years)),
        }
    }

    pub fn with_min_score(mut self, min_score: u8) -> Self {
        self.min_score = Requirement::AtLeast(min_score.min(100));
        self
    }

    pub fn with_preferred_criteria(
        mut self,
        criteria: impl IntoIterator<Item = O1Criterion>,
    ) -> Self {
        self.preferred_criteria = criteria.into_iter().collect();
        self
    }

    pub fn with_required_skills<S: AsRef<str>>(
        mut self,
        skills: impl IntoIterator<Item = S>,
    ) -> Self {
        self.required_skills = normalize_skill_set(skills);
        self
    }

    pub fn with_preferred_skills<S: AsRef<str>>(
        mut self,
        skills: impl IntoIterator<Item = S>,
    ) -> Self {
        self.preferred_skills = normalize_skill_set(skills);
        self
    }

    pub fn with_required_education(mut self, level: EducationLevel) -> Self {
        self.required_education = Requirement::AtLeast(level);
        self
    }

    pub fn with_min_experience(mut self, years: u32) -> Self {
        self.min_experience = Requirement::AtLeast(years);
        self
    }
}

impl From<&JobRecord> for JobMatchProfile {
    fn from(record: &JobRecord) -> Self {
        Self::from_record(record)
    }
}

fn clamp_score(raw: i32) -> u8 {
    raw.clamp(0, 100) as u8
}

fn clamp_years(raw: i32) -> u32 {
    raw.max(0) as u32
}

fn parse_criteria(raw: Option<&[String]>, owner: &str) -> BTreeSet<O1Criterion> {
    raw.unwrap_or_default()
        .iter()
        .filter_map(|tag| {
            let parsed = O1Criterion::parse_tag(tag);
            if parsed.is_none() {
                debug!(profile_id = owner, tag = %tag, "dropping unknown O-1 criterion tag");
            }
            parsed
        })
        .collect()
}

fn parse_education(raw: &str, owner: &str) -> Option<EducationLevel> {
    if raw.trim().is_empty() {
        return None;
    }
    let parsed = EducationLevel::parse_tag(raw);
    if parsed.is_none() {
        debug!(profile_id = owner, value = %raw, "unrecognized education level");
    }
    parsed
}
