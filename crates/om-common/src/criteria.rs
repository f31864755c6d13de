use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};

/// O-1A evidentiary criteria. A candidate needs three of the eight to qualify.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum O1Criterion {
    /// Nationally or internationally recognized prizes or awards
    Awards,
    /// Membership in associations requiring outstanding achievement
    Membership,
    /// Published material about the candidate in professional or major media
    Press,
    /// Participation as a judge of the work of others
    Judging,
    OriginalContribution,
    ScholarlyArticles,
    CriticalEmployment,
    HighRemuneration,
}

impl O1Criterion {
    /// Parse a stored criterion tag. Case and separators are ignored; a few
    /// legacy names are accepted. Returns `None` for anything unrecognized.
    pub fn parse_tag(raw: &str) -> Option<Self> {
        let key = canonical_key(raw);
        let criterion = match key.as_str() {
            "awards" | "award" | "prizes" => Self::Awards,
            "membership" | "memberships" => Self::Membership,
            "press" | "published_material" | "media_coverage" => Self::Press,
            "judging" | "judge" => Self::Judging,
            "original_contribution" | "original_contributions" => Self::OriginalContribution,
            "scholarly_articles" | "authorship" | "publications" => Self::ScholarlyArticles,
            "critical_employment" | "critical_role" | "leading_role" => Self::CriticalEmployment,
            "high_remuneration" | "high_salary" => Self::HighRemuneration,
            _ => return None,
        };
        Some(criterion)
    }
}

/// Education attainment, ordered from lowest to highest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EducationLevel {
    #[default]
    None,
    HighSchool,
    Associate,
    Bachelors,
    Masters,
    Doctorate,
}

impl EducationLevel {
    pub fn rank(self) -> u8 {
        match self {
            Self::None => 0,
            Self::HighSchool => 1,
            Self::Associate => 2,
            Self::Bachelors => 3,
            Self::Masters => 4,
            Self::Doctorate => 5,
        }
    }

    pub fn parse_tag(raw: &str) -> Option<Self> {
        let key = canonical_key(raw).replace(['.', '\''], "");
        let level = match key.as_str() {
            "none" | "no_degree" => Self::None,
            "high_school" | "highschool" | "hs" | "ged" | "secondary" => Self::HighSchool,
            "associate" | "associates" | "associate_degree" => Self::Associate,
            "bachelors" | "bachelor" | "bachelor_degree" | "bs" | "ba" | "bsc" | "undergraduate" => {
                Self::Bachelors
            }
            "masters" | "master" | "master_degree" | "ms" | "ma" | "msc" | "mba" => Self::Masters,
            "doctorate" | "phd" | "doctoral" | "md" | "jd" => Self::Doctorate,
            _ => return None,
        };
        Some(level)
    }
}

fn canonical_key(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn enumerates_eight_criteria() {
        assert_eq!(O1Criterion::iter().count(), 8);
    }

    #[test]
    fn criterion_tags_round_trip_through_as_ref() {
        for criterion in O1Criterion::iter() {
            assert_eq!(O1Criterion::parse_tag(criterion.as_ref()), Some(criterion));
        }
    }

    #[test]
    fn criterion_parsing_ignores_case_and_separators() {
        assert_eq!(
            O1Criterion::parse_tag(" Original-Contribution "),
            Some(O1Criterion::OriginalContribution)
        );
        assert_eq!(
            O1Criterion::parse_tag("critical employment"),
            Some(O1Criterion::CriticalEmployment)
        );
        assert_eq!(O1Criterion::parse_tag("published_material"), Some(O1Criterion::Press));
        assert_eq!(O1Criterion::parse_tag("astrology"), None);
    }

    #[test]
    fn education_ranks_are_strictly_ordered() {
        let ranks: Vec<u8> = EducationLevel::iter().map(EducationLevel::rank).collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
        assert!(EducationLevel::Masters > EducationLevel::Bachelors);
    }

    #[test]
    fn education_aliases_parse() {
        assert_eq!(EducationLevel::parse_tag("PhD"), Some(EducationLevel::Doctorate));
        assert_eq!(EducationLevel::parse_tag("B.S."), Some(EducationLevel::Bachelors));
        assert_eq!(EducationLevel::parse_tag("MBA"), Some(EducationLevel::Masters));
        assert_eq!(EducationLevel::parse_tag("high school"), Some(EducationLevel::HighSchool));
        assert_eq!(EducationLevel::parse_tag("wizardry"), None);
    }
}
