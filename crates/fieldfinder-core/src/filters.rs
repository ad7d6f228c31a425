use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, SourceType};

/// Which feeds a search should query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Vacancies,
    Availability,
    #[default]
    Both,
}

impl SearchType {
    /// Enabled feeds, vacancies first.
    #[must_use]
    pub fn sources(self) -> &'static [SourceType] {
        match self {
            SearchType::Vacancies => &[SourceType::Vacancy],
            SearchType::Availability => &[SourceType::Availability],
            SearchType::Both => &[SourceType::Vacancy, SourceType::Availability],
        }
    }
}

impl std::str::FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vacancies" => Ok(SearchType::Vacancies),
            "availability" => Ok(SearchType::Availability),
            "both" => Ok(SearchType::Both),
            other => Err(format!(
                "unknown search type \"{other}\" (expected vacancies, availability or both)"
            )),
        }
    }
}

/// Equality filters applied to every candidate. An empty string places no
/// constraint on that field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default)]
    pub search_type: SearchType,
    #[serde(default)]
    pub league: String,
    #[serde(default)]
    pub age_group: String,
}

impl SearchFilters {
    #[must_use]
    pub fn matches(&self, candidate: &Candidate) -> bool {
        field_matches(&self.league, candidate.league.as_deref())
            && field_matches(&self.age_group, candidate.age_group.as_deref())
    }
}

fn field_matches(wanted: &str, actual: Option<&str>) -> bool {
    wanted.is_empty() || actual == Some(wanted)
}
