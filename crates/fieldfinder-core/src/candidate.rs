use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::Coordinate;

/// Which listing feed a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// A club advertising an open squad place.
    Vacancy,
    /// A player advertising that they are looking for a club.
    Availability,
}

impl SourceType {
    /// REST collection path segment for this feed.
    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            SourceType::Vacancy => "vacancies",
            SourceType::Availability => "availability",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::Vacancy => write!(f, "vacancy"),
            SourceType::Availability => write!(f, "availability"),
        }
    }
}

/// A vacancy or availability record as returned by the listings backend.
///
/// Coordinates are optional on the wire; records without a valid position
/// never enter a geometric search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub age_group: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// User id that outbound messages about this record are routed to.
    #[serde(default)]
    pub contact_id: Option<String>,
    /// Everything else the backend sends (position, team name, ...).
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Candidate {
    /// Validated position, or `None` when missing or out of range.
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        Coordinate::new(self.latitude?, self.longitude?).ok()
    }
}
