use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::Polygon;
use crate::CoreError;

/// A named, saved polygon that can be re-used for containment searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: String,
    pub name: String,
    pub coordinates: Polygon,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Region {
    /// Build a new region with a fresh id. The name is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyName`] when the trimmed name is empty.
    pub fn new(name: &str, coordinates: Polygon) -> Result<Self, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::EmptyName);
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            coordinates,
            created_at: Utc::now(),
            is_visible: true,
        })
    }
}
