//! Standing "notify me" subscriptions.
//!
//! On the wire an alert carries both `proximitySpec` and `region` as optional
//! fields next to an `alertType` tag. Inside the workspace the target is the
//! [`AlertTarget`] enum, so exactly one of the two is present by
//! construction; records read back from the backend go through
//! [`AlertSubscription::target`] which rejects inconsistent ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filters::SearchFilters;
use crate::geometry::{Coordinate, Polygon};
use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Proximity,
    Region,
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertType::Proximity => write!(f, "proximity"),
            AlertType::Region => write!(f, "region"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximitySpec {
    pub center: Coordinate,
    pub radius_km: f64,
}

impl ProximitySpec {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRadius`] unless `radius_km` is finite and
    /// strictly positive.
    pub fn new(center: Coordinate, radius_km: f64) -> Result<Self, CoreError> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(CoreError::InvalidRadius(radius_km));
        }
        Ok(Self { center, radius_km })
    }
}

/// Region snapshot embedded in an alert. Vertex count is checked when the
/// alert target is resolved, not during deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRegion {
    pub name: String,
    pub coordinates: Vec<Coordinate>,
}

/// What an alert watches.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertTarget {
    Proximity(ProximitySpec),
    Region { name: String, polygon: Polygon },
}

impl AlertTarget {
    #[must_use]
    pub fn alert_type(&self) -> AlertType {
        match self {
            AlertTarget::Proximity(_) => AlertType::Proximity,
            AlertTarget::Region { .. } => AlertType::Region,
        }
    }
}

/// Request body for creating an alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub alert_type: AlertType,
    pub filters: SearchFilters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proximity_spec: Option<ProximitySpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<AlertRegion>,
    pub is_active: bool,
}

impl NewAlert {
    /// Build an active alert for `target`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidRadius`] for a non-positive proximity radius.
    /// - [`CoreError::EmptyName`] for a region with a blank name.
    pub fn new(filters: SearchFilters, target: AlertTarget) -> Result<Self, CoreError> {
        let alert_type = target.alert_type();
        let (proximity_spec, region) = match target {
            AlertTarget::Proximity(spec) => {
                let spec = ProximitySpec::new(spec.center, spec.radius_km)?;
                (Some(spec), None)
            }
            AlertTarget::Region { name, polygon } => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(CoreError::EmptyName);
                }
                let region = AlertRegion {
                    name: name.to_string(),
                    coordinates: polygon.into(),
                };
                (None, Some(region))
            }
        };
        Ok(Self {
            alert_type,
            filters,
            proximity_spec,
            region,
            is_active: true,
        })
    }
}

/// An alert as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSubscription {
    pub id: String,
    pub alert_type: AlertType,
    #[serde(default)]
    pub filters: SearchFilters,
    #[serde(default)]
    pub proximity_spec: Option<ProximitySpec>,
    #[serde(default)]
    pub region: Option<AlertRegion>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AlertSubscription {
    /// Resolve the watched target, enforcing that exactly the field matching
    /// `alert_type` is present and valid.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlertSpecMismatch`] when the record carries the
    /// wrong combination of fields, or a validation error for its contents.
    pub fn target(&self) -> Result<AlertTarget, CoreError> {
        match (self.alert_type, &self.proximity_spec, &self.region) {
            (AlertType::Proximity, Some(spec), None) => Ok(AlertTarget::Proximity(
                ProximitySpec::new(spec.center, spec.radius_km)?,
            )),
            (AlertType::Region, None, Some(region)) => Ok(AlertTarget::Region {
                name: region.name.clone(),
                polygon: Polygon::new(region.coordinates.clone())?,
            }),
            _ => Err(CoreError::AlertSpecMismatch {
                id: self.id.clone(),
                alert_type: self.alert_type,
            }),
        }
    }
}
