pub mod alert;
pub mod app_config;
pub mod candidate;
pub mod config;
pub mod filters;
pub mod geometry;
pub mod providers;
pub mod region;

pub use alert::{AlertRegion, AlertSubscription, AlertTarget, AlertType, NewAlert, ProximitySpec};
pub use app_config::{AppConfig, Environment};
pub use candidate::{Candidate, SourceType};
pub use config::{load_app_config, load_app_config_from_env};
pub use filters::{SearchFilters, SearchType};
pub use geometry::{haversine_km, point_in_polygon, Bounds, Coordinate, Polygon};
pub use providers::{AlertBackend, CandidateProvider, Credentials, MessageSender, OutboundMessage};
pub use region::Region;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("coordinate out of range: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("malformed coordinate \"{0}\" (expected \"lat,lng\")")]
    MalformedCoordinate(String),

    #[error("a polygon needs at least 3 distinct vertices, got {0}")]
    TooFewVertices(usize),

    #[error("name must not be empty")]
    EmptyName,

    #[error("radius must be a positive number of kilometres, got {0}")]
    InvalidRadius(f64),

    #[error("alert {id} of type {alert_type} must carry exactly the matching spec")]
    AlertSpecMismatch { id: String, alert_type: AlertType },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
