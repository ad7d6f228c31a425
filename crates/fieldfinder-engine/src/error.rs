use fieldfinder_core::CoreError;
use thiserror::Error;

/// Errors from the saved-region store.
#[derive(Debug, Error)]
pub enum RegionError {
    /// Name or polygon failed validation; nothing was written.
    #[error("invalid region: {0}")]
    Invalid(#[from] CoreError),

    #[error("no saved region with id {0}")]
    NotFound(String),

    #[error("region storage I/O error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("failed to encode saved regions: {0}")]
    Encode(#[source] serde_json::Error),

    /// Save requested with no polygon on the map.
    #[error("there is no polygon to save")]
    NoActivePolygon,
}

/// Errors from the alert manager.
#[derive(Debug, Error)]
pub enum AlertError {
    /// No signed-in caller. The backend was not contacted.
    #[error("you need to sign in to manage alerts")]
    Unauthenticated,

    /// The alert, or a record returned for it, violates the alert invariants.
    #[error("invalid alert: {0}")]
    Contract(#[from] CoreError),

    #[error("there is no polygon to create a region alert from")]
    NoActivePolygon,

    #[error("alert backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}
