//! One-shot device position lookup for "use my location".

use std::future::Future;
use std::time::Duration;

use fieldfinder_core::Coordinate;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    PositionUnavailable,

    #[error("location request timed out")]
    Timeout,
}

impl GeolocationError {
    /// Actionable text for the user; each failure gets its own advice.
    #[must_use]
    pub fn user_message(self) -> &'static str {
        match self {
            GeolocationError::PermissionDenied => {
                "Location access was denied. Allow location access for this site, or move the search centre on the map."
            }
            GeolocationError::PositionUnavailable => {
                "Your position could not be determined. Check that location services are switched on and try again."
            }
            GeolocationError::Timeout => {
                "Finding your location took too long. Try again, or move the search centre on the map."
            }
        }
    }
}

pub trait GeolocationProvider: Send + Sync {
    fn current_position(&self) -> impl Future<Output = Result<Coordinate, GeolocationError>> + Send;
}

/// A provider that always answers with the same outcome, for hosts that
/// learn the position some other way.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Result<Coordinate, GeolocationError>);

impl GeolocationProvider for FixedPosition {
    async fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        self.0
    }
}

/// Ask `provider` for the current position, giving up after `timeout`.
///
/// # Errors
///
/// The provider's own error, or [`GeolocationError::Timeout`].
pub async fn locate<G: GeolocationProvider>(
    provider: &G,
    timeout: Duration,
) -> Result<Coordinate, GeolocationError> {
    let result = tokio::time::timeout(timeout, provider.current_position())
        .await
        .unwrap_or(Err(GeolocationError::Timeout));
    match &result {
        Ok(position) => tracing::debug!(%position, "position acquired"),
        Err(e) => tracing::warn!(error = %e, "geolocation failed"),
    }
    result
}
