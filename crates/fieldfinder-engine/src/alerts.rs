//! Alert subscriptions for the signed-in caller.

use fieldfinder_core::{
    AlertBackend, AlertSubscription, AlertTarget, Credentials, NewAlert, SearchFilters,
};

use crate::error::AlertError;

pub struct AlertManager<B: AlertBackend> {
    backend: B,
    credentials: Option<Credentials>,
}

impl<B: AlertBackend> AlertManager<B> {
    /// `credentials` is `None` for an anonymous caller, in which case every
    /// operation fails with [`AlertError::Unauthenticated`].
    pub fn new(backend: B, credentials: Option<Credentials>) -> Self {
        Self {
            backend,
            credentials,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    fn credentials(&self) -> Result<&Credentials, AlertError> {
        self.credentials.as_ref().ok_or(AlertError::Unauthenticated)
    }

    /// Create an active alert watching `target` with `filters`.
    ///
    /// # Errors
    ///
    /// [`AlertError::Unauthenticated`] without credentials,
    /// [`AlertError::Contract`] for an invalid target or an inconsistent
    /// record in the reply, [`AlertError::Backend`] for transport failures.
    pub async fn create(
        &self,
        filters: SearchFilters,
        target: AlertTarget,
    ) -> Result<AlertSubscription, AlertError> {
        let credentials = self.credentials()?;
        let alert = NewAlert::new(filters, target)?;
        let created = self
            .backend
            .create_alert(credentials, &alert)
            .await
            .map_err(backend)?;
        created.target()?;
        tracing::info!(id = %created.id, alert_type = %created.alert_type, "alert created");
        Ok(created)
    }

    /// Every alert of the caller. Records that violate the alert invariants
    /// are skipped.
    ///
    /// # Errors
    ///
    /// [`AlertError::Unauthenticated`] or [`AlertError::Backend`].
    pub async fn list(&self) -> Result<Vec<AlertSubscription>, AlertError> {
        let credentials = self.credentials()?;
        let alerts = self
            .backend
            .list_alerts(credentials)
            .await
            .map_err(backend)?;
        Ok(alerts
            .into_iter()
            .filter(|alert| match alert.target() {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!(id = %alert.id, error = %e, "skipping malformed alert");
                    false
                }
            })
            .collect())
    }

    /// Activate or pause an alert.
    ///
    /// # Errors
    ///
    /// Same as [`AlertManager::create`].
    pub async fn toggle(&self, id: &str, is_active: bool) -> Result<AlertSubscription, AlertError> {
        let credentials = self.credentials()?;
        let updated = self
            .backend
            .set_alert_active(credentials, id, is_active)
            .await
            .map_err(backend)?;
        updated.target()?;
        tracing::info!(%id, is_active, "alert toggled");
        Ok(updated)
    }

    /// # Errors
    ///
    /// [`AlertError::Unauthenticated`] or [`AlertError::Backend`].
    pub async fn delete(&self, id: &str) -> Result<(), AlertError> {
        let credentials = self.credentials()?;
        self.backend
            .delete_alert(credentials, id)
            .await
            .map_err(backend)?;
        tracing::info!(%id, "alert deleted");
        Ok(())
    }
}

fn backend<E: std::error::Error + Send + Sync + 'static>(e: E) -> AlertError {
    AlertError::Backend(Box::new(e))
}

#[cfg(test)]
#[path = "alerts_test.rs"]
mod tests;
