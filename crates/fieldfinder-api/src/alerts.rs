//! Alert subscription endpoints.

use fieldfinder_core::{AlertBackend, AlertSubscription, Credentials, NewAlert};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::retry::retry_with_backoff;
use crate::types::{ActivePatch, ListEnvelope};

impl AlertBackend for ApiClient {
    type Error = ApiError;

    async fn list_alerts(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<AlertSubscription>, ApiError> {
        let url = self.endpoint(&["alerts"])?;
        let url_ref = &url;
        let envelope: ListEnvelope =
            retry_with_backoff(self.max_retries(), self.backoff_base_ms(), || async move {
                let request =
                    Self::authorize(self.http().get(url_ref.clone()), Some(credentials));
                let response = Self::send(request, url_ref).await?;
                Self::read_json(response, "list alerts").await
            })
            .await?;
        Ok(Self::decode_items(envelope, "list alerts"))
    }

    async fn create_alert(
        &self,
        credentials: &Credentials,
        alert: &NewAlert,
    ) -> Result<AlertSubscription, ApiError> {
        let url = self.endpoint(&["alerts"])?;
        let request = Self::authorize(self.http().post(url.clone()), Some(credentials)).json(alert);
        let response = Self::send(request, &url).await?;
        Self::read_json(response, "create alert").await
    }

    async fn set_alert_active(
        &self,
        credentials: &Credentials,
        id: &str,
        is_active: bool,
    ) -> Result<AlertSubscription, ApiError> {
        let url = self.endpoint(&["alerts", id])?;
        let request = Self::authorize(self.http().patch(url.clone()), Some(credentials))
            .json(&ActivePatch { is_active });
        let response = Self::send(request, &url).await?;
        Self::read_json(response, &format!("update alert {id}")).await
    }

    async fn delete_alert(&self, credentials: &Credentials, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["alerts", id])?;
        let request = Self::authorize(self.http().delete(url.clone()), Some(credentials));
        Self::send(request, &url).await?;
        Ok(())
    }
}
