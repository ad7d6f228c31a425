//! Listing feeds and outbound messaging.

use fieldfinder_core::{Candidate, CandidateProvider, MessageSender, OutboundMessage, SourceType};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::retry::retry_with_backoff;
use crate::types::ListEnvelope;

impl CandidateProvider for ApiClient {
    type Error = ApiError;

    /// `GET /vacancies` or `GET /availability`, retried on transient errors.
    async fn fetch_candidates(&self, source: SourceType) -> Result<Vec<Candidate>, ApiError> {
        let url = self.endpoint(&[source.collection()])?;
        let context = format!("fetch {source} candidates");

        let (url_ref, context_ref) = (&url, context.as_str());
        let envelope: ListEnvelope =
            retry_with_backoff(self.max_retries(), self.backoff_base_ms(), || async move {
                let request =
                    Self::authorize(self.http().get(url_ref.clone()), self.credentials());
                let response = Self::send(request, url_ref).await?;
                Self::read_json(response, context_ref).await
            })
            .await?;

        let candidates: Vec<Candidate> = Self::decode_items(envelope, &context);
        tracing::debug!(%source, count = candidates.len(), "fetched candidates");
        Ok(candidates)
    }
}

impl MessageSender for ApiClient {
    type Error = ApiError;

    /// `POST /messages`. Not retried: a timed-out send may still have been
    /// delivered.
    async fn send_message(&self, message: &OutboundMessage) -> Result<(), ApiError> {
        let url = self.endpoint(&["messages"])?;
        let request =
            Self::authorize(self.http().post(url.clone()), self.credentials()).json(message);
        Self::send(request, &url).await?;
        Ok(())
    }
}
