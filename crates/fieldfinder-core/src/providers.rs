//! Collaborator seams.
//!
//! The engine talks to the listings backend, the messaging service and the
//! alert store only through these traits. `fieldfinder-api` implements all
//! three over REST; tests substitute in-memory fakes.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::alert::{AlertSubscription, NewAlert};
use crate::candidate::{Candidate, SourceType};

/// Bearer credentials of the signed-in caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"[redacted]")
            .finish()
    }
}

/// One outbound message about one search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub recipient_id: String,
    pub subject: String,
    pub body: String,
    pub related_item_id: String,
}

/// Read side of the vacancy and availability feeds.
pub trait CandidateProvider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch every record of one feed.
    fn fetch_candidates(
        &self,
        source: SourceType,
    ) -> impl Future<Output = Result<Vec<Candidate>, Self::Error>> + Send;
}

pub trait MessageSender: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn send_message(
        &self,
        message: &OutboundMessage,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Remote CRUD for alert subscriptions, scoped to the caller's credentials.
pub trait AlertBackend: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn list_alerts(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Vec<AlertSubscription>, Self::Error>> + Send;

    fn create_alert(
        &self,
        credentials: &Credentials,
        alert: &NewAlert,
    ) -> impl Future<Output = Result<AlertSubscription, Self::Error>> + Send;

    fn set_alert_active(
        &self,
        credentials: &Credentials,
        id: &str,
        is_active: bool,
    ) -> impl Future<Output = Result<AlertSubscription, Self::Error>> + Send;

    fn delete_alert(
        &self,
        credentials: &Credentials,
        id: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
