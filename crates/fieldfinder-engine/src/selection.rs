//! Result selection and bulk contact.

use std::collections::BTreeSet;

use fieldfinder_core::{MessageSender, OutboundMessage};
use futures::stream::{self, StreamExt};

use crate::search::{ResultKey, SearchResultItem};

/// Keys of the results the user has ticked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    keys: BTreeSet<ResultKey>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `key`. Returns whether it is now selected.
    pub fn toggle(&mut self, key: ResultKey) -> bool {
        if self.keys.remove(&key) {
            false
        } else {
            self.keys.insert(key);
            true
        }
    }

    pub fn select_all(&mut self, items: &[SearchResultItem]) {
        self.keys.extend(items.iter().map(SearchResultItem::key));
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    #[must_use]
    pub fn is_selected(&self, key: &ResultKey) -> bool {
        self.keys.contains(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ResultKey> {
        self.keys.iter()
    }

    /// Selected items of `items`, in result order.
    pub fn selected_items<'a>(
        &'a self,
        items: &'a [SearchResultItem],
    ) -> impl Iterator<Item = &'a SearchResultItem> + 'a {
        items.iter().filter(|item| self.keys.contains(&item.key()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFailure {
    pub key: ResultKey,
    pub reason: String,
}

/// Outcome of one bulk-contact run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkContactReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<ContactFailure>,
}

impl BulkContactReport {
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// One-line summary suitable for a notice.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_success() {
            format!("sent {} message(s)", self.succeeded)
        } else {
            format!(
                "sent {} of {} message(s); {} failed",
                self.succeeded,
                self.attempted,
                self.failed()
            )
        }
    }
}

/// Send one message per item, at most `concurrency` at a time.
///
/// Every item is attempted regardless of earlier failures. Items without a
/// contact id are recorded as failures without a send attempt.
pub async fn bulk_contact<M: MessageSender>(
    sender: &M,
    items: &[&SearchResultItem],
    subject: &str,
    body: &str,
    concurrency: usize,
) -> BulkContactReport {
    let mut report = BulkContactReport {
        attempted: items.len(),
        ..BulkContactReport::default()
    };

    let mut messages = Vec::with_capacity(items.len());
    for item in items {
        match item.candidate.contact_id.as_deref().filter(|id| !id.is_empty()) {
            Some(recipient) => messages.push((
                item.key(),
                OutboundMessage {
                    recipient_id: recipient.to_string(),
                    subject: subject.to_string(),
                    body: body.to_string(),
                    related_item_id: item.candidate.id.clone(),
                },
            )),
            None => report.failures.push(ContactFailure {
                key: item.key(),
                reason: "listing has no contact".to_string(),
            }),
        }
    }

    let results = stream::iter(messages.into_iter().map(|(key, message)| async move {
        let result = sender.send_message(&message).await;
        (key, result)
    }))
    .buffer_unordered(concurrency.max(1))
    .collect::<Vec<_>>()
    .await;

    for (key, result) in results {
        match result {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                tracing::warn!(%key, error = %e, "message send failed");
                report.failures.push(ContactFailure {
                    key,
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        attempted = report.attempted,
        succeeded = report.succeeded,
        failed = report.failed(),
        "bulk contact finished"
    );
    report
}
