//! Proximity and containment search over the listing feeds.
//!
//! Every [`SearchController::run`] call takes a ticket from a monotonically
//! increasing counter. When the fetch completes, the result set is published
//! only if no newer request has been issued in the meantime; otherwise it is
//! reported as [`SearchOutcome::Superseded`] and dropped. A slow response to
//! an old query can therefore never overwrite a fresher one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use fieldfinder_core::{
    Candidate, CandidateProvider, Coordinate, Polygon, ProximitySpec, SearchFilters, SourceType,
};
use futures::future::join_all;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchMode {
    Proximity(ProximitySpec),
    Containment(Polygon),
}

impl SearchMode {
    #[must_use]
    pub fn is_containment(&self) -> bool {
        matches!(self, SearchMode::Containment(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub mode: SearchMode,
    pub filters: SearchFilters,
}

/// Stable identity of a result across searches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultKey {
    pub source_type: SourceType,
    pub source_id: String,
}

impl std::fmt::Display for ResultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source_type, self.source_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub source_type: SourceType,
    pub coordinate: Coordinate,
    /// Set in proximity mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    pub candidate: Candidate,
}

impl SearchResultItem {
    #[must_use]
    pub fn key(&self) -> ResultKey {
        ResultKey {
            source_type: self.source_type,
            source_id: self.candidate.id.clone(),
        }
    }
}

/// A feed that could not be fetched for one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source_type: SourceType,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    pub ticket: u64,
    pub items: Vec<SearchResultItem>,
    /// Feeds that failed and contributed nothing to `items`.
    pub degraded: Vec<SourceFailure>,
}

#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Applied(Arc<SearchResults>),
    /// A newer request was issued while this one was in flight.
    Superseded { ticket: u64 },
}

pub struct SearchController<P: CandidateProvider> {
    provider: P,
    issued: AtomicU64,
    published: Mutex<Option<Arc<SearchResults>>>,
}

impl<P: CandidateProvider> SearchController<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            issued: AtomicU64::new(0),
            published: Mutex::new(None),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The most recently published result set.
    pub fn current(&self) -> Option<Arc<SearchResults>> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Ticket of the newest request issued so far; `0` before the first.
    pub fn latest_ticket(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    /// Fetch every feed enabled by the filters concurrently, evaluate the
    /// request and publish the result unless a newer request was issued in
    /// the meantime.
    ///
    /// A feed that fails contributes no items and is listed in
    /// [`SearchResults::degraded`]; the other feed still completes.
    pub async fn run(&self, request: &SearchRequest) -> SearchOutcome {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(ticket, containment = request.mode.is_containment(), "search issued");

        let sources = request.filters.search_type.sources();
        let fetched = join_all(sources.iter().map(|&source| async move {
            (source, self.provider.fetch_candidates(source).await)
        }))
        .await;

        let mut batches = Vec::with_capacity(fetched.len());
        let mut degraded = Vec::new();
        for (source, result) in fetched {
            match result {
                Ok(candidates) => batches.push((source, candidates)),
                Err(e) => {
                    tracing::warn!(ticket, %source, error = %e, "candidate fetch failed; source skipped");
                    degraded.push(SourceFailure {
                        source_type: source,
                        message: e.to_string(),
                    });
                }
            }
        }

        let items = evaluate(&request.mode, &request.filters, batches);

        let mut published = self
            .published
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let latest = self.issued.load(Ordering::SeqCst);
        if latest != ticket {
            tracing::debug!(ticket, latest, "stale search result discarded");
            return SearchOutcome::Superseded { ticket };
        }
        let results = Arc::new(SearchResults {
            ticket,
            items,
            degraded,
        });
        *published = Some(Arc::clone(&results));
        tracing::info!(
            ticket,
            results = results.items.len(),
            degraded = results.degraded.len(),
            "search results published"
        );
        SearchOutcome::Applied(results)
    }
}

/// Filter, locate and (for proximity) rank candidates.
///
/// Candidates failing the league/age-group filter or lacking a valid
/// coordinate are dropped. Proximity keeps candidates within the radius and
/// sorts them nearest first; containment keeps candidates inside or on the
/// polygon in feed order.
#[must_use]
pub fn evaluate(
    mode: &SearchMode,
    filters: &SearchFilters,
    batches: Vec<(SourceType, Vec<Candidate>)>,
) -> Vec<SearchResultItem> {
    let located = batches.into_iter().flat_map(|(source_type, candidates)| {
        candidates.into_iter().filter_map(move |candidate| {
            if !filters.matches(&candidate) {
                return None;
            }
            let coordinate = candidate.coordinate()?;
            Some((source_type, coordinate, candidate))
        })
    });

    match mode {
        SearchMode::Proximity(spec) => {
            let mut items: Vec<SearchResultItem> = located
                .filter_map(|(source_type, coordinate, candidate)| {
                    let distance = spec.center.distance_km(&coordinate);
                    (distance <= spec.radius_km).then_some(SearchResultItem {
                        source_type,
                        coordinate,
                        distance_km: Some(distance),
                        candidate,
                    })
                })
                .collect();
            items.sort_by(|a, b| {
                a.distance_km
                    .unwrap_or(f64::INFINITY)
                    .total_cmp(&b.distance_km.unwrap_or(f64::INFINITY))
            });
            items
        }
        SearchMode::Containment(polygon) => located
            .filter(|(_, coordinate, _)| polygon.contains(coordinate))
            .map(|(source_type, coordinate, candidate)| SearchResultItem {
                source_type,
                coordinate,
                distance_km: None,
                candidate,
            })
            .collect(),
    }
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
