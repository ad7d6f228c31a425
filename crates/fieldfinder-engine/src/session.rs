//! One user's search screen: map drawing, the current search mode, results,
//! selection and the notices raised along the way.
//!
//! The session owns the receiving end of the drawing channel. Map listeners
//! queue [`DrawInput`]s; [`SearchSession::process_pending`] applies them in
//! order and re-runs the search whenever the polygon changes.

use std::sync::Arc;
use std::time::Duration;

use fieldfinder_core::{
    AlertBackend, AlertSubscription, AlertTarget, CandidateProvider, Coordinate, CoreError,
    MessageSender, Polygon, ProximitySpec, Region, SearchFilters,
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use crate::alerts::AlertManager;
use crate::drawing::{DrawInput, DrawOutcome, DrawPhase, DrawingController};
use crate::error::{AlertError, RegionError};
use crate::geolocation::{locate, GeolocationProvider};
use crate::kv::KeyValueStore;
use crate::notice::Notice;
use crate::regions::RegionStore;
use crate::search::{
    SearchController, SearchMode, SearchOutcome, SearchRequest, SearchResultItem, SearchResults,
};
use crate::selection::{bulk_contact, BulkContactReport, Selection};
use crate::surface::MapSurface;

const DEFAULT_CONTACT_CONCURRENCY: usize = 8;
const DEFAULT_GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SearchSession<S: MapSurface, P: CandidateProvider> {
    drawing: DrawingController<S>,
    inputs: UnboundedReceiver<DrawInput>,
    search: SearchController<P>,
    selection: Selection,
    filters: SearchFilters,
    proximity: ProximitySpec,
    contact_concurrency: usize,
    geolocation_timeout: Duration,
    notices: Vec<Notice>,
}

impl<S: MapSurface, P: CandidateProvider> SearchSession<S, P> {
    /// Start in proximity mode around `proximity`, with default filters and
    /// no search run yet.
    pub fn new(surface: S, provider: P, proximity: ProximitySpec) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            drawing: DrawingController::new(surface, tx),
            inputs: rx,
            search: SearchController::new(provider),
            selection: Selection::new(),
            filters: SearchFilters::default(),
            proximity,
            contact_concurrency: DEFAULT_CONTACT_CONCURRENCY,
            geolocation_timeout: DEFAULT_GEOLOCATION_TIMEOUT,
            notices: Vec::new(),
        }
    }

    /// Initial filters, without running a search.
    #[must_use]
    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn with_contact_concurrency(mut self, concurrency: usize) -> Self {
        self.contact_concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_geolocation_timeout(mut self, timeout: Duration) -> Self {
        self.geolocation_timeout = timeout;
        self
    }

    /// Containment while a polygon is on the map, proximity otherwise.
    pub fn mode(&self) -> SearchMode {
        match self.drawing.active_polygon() {
            Some(polygon) => SearchMode::Containment(polygon.clone()),
            None => SearchMode::Proximity(self.proximity.clone()),
        }
    }

    pub fn phase(&self) -> DrawPhase {
        self.drawing.phase()
    }

    pub fn active_polygon(&self) -> Option<&Polygon> {
        self.drawing.active_polygon()
    }

    pub fn drawing(&self) -> &DrawingController<S> {
        &self.drawing
    }

    pub fn surface(&self) -> &S {
        self.drawing.surface()
    }

    pub fn surface_mut(&mut self) -> &mut S {
        self.drawing.surface_mut()
    }

    pub fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    pub fn proximity(&self) -> &ProximitySpec {
        &self.proximity
    }

    pub fn results(&self) -> Option<Arc<SearchResults>> {
        self.search.current()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// Select every item of the current result set.
    pub fn select_all(&mut self) {
        if let Some(results) = self.search.current() {
            self.selection.select_all(&results.items);
        }
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Run the search for the current mode and filters. A published result
    /// set clears the selection; failed feeds raise a warning notice.
    pub async fn refresh(&mut self) -> SearchOutcome {
        let request = SearchRequest {
            mode: self.mode(),
            filters: self.filters.clone(),
        };
        let outcome = self.search.run(&request).await;
        if let SearchOutcome::Applied(results) = &outcome {
            self.selection.clear();
            for failure in &results.degraded {
                self.notices.push(Notice::warning(format!(
                    "{} listings could not be loaded, so results may be incomplete ({})",
                    failure.source_type, failure.message
                )));
            }
        }
        outcome
    }

    async fn apply(&mut self, outcome: DrawOutcome) -> Option<SearchOutcome> {
        match outcome {
            DrawOutcome::Unchanged => None,
            DrawOutcome::Containment(_) | DrawOutcome::Proximity => Some(self.refresh().await),
        }
    }

    pub async fn start_drawing(&mut self) -> Option<SearchOutcome> {
        let outcome = self.drawing.start_drawing();
        self.apply(outcome).await
    }

    /// Enter: close the current path if it has at least three vertices.
    pub async fn commit_drawing(&mut self) -> Option<SearchOutcome> {
        let pending = self.process_pending().await;
        let outcome = self.drawing.commit();
        self.apply(outcome).await.or(pending)
    }

    /// Commit `path` directly as the active polygon.
    pub async fn commit_path(&mut self, path: &[Coordinate]) -> Option<SearchOutcome> {
        let outcome = self.drawing.commit_path(path);
        self.apply(outcome).await
    }

    /// Escape: abandon an in-progress path.
    pub async fn cancel_drawing(&mut self) -> Option<SearchOutcome> {
        let outcome = self.drawing.cancel();
        self.apply(outcome).await
    }

    /// Remove the polygon and go back to proximity search.
    pub async fn clear_drawing(&mut self) -> Option<SearchOutcome> {
        let outcome = self.drawing.clear();
        self.apply(outcome).await
    }

    /// Apply every queued map input in arrival order. Returns the outcome of
    /// the last search triggered, if any.
    pub async fn process_pending(&mut self) -> Option<SearchOutcome> {
        let mut last = None;
        while let Ok(input) = self.inputs.try_recv() {
            let outcome = self.drawing.handle(input);
            if let Some(searched) = self.apply(outcome).await {
                last = Some(searched);
            }
        }
        last
    }

    pub async fn set_filters(&mut self, filters: SearchFilters) -> SearchOutcome {
        self.filters = filters;
        self.refresh().await
    }

    /// Change the proximity radius. Searches immediately in proximity mode;
    /// while a polygon is active the new radius is kept for later.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRadius`] for a non-positive radius.
    pub async fn set_radius(&mut self, radius_km: f64) -> Result<Option<SearchOutcome>, CoreError> {
        self.proximity = ProximitySpec::new(self.proximity.center, radius_km)?;
        Ok(self.refresh_proximity().await)
    }

    /// Move the proximity centre. Same search rule as [`Self::set_radius`].
    pub async fn set_center(&mut self, center: Coordinate) -> Option<SearchOutcome> {
        self.proximity.center = center;
        self.refresh_proximity().await
    }

    /// Move the centre to the device position. A failed lookup leaves the
    /// centre unchanged and raises an error notice with advice specific to
    /// the failure.
    pub async fn use_my_location<G: GeolocationProvider>(
        &mut self,
        provider: &G,
    ) -> Option<SearchOutcome> {
        match locate(provider, self.geolocation_timeout).await {
            Ok(position) => self.set_center(position).await,
            Err(e) => {
                self.notices.push(Notice::error(e.user_message()));
                None
            }
        }
    }

    async fn refresh_proximity(&mut self) -> Option<SearchOutcome> {
        if self.drawing.active_polygon().is_some() {
            return None;
        }
        Some(self.refresh().await)
    }

    /// Saved regions, with a warning notice when stored data had to be
    /// dropped.
    pub fn list_regions<K: KeyValueStore>(&mut self, store: &RegionStore<K>) -> Vec<Region> {
        let listing = store.list_checked();
        if let Some(damage) = listing.damage {
            self.notices.push(damage.notice());
        }
        listing.regions
    }

    /// Persist the polygon on the map under `name`.
    ///
    /// # Errors
    ///
    /// [`RegionError::NoActivePolygon`] when nothing has been committed, or
    /// any error from [`RegionStore::save`].
    pub fn save_region<K: KeyValueStore>(
        &mut self,
        store: &mut RegionStore<K>,
        name: &str,
    ) -> Result<Region, RegionError> {
        let polygon = self
            .drawing
            .active_polygon()
            .ok_or(RegionError::NoActivePolygon)?;
        if let Some(damage) = store.list_checked().damage {
            self.notices.push(damage.notice());
        }
        let region = store.save(name, polygon.vertices())?;
        self.notices
            .push(Notice::info(format!("saved region \"{}\"", region.name)));
        Ok(region)
    }

    /// Put a saved region on the map and search inside it.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::NotFound`] for an unknown id.
    pub async fn load_region<K: KeyValueStore>(
        &mut self,
        store: &RegionStore<K>,
        id: &str,
    ) -> Result<SearchOutcome, RegionError> {
        let region = self
            .list_regions(store)
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| RegionError::NotFound(id.to_string()))?;
        self.drawing.load_region(&region);
        Ok(self.refresh().await)
    }

    /// Create an alert for the polygon on the map with the current filters.
    ///
    /// # Errors
    ///
    /// [`AlertError::NoActivePolygon`] when nothing has been committed, or
    /// any error from [`AlertManager::create`].
    pub async fn alert_for_region<B: AlertBackend>(
        &self,
        alerts: &AlertManager<B>,
        name: &str,
    ) -> Result<AlertSubscription, AlertError> {
        let polygon = self
            .drawing
            .active_polygon()
            .ok_or(AlertError::NoActivePolygon)?
            .clone();
        let target = AlertTarget::Region {
            name: name.to_string(),
            polygon,
        };
        alerts.create(self.filters.clone(), target).await
    }

    /// Create an alert for the current centre and radius.
    ///
    /// # Errors
    ///
    /// Any error from [`AlertManager::create`].
    pub async fn alert_for_proximity<B: AlertBackend>(
        &self,
        alerts: &AlertManager<B>,
    ) -> Result<AlertSubscription, AlertError> {
        let target = AlertTarget::Proximity(self.proximity.clone());
        alerts.create(self.filters.clone(), target).await
    }

    /// Message the owner of every selected result and raise a notice with
    /// the outcome.
    pub async fn contact_selected<M: MessageSender>(
        &mut self,
        sender: &M,
        subject: &str,
        body: &str,
    ) -> BulkContactReport {
        let results = self.search.current();
        let items: Vec<&SearchResultItem> = results
            .as_deref()
            .map(|r| self.selection.selected_items(&r.items).collect())
            .unwrap_or_default();

        let report = bulk_contact(sender, &items, subject, body, self.contact_concurrency).await;
        let notice = if report.is_success() {
            Notice::info(report.summary())
        } else {
            Notice::warning(report.summary())
        };
        self.notices.push(notice);
        report
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
