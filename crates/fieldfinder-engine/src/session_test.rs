use std::collections::BTreeMap;
use std::io;

use fieldfinder_core::{Candidate, SourceType};

use super::*;
use crate::geolocation::{FixedPosition, GeolocationError};
use crate::kv::MemoryStore;
use crate::notice::NoticeLevel;
use crate::regions::REGIONS_KEY;
use crate::surface::{ListenerKind, MemorySurface};

fn c(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

fn candidate(id: &str, lat: f64, lng: f64) -> Candidate {
    Candidate {
        id: id.to_string(),
        title: id.to_string(),
        league: None,
        age_group: None,
        latitude: Some(lat),
        longitude: Some(lng),
        contact_id: Some(format!("owner-{id}")),
        attributes: BTreeMap::new(),
    }
}

struct Listings {
    vacancies: Vec<Candidate>,
    availability_offline: bool,
}

impl CandidateProvider for Listings {
    type Error = io::Error;

    async fn fetch_candidates(&self, source: SourceType) -> Result<Vec<Candidate>, io::Error> {
        match source {
            SourceType::Vacancy => Ok(self.vacancies.clone()),
            SourceType::Availability if self.availability_offline => {
                Err(io::Error::other("availability feed offline"))
            }
            SourceType::Availability => Ok(Vec::new()),
        }
    }
}

fn session() -> SearchSession<MemorySurface, Listings> {
    let listings = Listings {
        vacancies: vec![
            candidate("centre", 51.50, -0.12),
            candidate("north", 52.00, -0.12),
            candidate("nearby", 51.52, -0.12),
        ],
        availability_offline: false,
    };
    let start = ProximitySpec::new(c(51.50, -0.12), 5.0).unwrap();
    SearchSession::new(MemorySurface::new(), listings, start)
}

fn applied_ids(outcome: Option<SearchOutcome>) -> Vec<String> {
    match outcome {
        Some(SearchOutcome::Applied(results)) => results
            .items
            .iter()
            .map(|i| i.candidate.id.clone())
            .collect(),
        other => panic!("expected applied search, got {other:?}"),
    }
}

const SQUARE: [(f64, f64); 4] = [(51.49, -0.13), (51.49, -0.11), (51.51, -0.11), (51.51, -0.13)];

async fn draw_square(session: &mut SearchSession<MemorySurface, Listings>) -> Option<SearchOutcome> {
    session.start_drawing().await;
    for (lat, lng) in SQUARE {
        session.surface().click(c(lat, lng));
    }
    session.commit_drawing().await
}

#[tokio::test]
async fn proximity_is_the_initial_mode() {
    let mut session = session();
    assert!(matches!(session.mode(), SearchMode::Proximity(_)));
    let ids = applied_ids(Some(session.refresh().await));
    assert_eq!(ids, vec!["centre", "nearby"]);
}

#[tokio::test]
async fn committing_a_drawn_polygon_switches_to_containment() {
    let mut session = session();
    let ids = applied_ids(draw_square(&mut session).await);

    assert_eq!(ids, vec!["centre"]);
    assert!(matches!(session.mode(), SearchMode::Containment(_)));
    assert_eq!(session.phase(), DrawPhase::Editing);
}

#[tokio::test]
async fn commit_reports_search_run_by_queued_double_click() {
    let mut session = session();
    session.start_drawing().await;
    let triangle = [c(51.48, -0.14), c(51.48, -0.10), c(51.53, -0.12)];
    for vertex in triangle {
        session.surface().click(vertex);
    }
    session.surface().double_click(triangle[2]);

    let ids = applied_ids(session.commit_drawing().await);
    assert_eq!(ids, vec!["centre", "nearby"]);
    assert_eq!(session.phase(), DrawPhase::Editing);
}

#[tokio::test]
async fn clearing_the_polygon_returns_to_proximity() {
    let mut session = session();
    draw_square(&mut session).await;

    let ids = applied_ids(session.clear_drawing().await);
    assert_eq!(ids, vec!["centre", "nearby"]);
    assert!(matches!(session.mode(), SearchMode::Proximity(_)));
    assert_eq!(session.surface().overlay_count(), 0);
}

#[tokio::test]
async fn editing_the_polygon_reruns_containment() {
    let mut session = session();
    draw_square(&mut session).await;
    let overlay = session.drawing().active_overlay().unwrap();

    // Stretch the square north far enough to take in "nearby".
    let stretched = vec![c(51.49, -0.13), c(51.49, -0.11), c(51.53, -0.11), c(51.53, -0.13)];
    session
        .surface_mut()
        .edit_shape(overlay, crate::surface::ShapeEventKind::VertexMoved, stretched);

    let ids = applied_ids(session.process_pending().await);
    assert_eq!(ids, vec!["centre", "nearby"]);
}

#[tokio::test]
async fn any_new_search_clears_the_selection() {
    let mut session = session();
    session.refresh().await;
    session.select_all();
    assert_eq!(session.selection().len(), 2);

    let filters = SearchFilters {
        league: String::new(),
        ..session.filters().clone()
    };
    session.set_filters(filters).await;
    assert!(session.selection().is_empty());

    session.select_all();
    session.set_center(c(51.501, -0.12)).await;
    assert!(session.selection().is_empty());

    session.select_all();
    draw_square(&mut session).await;
    assert!(session.selection().is_empty());
}

#[tokio::test]
async fn radius_change_waits_while_a_polygon_is_active() {
    let mut session = session();
    draw_square(&mut session).await;

    assert!(session.set_radius(60.0).await.unwrap().is_none());
    assert!((session.proximity().radius_km - 60.0).abs() < f64::EPSILON);

    let ids = applied_ids(session.clear_drawing().await);
    assert_eq!(ids, vec!["centre", "nearby", "north"]);
}

#[tokio::test]
async fn invalid_radius_is_rejected() {
    let mut session = session();
    assert!(matches!(
        session.set_radius(-1.0).await,
        Err(CoreError::InvalidRadius(_))
    ));
    assert!((session.proximity().radius_km - 5.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn offline_feed_raises_a_warning_notice() {
    let listings = Listings {
        vacancies: vec![candidate("centre", 51.50, -0.12)],
        availability_offline: true,
    };
    let start = ProximitySpec::new(c(51.50, -0.12), 5.0).unwrap();
    let mut session = SearchSession::new(MemorySurface::new(), listings, start);

    let ids = applied_ids(Some(session.refresh().await));
    assert_eq!(ids, vec!["centre"]);

    let notices = session.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert!(notices[0].message.contains("availability"));
    assert!(session.notices().is_empty());
}

#[tokio::test]
async fn use_my_location_moves_centre_or_explains_failure() {
    let mut session = session();

    let ids = applied_ids(
        session
            .use_my_location(&FixedPosition(Ok(c(52.00, -0.12))))
            .await,
    );
    assert_eq!(ids, vec!["north"]);
    assert_eq!(session.proximity().center, c(52.00, -0.12));

    let denied = session
        .use_my_location(&FixedPosition(Err(GeolocationError::PermissionDenied)))
        .await;
    assert!(denied.is_none());
    assert_eq!(session.proximity().center, c(52.00, -0.12));
    let notices = session.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(
        notices[0].message,
        GeolocationError::PermissionDenied.user_message()
    );
}

#[tokio::test]
async fn save_requires_a_committed_polygon() {
    let mut session = session();
    let mut store = RegionStore::new(MemoryStore::new());

    session.start_drawing().await;
    session.surface().click(c(51.49, -0.13));
    session.process_pending().await;
    assert!(matches!(
        session.save_region(&mut store, "Too early"),
        Err(RegionError::NoActivePolygon)
    ));
    assert!(store.list().is_empty());
}

#[tokio::test]
async fn saved_region_can_be_reloaded_after_clearing() {
    let mut session = session();
    let mut store = RegionStore::new(MemoryStore::new());
    draw_square(&mut session).await;

    let region = session.save_region(&mut store, "Test Square").unwrap();
    session.clear_drawing().await;
    assert!(session.active_polygon().is_none());

    let outcome = session.load_region(&store, &region.id).await.unwrap();
    assert_eq!(applied_ids(Some(outcome)), vec!["centre"]);
    assert_eq!(session.active_polygon(), Some(&region.coordinates));
    assert_eq!(session.surface().viewport(), Some(region.coordinates.bounds()));
    assert_eq!(session.surface().listener_count(ListenerKind::Shape), 3);
}

#[tokio::test]
async fn loading_unknown_region_fails() {
    let mut session = session();
    let store = RegionStore::new(MemoryStore::new());
    assert!(matches!(
        session.load_region(&store, "nope").await,
        Err(RegionError::NotFound(_))
    ));
}

#[tokio::test]
async fn corrupt_region_storage_raises_a_warning_notice() {
    let mut session = session();
    let mut kv = MemoryStore::new();
    kv.set(REGIONS_KEY, "[{\"id\": 1").unwrap();
    let mut store = RegionStore::new(kv);

    assert!(session.list_regions(&store).is_empty());
    let notices = session.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert!(notices[0].message.contains("could not be read"));

    draw_square(&mut session).await;
    session.take_notices();
    let region = session.save_region(&mut store, "Test Square").unwrap();
    let levels: Vec<_> = session.take_notices().iter().map(|n| n.level).collect();
    assert_eq!(levels, vec![NoticeLevel::Warning, NoticeLevel::Info]);

    assert_eq!(session.list_regions(&store).len(), 1);
    assert!(session.take_notices().is_empty());
    assert!(session.load_region(&store, &region.id).await.is_ok());
}
