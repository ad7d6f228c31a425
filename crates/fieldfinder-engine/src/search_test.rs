use std::collections::BTreeMap;
use std::io;

use fieldfinder_core::SearchType;
use tokio::sync::{oneshot, Mutex as AsyncMutex};

use super::*;

fn c(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

fn candidate(id: &str, lat: f64, lng: f64) -> Candidate {
    Candidate {
        id: id.to_string(),
        title: format!("listing {id}"),
        league: None,
        age_group: None,
        latitude: Some(lat),
        longitude: Some(lng),
        contact_id: Some(format!("owner-{id}")),
        attributes: BTreeMap::new(),
    }
}

fn square() -> Polygon {
    Polygon::new(vec![c(51.49, -0.13), c(51.49, -0.11), c(51.51, -0.11), c(51.51, -0.13)]).unwrap()
}

fn proximity(radius_km: f64) -> SearchMode {
    SearchMode::Proximity(ProximitySpec::new(c(51.50, -0.12), radius_km).unwrap())
}

fn ids(items: &[SearchResultItem]) -> Vec<&str> {
    items.iter().map(|i| i.candidate.id.as_str()).collect()
}

#[derive(Default)]
struct FakeProvider {
    vacancies: Vec<Candidate>,
    availability: Vec<Candidate>,
    failing: Option<SourceType>,
}

impl CandidateProvider for FakeProvider {
    type Error = io::Error;

    async fn fetch_candidates(&self, source: SourceType) -> Result<Vec<Candidate>, io::Error> {
        if self.failing == Some(source) {
            return Err(io::Error::other("feed offline"));
        }
        Ok(match source {
            SourceType::Vacancy => self.vacancies.clone(),
            SourceType::Availability => self.availability.clone(),
        })
    }
}

#[test]
fn proximity_keeps_within_radius_sorted_by_distance() {
    let batches = vec![(
        SourceType::Vacancy,
        vec![
            candidate("far", 51.60, -0.12),
            candidate("near", 51.501, -0.12),
            candidate("mid", 51.52, -0.12),
        ],
    )];

    let items = evaluate(&proximity(5.0), &SearchFilters::default(), batches);

    assert_eq!(ids(&items), vec!["near", "mid"]);
    let distances: Vec<f64> = items.iter().map(|i| i.distance_km.unwrap()).collect();
    assert!(distances[0] < distances[1]);
    assert!(distances[1] <= 5.0);
}

#[test]
fn filters_and_missing_coordinates_exclude_candidates() {
    let mut u12 = candidate("u12", 51.50, -0.12);
    u12.age_group = Some("U12".to_string());
    let mut u14 = candidate("u14", 51.50, -0.12);
    u14.age_group = Some("U14".to_string());
    let mut nowhere = candidate("nowhere", 0.0, 0.0);
    nowhere.latitude = None;
    nowhere.age_group = Some("U12".to_string());
    let mut invalid = candidate("invalid", 95.0, 0.0);
    invalid.age_group = Some("U12".to_string());

    let filters = SearchFilters {
        age_group: "U12".to_string(),
        ..SearchFilters::default()
    };
    let items = evaluate(
        &proximity(50.0),
        &filters,
        vec![(SourceType::Vacancy, vec![u12, u14, nowhere, invalid])],
    );
    assert_eq!(ids(&items), vec!["u12"]);
}

#[test]
fn containment_keeps_inside_and_boundary_in_feed_order() {
    let batches = vec![
        (
            SourceType::Vacancy,
            vec![
                candidate("v-out", 52.00, -0.12),
                candidate("v-in", 51.50, -0.12),
                candidate("v-edge", 51.49, -0.12),
            ],
        ),
        (SourceType::Availability, vec![candidate("a-in", 51.505, -0.115)]),
    ];

    let items = evaluate(
        &SearchMode::Containment(square()),
        &SearchFilters::default(),
        batches,
    );

    assert_eq!(ids(&items), vec!["v-in", "v-edge", "a-in"]);
    assert!(items.iter().all(|i| i.distance_km.is_none()));
    assert_eq!(items[2].source_type, SourceType::Availability);
}

#[test]
fn result_key_is_source_type_and_id() {
    let items = evaluate(
        &SearchMode::Containment(square()),
        &SearchFilters::default(),
        vec![
            (SourceType::Vacancy, vec![candidate("x", 51.50, -0.12)]),
            (SourceType::Availability, vec![candidate("x", 51.50, -0.12)]),
        ],
    );
    assert_eq!(items.len(), 2);
    assert_ne!(items[0].key(), items[1].key());
    assert_eq!(items[0].key().to_string(), "vacancy:x");
}

#[tokio::test]
async fn run_queries_only_enabled_sources() {
    let controller = SearchController::new(FakeProvider {
        vacancies: vec![candidate("v", 51.50, -0.12)],
        availability: vec![candidate("a", 51.50, -0.12)],
        failing: None,
    });
    let request = SearchRequest {
        mode: proximity(1.0),
        filters: SearchFilters {
            search_type: SearchType::Availability,
            ..SearchFilters::default()
        },
    };

    let SearchOutcome::Applied(results) = controller.run(&request).await else {
        panic!("single search must be applied");
    };
    assert_eq!(ids(&results.items), vec!["a"]);
    assert_eq!(results.ticket, 1);
    assert_eq!(controller.current().map(|r| r.ticket), Some(1));
}

#[tokio::test]
async fn failing_source_degrades_without_blocking_the_other() {
    let controller = SearchController::new(FakeProvider {
        vacancies: vec![candidate("v", 51.50, -0.12)],
        availability: vec![candidate("a", 51.50, -0.12)],
        failing: Some(SourceType::Vacancy),
    });
    let request = SearchRequest {
        mode: proximity(1.0),
        filters: SearchFilters::default(),
    };

    let SearchOutcome::Applied(results) = controller.run(&request).await else {
        panic!("single search must be applied");
    };
    assert_eq!(ids(&results.items), vec!["a"]);
    assert_eq!(results.degraded.len(), 1);
    assert_eq!(results.degraded[0].source_type, SourceType::Vacancy);
    assert!(results.degraded[0].message.contains("feed offline"));
}

/// Hands out one scripted response per call, in call order. A response may
/// be held back until its gate is released.
struct ScriptedProvider {
    script: AsyncMutex<Vec<(Option<oneshot::Receiver<()>>, Vec<Candidate>)>>,
}

impl CandidateProvider for ScriptedProvider {
    type Error = io::Error;

    async fn fetch_candidates(&self, _source: SourceType) -> Result<Vec<Candidate>, io::Error> {
        let (gate, candidates) = self.script.lock().await.remove(0);
        if let Some(gate) = gate {
            gate.await.map_err(|_| io::Error::other("gate dropped"))?;
        }
        Ok(candidates)
    }
}

#[tokio::test]
async fn slower_older_request_never_overwrites_newer_one() {
    let (release, gate) = oneshot::channel();
    let controller = SearchController::new(ScriptedProvider {
        script: AsyncMutex::new(vec![
            (Some(gate), vec![candidate("old", 51.50, -0.12)]),
            (None, vec![candidate("new", 51.50, -0.12)]),
        ]),
    });
    let request = SearchRequest {
        mode: proximity(1.0),
        filters: SearchFilters {
            search_type: SearchType::Vacancies,
            ..SearchFilters::default()
        },
    };

    let first = controller.run(&request);
    let second = async {
        let outcome = controller.run(&request).await;
        release.send(()).unwrap();
        outcome
    };
    let (first, second) = tokio::join!(first, second);

    assert!(matches!(first, SearchOutcome::Superseded { ticket: 1 }));
    assert!(matches!(second, SearchOutcome::Applied(ref r) if r.ticket == 2));
    let current = controller.current().unwrap();
    assert_eq!(ids(&current.items), vec!["new"]);
    assert_eq!(controller.latest_ticket(), 2);
}
