//! Spherical distance and planar containment helpers.
//!
//! Validated serde wrappers over the `geo` crate. Distances use the haversine
//! formula over the mean Earth radius. Containment treats latitude/longitude
//! as planar `y`/`x`, which is accurate for hand-drawn regions a few tens of
//! kilometres across. Polygons crossing the antimeridian are not supported.
//!
//! Boundary policy: a point lying exactly on a polygon edge or vertex is
//! INSIDE.

use geo::{Distance, Haversine, Intersects, LineString, Point};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Mean Earth radius in kilometres, as used by [`geo::Haversine`].
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A validated WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoreError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.lat, raw.lng)
    }
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] when `lat` is outside
    /// `[-90, 90]` or `lng` is outside `[-180, 180]`.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoreError> {
        if !lat.is_finite() || !lng.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoreError::InvalidCoordinate { lat, lng });
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoreError::InvalidCoordinate { lat, lng });
        }
        Ok(Self { lat, lng })
    }

    #[must_use]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    #[must_use]
    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Great-circle distance to `other` in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine_km(self, other)
    }
}

impl From<Coordinate> for geo::Coord<f64> {
    fn from(c: Coordinate) -> Self {
        geo::Coord { x: c.lng, y: c.lat }
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Self {
        Point::new(c.lng, c.lat)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

impl std::str::FromStr for Coordinate {
    type Err = CoreError;

    /// Parses `"lat,lng"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CoreError::MalformedCoordinate(s.to_string());
        let (lat, lng) = s.split_once(',').ok_or_else(malformed)?;
        let lat = lat.trim().parse::<f64>().map_err(|_| malformed())?;
        let lng = lng.trim().parse::<f64>().map_err(|_| malformed())?;
        Coordinate::new(lat, lng)
    }
}

/// Great-circle distance between two coordinates in kilometres.
#[must_use]
pub fn haversine_km(a: &Coordinate, b: &Coordinate) -> f64 {
    Haversine.distance(Point::from(*a), Point::from(*b)) / 1000.0
}

/// A closed ring of at least three distinct vertices. The closing edge from
/// the last vertex back to the first is implicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coordinate>", into = "Vec<Coordinate>")]
pub struct Polygon {
    vertices: Vec<Coordinate>,
    shape: geo::Polygon<f64>,
}

impl TryFrom<Vec<Coordinate>> for Polygon {
    type Error = CoreError;

    fn try_from(vertices: Vec<Coordinate>) -> Result<Self, Self::Error> {
        Polygon::new(vertices)
    }
}

impl From<Polygon> for Vec<Coordinate> {
    fn from(polygon: Polygon) -> Self {
        polygon.vertices
    }
}

impl Polygon {
    /// Minimum number of distinct vertices for a closed ring.
    pub const MIN_VERTICES: usize = 3;

    /// Build a ring from `vertices`. Consecutive repeats, and a closing
    /// vertex equal to the first, are dropped before counting.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TooFewVertices`] for fewer than three distinct
    /// vertices.
    pub fn new(vertices: Vec<Coordinate>) -> Result<Self, CoreError> {
        let vertices = collapse_repeats(vertices);
        if vertices.len() < Self::MIN_VERTICES {
            return Err(CoreError::TooFewVertices(vertices.len()));
        }
        let shape = to_geo_polygon(&vertices);
        Ok(Self { vertices, shape })
    }

    #[must_use]
    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[must_use]
    pub fn contains(&self, point: &Coordinate) -> bool {
        self.shape.intersects(&Point::from(*point))
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        // A validated polygon is never empty.
        Bounds::enclosing(&self.vertices).unwrap_or(Bounds {
            south: 0.0,
            west: 0.0,
            north: 0.0,
            east: 0.0,
        })
    }
}

/// Point-in-polygon, boundary inclusive.
///
/// Returns `false` for rings with fewer than three vertices.
#[must_use]
pub fn point_in_polygon(point: &Coordinate, ring: &[Coordinate]) -> bool {
    if ring.len() < Polygon::MIN_VERTICES {
        return false;
    }
    to_geo_polygon(ring).intersects(&Point::from(*point))
}

fn to_geo_polygon(ring: &[Coordinate]) -> geo::Polygon<f64> {
    let exterior: LineString<f64> = ring.iter().copied().map(geo::Coord::from).collect();
    geo::Polygon::new(exterior, Vec::new())
}

fn collapse_repeats(mut vertices: Vec<Coordinate>) -> Vec<Coordinate> {
    vertices.dedup();
    while vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    vertices
}

/// Axis-aligned viewport bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    /// Smallest bounds enclosing every point, or `None` for an empty slice.
    #[must_use]
    pub fn enclosing(points: &[Coordinate]) -> Option<Self> {
        let first = points.first()?;
        let seed = Bounds {
            south: first.lat,
            west: first.lng,
            north: first.lat,
            east: first.lng,
        };
        Some(points.iter().skip(1).fold(seed, |b, p| Bounds {
            south: b.south.min(p.lat),
            west: b.west.min(p.lng),
            north: b.north.max(p.lat),
            east: b.east.max(p.lng),
        }))
    }

    #[must_use]
    pub fn contains(&self, point: &Coordinate) -> bool {
        (self.south..=self.north).contains(&point.lat) && (self.west..=self.east).contains(&point.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    fn square() -> Polygon {
        Polygon::new(vec![c(0.0, 0.0), c(0.0, 10.0), c(10.0, 10.0), c(10.0, 0.0)]).unwrap()
    }

    /// Plain even-odd ray cast, used as the oracle for strictly interior and
    /// exterior points.
    fn reference_ray_cast(point: &Coordinate, ring: &[Coordinate]) -> bool {
        let mut inside = false;
        let n = ring.len();
        for i in 0..n {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            if (a.lat > point.lat) != (b.lat > point.lat) {
                let x = a.lng + (point.lat - a.lat) * (b.lng - a.lng) / (b.lat - a.lat);
                if point.lng < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    #[test]
    fn coordinate_rejects_out_of_range() {
        assert!(Coordinate::new(90.1, 0.0).is_err());
        assert!(Coordinate::new(-90.1, 0.0).is_err());
        assert!(Coordinate::new(0.0, 180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(90.0, -180.0).is_ok());
    }

    #[test]
    fn coordinate_parses_lat_lng_pair() {
        let parsed: Coordinate = "51.5, -0.12".parse().unwrap();
        assert!((parsed.lat() - 51.5).abs() < f64::EPSILON);
        assert!((parsed.lng() + 0.12).abs() < f64::EPSILON);
        assert!("51.5".parse::<Coordinate>().is_err());
        assert!("abc,1".parse::<Coordinate>().is_err());
    }

    #[test]
    fn coordinate_deserialize_validates_range() {
        let bad = serde_json::from_str::<Coordinate>(r#"{"lat": 95.0, "lng": 0.0}"#);
        assert!(bad.is_err());
        let good = serde_json::from_str::<Coordinate>(r#"{"lat": 51.5, "lng": -0.12}"#).unwrap();
        assert_eq!(good, c(51.5, -0.12));
    }

    #[test]
    fn distance_to_self_is_zero() {
        let a = c(51.5074, -0.1278);
        assert!(haversine_km(&a, &a).abs() < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = c(51.5074, -0.1278);
        let b = c(53.4808, -2.2426);
        assert!((haversine_km(&a, &b) - haversine_km(&b, &a)).abs() < 1e-9);
    }

    #[test]
    fn distance_london_to_manchester_is_about_262_km() {
        let london = c(51.5074, -0.1278);
        let manchester = c(53.4808, -2.2426);
        let d = haversine_km(&london, &manchester);
        assert!((d - 262.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn distance_satisfies_triangle_inequality() {
        let points = [
            c(51.5074, -0.1278),
            c(53.4808, -2.2426),
            c(55.9533, -3.1883),
            c(-33.8688, 151.2093),
            c(40.7128, -74.0060),
        ];
        for a in &points {
            for b in &points {
                for m in &points {
                    let direct = haversine_km(a, b);
                    let via = haversine_km(a, m) + haversine_km(m, b);
                    assert!(direct <= via + 1e-6, "{a} -> {b} via {m}");
                }
            }
        }
    }

    #[test]
    fn antipodal_distance_is_half_circumference() {
        let d = haversine_km(&c(0.0, 0.0), &c(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-3, "got {d}");
    }

    #[test]
    fn polygon_requires_three_vertices() {
        let err = Polygon::new(vec![c(0.0, 0.0), c(1.0, 1.0)]).unwrap_err();
        assert!(matches!(err, CoreError::TooFewVertices(2)));
    }

    #[test]
    fn polygon_counts_only_distinct_vertices() {
        let a = c(0.0, 0.0);
        let b = c(0.0, 1.0);
        let err = Polygon::new(vec![a, a, b]).unwrap_err();
        assert!(matches!(err, CoreError::TooFewVertices(2)));

        let closed = Polygon::new(vec![a, b, b, c(1.0, 1.0), a]).unwrap();
        assert_eq!(closed.vertices(), &[a, b, c(1.0, 1.0)]);
    }

    #[test]
    fn free_function_agrees_with_polygon() {
        let poly = square();
        assert!(point_in_polygon(&c(5.0, 5.0), poly.vertices()));
        assert!(point_in_polygon(&c(0.0, 5.0), poly.vertices()));
        assert!(!point_in_polygon(&c(11.0, 5.0), poly.vertices()));
        assert!(!point_in_polygon(&c(0.0, 0.0), &[c(0.0, 0.0), c(1.0, 1.0)]));
    }

    #[test]
    fn containment_matches_reference_on_grid() {
        let poly = square();
        // Half-degree grid from -2 to 12; skip points on the boundary lines,
        // which the reference ray cast does not handle consistently.
        for i in -4..=24 {
            for j in -4..=24 {
                let lat = f64::from(i) * 0.5;
                let lng = f64::from(j) * 0.5;
                let on_boundary = ((lat == 0.0 || lat == 10.0) && (0.0..=10.0).contains(&lng))
                    || ((lng == 0.0 || lng == 10.0) && (0.0..=10.0).contains(&lat));
                if on_boundary {
                    continue;
                }
                let p = c(lat, lng);
                assert_eq!(
                    poly.contains(&p),
                    reference_ray_cast(&p, poly.vertices()),
                    "mismatch at {p}"
                );
            }
        }
    }

    #[test]
    fn containment_counts_vertices_as_inside() {
        let poly = square();
        for v in poly.vertices() {
            assert!(poly.contains(v), "vertex {v} should be inside");
        }
    }

    #[test]
    fn containment_counts_edges_as_inside() {
        let poly = square();
        assert!(poly.contains(&c(0.0, 5.0)));
        assert!(poly.contains(&c(10.0, 5.0)));
        assert!(poly.contains(&c(5.0, 0.0)));
        assert!(poly.contains(&c(5.0, 10.0)));
        assert!(!poly.contains(&c(10.000_001, 5.0)));
    }

    #[test]
    fn containment_handles_concave_polygon() {
        // U shape opening north.
        let u = Polygon::new(vec![
            c(0.0, 0.0),
            c(0.0, 3.0),
            c(3.0, 3.0),
            c(3.0, 2.0),
            c(1.0, 2.0),
            c(1.0, 1.0),
            c(3.0, 1.0),
            c(3.0, 0.0),
        ])
        .unwrap();
        assert!(u.contains(&c(0.5, 1.5)));
        assert!(u.contains(&c(2.5, 0.5)));
        assert!(!u.contains(&c(2.0, 1.5)), "notch of the U is outside");
    }

    #[test]
    fn bounds_enclose_all_vertices() {
        let poly = square();
        let b = poly.bounds();
        assert!((b.south - 0.0).abs() < f64::EPSILON);
        assert!((b.north - 10.0).abs() < f64::EPSILON);
        assert!((b.west - 0.0).abs() < f64::EPSILON);
        assert!((b.east - 10.0).abs() < f64::EPSILON);
        assert!(poly.vertices().iter().all(|v| b.contains(v)));
        assert!(Bounds::enclosing(&[]).is_none());
    }

    #[test]
    fn polygon_serializes_as_plain_array() {
        let poly = Polygon::new(vec![c(51.49, -0.13), c(51.49, -0.11), c(51.51, -0.11)]).unwrap();
        let json = serde_json::to_string(&poly).unwrap();
        assert!(json.starts_with("[{"), "got {json}");
        let back: Polygon = serde_json::from_str(&json).unwrap();
        assert_eq!(back, poly);
        assert!(serde_json::from_str::<Polygon>(r#"[{"lat":1.0,"lng":1.0}]"#).is_err());
    }
}
