//! Geo math.
//!
//! Pure functions over WGS84 coordinates (lat/lon in degrees): distances,
//! bearings and nearest-point projection. Everything here returns a
//! defined number for degenerate input so callers can compare results
//! against thresholds without NaN checks.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

// geo types are (x, y) = (lon, lat)
impl From<Coordinate> for ::geo::Coord<f64> {
    fn from(c: Coordinate) -> Self {
        ::geo::Coord { x: c.lon, y: c.lat }
    }
}

impl From<::geo::Coord<f64>> for Coordinate {
    fn from(c: ::geo::Coord<f64>) -> Self {
        Coordinate { lat: c.y, lon: c.x }
    }
}

/// Earth radius in meters (WGS84 mean).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Haversine distance between two coordinates in meters.
pub fn distance_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    // Rounding can push h a hair above 1 for antipodal points
    2.0 * EARTH_RADIUS_M * h.min(1.0).sqrt().asin()
}

/// Initial bearing from `a` toward `b` in degrees [0, 360).
///
/// Identical points have no direction; 0 is returned.
pub fn bearing_degrees(a: &Coordinate, b: &Coordinate) -> f64 {
    if a == b {
        return 0.0;
    }

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

/// Wrap any angle into [0, 360).
pub fn normalize_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Nearest point to `p` on the segment `v`-`w`, clamped to the segment.
///
/// Uses a planar approximation scaled by latitude cosine, which is
/// accurate enough for road-scale segments (< 10 km). A zero-length
/// segment returns `v`.
pub fn project_onto_segment(p: &Coordinate, v: &Coordinate, w: &Coordinate) -> Coordinate {
    let cos_lat = ((v.lat + w.lat) / 2.0).to_radians().cos();

    let dx = (w.lon - v.lon) * cos_lat;
    let dy = w.lat - v.lat;
    let px = (p.lon - v.lon) * cos_lat;
    let py = p.lat - v.lat;

    let seg_len_sq = dx * dx + dy * dy;

    if !(seg_len_sq >= 1e-20) {
        return *v;
    }

    let t = (px * dx + py * dy) / seg_len_sq;
    if t.is_nan() || t <= 0.0 {
        return *v;
    }
    if t >= 1.0 {
        return *w;
    }

    Coordinate {
        lat: v.lat + t * (w.lat - v.lat),
        lon: v.lon + t * (w.lon - v.lon),
    }
}

/// Squared lat/lon difference. Only meaningful for ranking nearby points
/// against each other, never as an absolute distance.
pub fn squared_planar_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let dlat = a.lat - b.lat;
    let dlon = a.lon - b.lon;
    dlat * dlat + dlon * dlon
}

/// Total length of a polyline in meters.
pub fn track_length(points: &[Coordinate]) -> f64 {
    points
        .windows(2)
        .map(|w| distance_meters(&w[0], &w[1]))
        .sum()
}

/// Shortest distance in meters from `p` to any segment of a polyline.
///
/// A single-point polyline degenerates to the distance to that point;
/// an empty one returns None.
pub fn distance_to_polyline(p: &Coordinate, points: &[Coordinate]) -> Option<f64> {
    match points {
        [] => None,
        [only] => Some(distance_meters(p, only)),
        _ => points
            .windows(2)
            .map(|w| distance_meters(p, &project_onto_segment(p, &w[0], &w[1])))
            .reduce(f64::min),
    }
}
