//! Maneuver points from a recorded track.
//!
//! A GPX track has far more points than maneuvers. Douglas-Peucker over
//! the track keeps the points where its direction changes noticeably.
//! The track is first projected to local meters around its first point
//! so the tolerance is a distance, not an angle.

use geo::{Coord, LineString, SimplifyIdx};

use crate::geo::Coordinate;

const M_PER_DEG: f64 = 111_320.0;

/// Indices into `points` that survive simplification at `tolerance_m`.
/// Always contains the first and last index of a track with at least
/// two points.
pub fn maneuver_indices(points: &[Coordinate], tolerance_m: f64) -> Vec<usize> {
    if points.len() <= 2 {
        return (0..points.len()).collect();
    }

    let origin = points[0];
    let lon_scale = M_PER_DEG * origin.lat.to_radians().cos();

    let local: LineString<f64> = points
        .iter()
        .map(|p| Coord {
            x: (p.lon - origin.lon) * lon_scale,
            y: (p.lat - origin.lat) * M_PER_DEG,
        })
        .collect();

    local.simplify_idx(&tolerance_m)
}
