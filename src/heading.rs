//! Display heading for map orientation. Advisory only; nothing else in
//! the engine reads it.

use crate::geo::{bearing_degrees, distance_meters, normalize_degrees, Coordinate};
use crate::route::LiveFix;

/// Below this separation a bearing is mostly GPS noise.
const MIN_BEARING_DISTANCE_M: f64 = 1.0;

/// Heading to present for `fix`.
///
/// Prefers the device heading. Otherwise looks `look_ahead` vertices past
/// `snap_index` and returns the bearing toward that point; the vertex
/// right after the snap point is too close and jitters at low speed.
/// Near the end of the route, where the look-ahead point coincides with
/// the position, the bearing of the final segment is used.
pub fn display_heading(
    fix: &LiveFix,
    coords: &[Coordinate],
    snap_index: Option<usize>,
    look_ahead: usize,
) -> Option<f64> {
    if let Some(heading) = fix.heading_deg.filter(|h| h.is_finite()) {
        return Some(normalize_degrees(heading));
    }

    let last = coords.len().checked_sub(1)?;
    let index = snap_index?;
    let target = &coords[index.saturating_add(look_ahead.max(1)).min(last)];

    if distance_meters(&fix.position, target) >= MIN_BEARING_DISTANCE_M {
        return Some(bearing_degrees(&fix.position, target));
    }

    match coords {
        [.., a, b] if distance_meters(a, b) >= MIN_BEARING_DISTANCE_M => Some(bearing_degrees(a, b)),
        _ => None,
    }
}
