//! Route progress: where on the route line the user is.
//!
//! Each update scans the whole polyline for the nearest vertex, so a real
//! U-turn is picked up, then projects the fix onto the two segments that
//! meet at that vertex. While one step stays active a small backward
//! move of the nearest vertex is held, which keeps the drawn remaining
//! route from retreating on GPS jitter. A fix that no longer snaps near
//! the held vertex but does snap elsewhere on the route is a real
//! reversal and is followed.

use serde::Serialize;

use crate::geo::{distance_meters, project_onto_segment, squared_planar_distance, track_length, Coordinate};
use crate::state::TrackingState;

/// Result of snapping one fix onto the route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    /// Polyline vertex nearest the fix.
    pub closest_index: usize,
    /// Far endpoint of the segment the fix was projected onto.
    pub next_index: usize,
    /// Nearest point on the route.
    pub snapped: Coordinate,
    /// Distance from the fix to `snapped` in meters.
    pub distance_m: f64,
    /// Whether `distance_m` is within the snap tolerance.
    pub on_route: bool,
}

impl Progress {
    /// Position to draw: the snapped point on route, the raw fix otherwise.
    pub fn display_position(&self, raw: &Coordinate) -> Coordinate {
        if self.on_route {
            self.snapped
        } else {
            *raw
        }
    }

    /// Route still ahead: the snap point followed by every vertex after
    /// the snapped segment.
    pub fn remaining_route(&self, coords: &[Coordinate]) -> Vec<Coordinate> {
        let tail = coords.get(self.next_index..).unwrap_or(&[]);
        let mut remaining = Vec::with_capacity(tail.len() + 1);
        remaining.push(self.snapped);
        remaining.extend(tail.iter().skip_while(|c| **c == self.snapped));
        remaining
    }

    pub fn remaining_distance_m(&self, coords: &[Coordinate]) -> f64 {
        match coords.get(self.next_index) {
            Some(next) => distance_meters(&self.snapped, next) + track_length(&coords[self.next_index..]),
            None => 0.0,
        }
    }
}

/// Index of the polyline vertex nearest `p`.
pub fn closest_vertex(coords: &[Coordinate], p: &Coordinate) -> Option<usize> {
    coords
        .iter()
        .enumerate()
        .map(|(i, c)| (i, squared_planar_distance(p, c)))
        .filter(|(_, d)| !d.is_nan())
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Snap `p` onto one of the two segments adjacent to vertex `index`,
/// whichever projects nearer.
pub fn snap_at(coords: &[Coordinate], p: &Coordinate, index: usize, tolerance_m: f64) -> Option<Progress> {
    if coords.len() < 2 || index >= coords.len() {
        return None;
    }

    let mut best: Option<(Coordinate, usize, f64)> = None;

    // Forward segment first so a fix sitting exactly on a vertex counts
    // that vertex as passed
    let candidates = [
        (index + 1 < coords.len()).then(|| (index, index + 1)),
        (index > 0).then(|| (index - 1, index)),
    ];

    for (start, end) in candidates.into_iter().flatten() {
        let projected = project_onto_segment(p, &coords[start], &coords[end]);
        let dist = distance_meters(p, &projected);

        let is_better = match best {
            Some((_, _, prev)) => dist < prev,
            None => true,
        };
        if is_better {
            best = Some((projected, end, dist));
        }
    }

    best.map(|(snapped, next_index, distance_m)| Progress {
        closest_index: index,
        next_index,
        snapped,
        distance_m,
        on_route: distance_m <= tolerance_m,
    })
}

/// Snap `p` onto the route with a full nearest-vertex scan.
pub fn snap_to_route(coords: &[Coordinate], p: &Coordinate, tolerance_m: f64) -> Option<Progress> {
    let index = closest_vertex(coords, p)?;
    snap_at(coords, p, index, tolerance_m)
}

/// Snap a fix and record the nearest vertex in the session state.
///
/// A nearest vertex behind the recorded one is held as long as the fix
/// still snaps at the recorded vertex.
pub fn track(
    state: &mut TrackingState,
    coords: &[Coordinate],
    p: &Coordinate,
    tolerance_m: f64,
) -> Option<Progress> {
    let fresh = snap_to_route(coords, p, tolerance_m)?;

    let progress = match state.closest_polyline_index {
        Some(floor) if fresh.closest_index < floor => match snap_at(coords, p, floor, tolerance_m) {
            Some(held) if held.on_route || !fresh.on_route => {
                log::debug!("Nearest vertex {} behind {floor}, holding", fresh.closest_index);
                held
            }
            _ => {
                log::info!("Moving backward along the route, vertex {floor} -> {}", fresh.closest_index);
                fresh
            }
        },
        _ => fresh,
    };

    state.closest_polyline_index = Some(progress.closest_index);
    Some(progress)
}
