//! GPX 1.1 import.
//!
//! Wraps the `gpx` crate to turn a GPX file into a navigable `Route`
//! (for planned routes shared as files) or into a sequence of `LiveFix`
//! samples for replaying a recorded drive through a session.

use crate::error::{NavError, Result};
use crate::geo::{bearing_degrees, distance_meters, track_length, Coordinate};
use crate::geometry;
use crate::route::{LiveFix, Maneuver, Route, RouteStep};
use crate::simplify::maneuver_indices;
use crate::turns::{depart_instruction, instruction, turn_at};

/// Tolerance used when deriving maneuver points from a recorded track.
const MANEUVER_TOLERANCE_M: f64 = 25.0;

fn read(data: &[u8]) -> Result<gpx::Gpx> {
    gpx::read(data).map_err(|e| NavError::Gpx {
        message: e.to_string(),
    })
}

fn to_coordinate(wp: &gpx::Waypoint) -> Coordinate {
    Coordinate {
        lat: wp.point().y(),
        lon: wp.point().x(),
    }
}

/// Points of the first track, all segments flattened.
fn first_track(gpx: &gpx::Gpx) -> Vec<Coordinate> {
    gpx.tracks
        .first()
        .map(|t| {
            t.segments
                .iter()
                .flat_map(|seg| seg.points.iter())
                .map(to_coordinate)
                .collect()
        })
        .unwrap_or_default()
}

/// Build a route from GPX data.
///
/// Maneuver points come from the first `<rte>`, whose point names become
/// road names in the instructions. Without a usable route the first
/// track is simplified into maneuver points. The polyline is the first
/// track when present, the route points otherwise.
pub fn parse_route(data: &[u8]) -> Result<Route> {
    let gpx = read(data)?;
    let track = first_track(&gpx);

    let named: Vec<(Coordinate, Option<String>)> = gpx
        .routes
        .first()
        .map(|r| {
            r.points
                .iter()
                .map(|wp| (to_coordinate(wp), wp.name.clone()))
                .collect()
        })
        .unwrap_or_default();

    let maneuver_points = if named.len() >= 2 {
        named
    } else {
        maneuver_indices(&track, MANEUVER_TOLERANCE_M)
            .into_iter()
            .map(|i| (track[i], None))
            .collect()
    };

    let coordinates = if track.len() >= 2 {
        track
    } else {
        maneuver_points.iter().map(|(c, _)| *c).collect()
    };

    if coordinates.len() < 2 || maneuver_points.len() < 2 {
        return Err(NavError::InsufficientPoints {
            count: coordinates.len().min(maneuver_points.len()),
            minimum: 2,
        });
    }

    let token = geometry::encode(&coordinates)?;
    let steps = build_steps(&maneuver_points);
    log::info!(
        "Imported GPX route: {} points, {} steps",
        coordinates.len(),
        steps.len()
    );

    let length = track_length(&coordinates);
    Ok(Route::new(steps, coordinates, length, 0.0, token))
}

/// One step per maneuver point: depart, a turn at every interior point,
/// arrive. Requires at least two points.
fn build_steps(points: &[(Coordinate, Option<String>)]) -> Vec<RouteStep> {
    let mut steps = Vec::with_capacity(points.len());

    let (start, start_name) = &points[0];
    steps.push(RouteStep::new(
        &depart_instruction(bearing_degrees(start, &points[1].0), start_name.as_deref()),
        Maneuver::Depart,
        *start,
    ));

    for i in 1..points.len() - 1 {
        let (here, name) = &points[i];
        let turn = turn_at(&points[i - 1].0, here, &points[i + 1].0);
        steps.push(RouteStep::new(&instruction(turn, name.as_deref()), turn, *here));
    }

    let (end, _) = &points[points.len() - 1];
    steps.push(RouteStep::new(
        &instruction(Maneuver::Arrive, None),
        Maneuver::Arrive,
        *end,
    ));

    steps
}

/// Turn the first track into fixes spaced `interval_ms` apart, with speed
/// derived from the distance between consecutive samples.
pub fn parse_trace(data: &[u8], interval_ms: u64) -> Result<Vec<LiveFix>> {
    let gpx = read(data)?;
    let track = first_track(&gpx);
    let interval_s = interval_ms as f64 / 1000.0;

    let fixes = track
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let fix = LiveFix::new(*p, i as u64 * interval_ms);
            match i.checked_sub(1).map(|prev| &track[prev]) {
                Some(prev) if interval_s > 0.0 => {
                    fix.with_speed(distance_meters(prev, p) / interval_s)
                }
                _ => fix,
            }
        })
        .collect();

    Ok(fixes)
}
