//! Turn classification and instruction phrasing.
//!
//! Used when a route arrives without provider instructions (GPX) or with
//! only machine-readable maneuver types (OSRM).

use crate::geo::{bearing_degrees, normalize_degrees, Coordinate};
use crate::route::Maneuver;

/// Largest bearing change, in degrees, each class covers as
/// `(limit, when turning left, when turning right)`. Anything beyond the
/// last limit is a U-turn.
const TURN_CLASSES: [(f64, Maneuver, Maneuver); 4] = [
    (20.0, Maneuver::Straight, Maneuver::Straight),
    (60.0, Maneuver::SlightLeft, Maneuver::SlightRight),
    (120.0, Maneuver::Left, Maneuver::Right),
    (170.0, Maneuver::SharpLeft, Maneuver::SharpRight),
];

/// Signed bearing change in [-180, 180) from travelling `a`->`b` to
/// travelling `b`->`c`. Positive turns right.
pub fn bearing_change(a: &Coordinate, b: &Coordinate, c: &Coordinate) -> f64 {
    let delta = bearing_degrees(b, c) - bearing_degrees(a, b);
    normalize_degrees(delta + 180.0) - 180.0
}

/// Maneuver at `b` for a route arriving from `a` and leaving toward `c`.
pub fn turn_at(a: &Coordinate, b: &Coordinate, c: &Coordinate) -> Maneuver {
    classify_turn(bearing_change(a, b, c))
}

pub fn classify_turn(delta: f64) -> Maneuver {
    let magnitude = delta.abs();
    TURN_CLASSES
        .iter()
        .find(|(limit, _, _)| magnitude <= *limit)
        .map(|&(_, left, right)| if delta < 0.0 { left } else { right })
        .unwrap_or(Maneuver::UTurn)
}

/// Eight-point compass name for a bearing.
pub fn cardinal(bearing: f64) -> &'static str {
    const NAMES: [&str; 8] = [
        "north", "northeast", "east", "southeast",
        "south", "southwest", "west", "northwest",
    ];
    let sector = ((bearing.rem_euclid(360.0) + 22.5) / 45.0) as usize % 8;
    NAMES[sector]
}

fn phrase(maneuver: Maneuver) -> &'static str {
    match maneuver {
        Maneuver::Depart => "head out",
        Maneuver::Straight => "continue straight",
        Maneuver::SlightLeft => "keep slightly left",
        Maneuver::Left => "turn left",
        Maneuver::SharpLeft => "turn sharp left",
        Maneuver::SlightRight => "keep slightly right",
        Maneuver::Right => "turn right",
        Maneuver::SharpRight => "turn sharp right",
        Maneuver::UTurn => "make a U-turn",
        Maneuver::Merge => "merge",
        Maneuver::Ramp => "take the ramp",
        Maneuver::Roundabout => "enter the roundabout",
        Maneuver::Fork => "keep at the fork",
        Maneuver::Arrive => "arrive at destination",
        Maneuver::Transit => "board",
    }
}

/// Human-readable instruction, e.g. "Turn left onto Main Street".
pub fn instruction(maneuver: Maneuver, road: Option<&str>) -> String {
    let base = phrase(maneuver);
    let text = match road.map(str::trim).filter(|r| !r.is_empty()) {
        Some(road) if maneuver == Maneuver::Transit => format!("{base} {road}"),
        Some(road) if maneuver != Maneuver::Arrive => format!("{base} onto {road}"),
        _ => base.to_string(),
    };
    capitalize(&text)
}

/// Departure instruction from the initial travel bearing.
pub fn depart_instruction(bearing: f64, road: Option<&str>) -> String {
    let base = format!("Head {}", cardinal(bearing));
    match road.map(str::trim).filter(|r| !r.is_empty()) {
        Some(road) => format!("{base} on {road}"),
        None => base,
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
