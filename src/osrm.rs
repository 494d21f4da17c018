//! OSRM `route/v1` response import.
//!
//! Converts the JSON body of an OSRM route request (with
//! `geometries=polyline&steps=true`) into a `Route`. The route geometry
//! string is kept as the route token. Steps of all legs are flattened;
//! later legs lose their `depart` step.

use serde::Deserialize;

use crate::error::{NavError, Result};
use crate::geo::Coordinate;
use crate::geometry;
use crate::route::{Maneuver, Route, RouteStep};
use crate::turns::{depart_instruction, instruction};

#[derive(Debug, Deserialize)]
struct Response {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: String,
    #[serde(default)]
    legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
struct Leg {
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct Step {
    #[serde(default)]
    name: String,
    #[serde(default)]
    mode: String,
    maneuver: StepManeuver,
}

#[derive(Debug, Deserialize)]
struct StepManeuver {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    modifier: Option<String>,
    /// `[lon, lat]`
    location: [f64; 2],
    #[serde(default)]
    bearing_after: Option<f64>,
    #[serde(default)]
    exit: Option<u32>,
}

/// Parse an OSRM response body into the first route it contains.
pub fn parse_route(json: &str) -> Result<Route> {
    let response: Response = serde_json::from_str(json)?;

    if response.code != "Ok" {
        return Err(NavError::NoRoute {
            reason: response.message.unwrap_or(response.code),
        });
    }

    let Some(route) = response.routes.into_iter().next() else {
        return Err(NavError::NoRoute {
            reason: "response contained no routes".to_string(),
        });
    };

    let coordinates = geometry::decode(&route.geometry)?;
    let leg_count = route.legs.len();

    let steps: Vec<RouteStep> = route
        .legs
        .iter()
        .enumerate()
        .flat_map(|(leg, l)| l.steps.iter().map(move |s| (leg, s)))
        .filter(|(leg, s)| *leg == 0 || s.maneuver.kind != "depart")
        .map(|(leg, s)| convert_step(s, leg + 1 < leg_count, leg + 1))
        .collect();

    let route = Route::new(steps, coordinates, route.distance, route.duration, route.geometry);
    route.validate()?;

    log::info!(
        "Parsed OSRM route: {} steps, {:.0} m, {:.0} s",
        route.steps.len(),
        route.distance_m,
        route.duration_s
    );
    Ok(route)
}

fn convert_step(step: &Step, intermediate: bool, leg_number: usize) -> RouteStep {
    let m = &step.maneuver;
    let location = Coordinate::new(m.location[1], m.location[0]);
    let road = Some(step.name.as_str()).filter(|n| !n.trim().is_empty());
    let maneuver = classify(step);

    let text = match maneuver {
        Maneuver::Depart => depart_instruction(m.bearing_after.unwrap_or(0.0), road),
        Maneuver::Arrive if intermediate => format!("Arrive at waypoint {leg_number}"),
        Maneuver::Merge | Maneuver::Fork | Maneuver::Ramp => sided_instruction(maneuver, m.modifier.as_deref(), road),
        Maneuver::Roundabout => match m.exit {
            Some(exit) => format!("Enter the roundabout and take the {} exit", ordinal(exit)),
            None => instruction(maneuver, road),
        },
        _ => instruction(maneuver, road),
    };

    let converted = RouteStep::new(&text, maneuver, location);
    if maneuver == Maneuver::Transit {
        converted.with_transit_line(step.name.clone())
    } else {
        converted
    }
}

fn classify(step: &Step) -> Maneuver {
    if step.mode == "ferry" && step.maneuver.kind != "arrive" {
        return Maneuver::Transit;
    }

    match step.maneuver.kind.as_str() {
        "depart" => Maneuver::Depart,
        "arrive" => Maneuver::Arrive,
        "merge" => Maneuver::Merge,
        "on ramp" | "off ramp" => Maneuver::Ramp,
        "fork" => Maneuver::Fork,
        "roundabout" | "rotary" | "roundabout turn" | "exit roundabout" | "exit rotary" => {
            Maneuver::Roundabout
        }
        _ => from_modifier(step.maneuver.modifier.as_deref()),
    }
}

fn from_modifier(modifier: Option<&str>) -> Maneuver {
    match modifier {
        Some("uturn") => Maneuver::UTurn,
        Some("sharp right") => Maneuver::SharpRight,
        Some("right") => Maneuver::Right,
        Some("slight right") => Maneuver::SlightRight,
        Some("slight left") => Maneuver::SlightLeft,
        Some("left") => Maneuver::Left,
        Some("sharp left") => Maneuver::SharpLeft,
        _ => Maneuver::Straight,
    }
}

fn sided_instruction(maneuver: Maneuver, modifier: Option<&str>, road: Option<&str>) -> String {
    let side = modifier.and_then(|m| {
        if m.contains("left") {
            Some("left")
        } else if m.contains("right") {
            Some("right")
        } else {
            None
        }
    });

    let base = match (maneuver, side) {
        (Maneuver::Merge, Some(side)) => format!("Merge {side}"),
        (Maneuver::Fork, Some(side)) => format!("Keep {side} at the fork"),
        (Maneuver::Ramp, Some(side)) => format!("Take the ramp on the {side}"),
        _ => return instruction(maneuver, road),
    };

    match road {
        Some(road) => format!("{base} onto {road}"),
        None => base,
    }
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}
