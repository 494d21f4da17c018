//! Route and position data handed to the engine by its collaborators.
//!
//! A `Route` is immutable once built; the engine only derives state
//! from it. Its `token` identifies the route so that a re-delivered copy
//! of the same route does not reset guidance.

use serde::{Deserialize, Serialize};

use crate::error::{NavError, Result};
use crate::geo::{track_length, Coordinate};

/// Maneuver classifier, used by the UI to pick an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Maneuver {
    Depart,
    Straight,
    SlightLeft,
    Left,
    SharpLeft,
    SlightRight,
    Right,
    SharpRight,
    UTurn,
    Merge,
    Ramp,
    Roundabout,
    Fork,
    Arrive,
    Transit,
}

/// One maneuver of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    /// Spoken and displayed instruction, free of markup.
    pub instruction: String,
    pub maneuver: Maneuver,
    /// Where the maneuver happens.
    pub location: Coordinate,
    /// Vehicle or line label for transit steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_line: Option<String>,
}

impl RouteStep {
    /// Build a step, stripping any HTML markup from the instruction.
    pub fn new(instruction: &str, maneuver: Maneuver, location: Coordinate) -> Self {
        Self {
            instruction: strip_html(instruction),
            maneuver,
            location,
            transit_line: None,
        }
    }

    pub fn with_transit_line(mut self, line: impl Into<String>) -> Self {
        self.transit_line = Some(line.into());
        self
    }
}

/// A full navigable route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub steps: Vec<RouteStep>,
    /// Dense polyline, much finer than the steps.
    pub coordinates: Vec<Coordinate>,
    pub distance_m: f64,
    pub duration_s: f64,
    /// Opaque identity, typically the encoded polyline.
    pub token: String,
}

impl Route {
    pub fn new(
        steps: Vec<RouteStep>,
        coordinates: Vec<Coordinate>,
        distance_m: f64,
        duration_s: f64,
        token: impl Into<String>,
    ) -> Self {
        Self {
            steps,
            coordinates,
            distance_m,
            duration_s,
            token: token.into(),
        }
    }

    /// Check that the route can drive guidance: at least two polyline
    /// points and one step.
    pub fn validate(&self) -> Result<()> {
        if self.coordinates.len() < 2 {
            return Err(NavError::InsufficientPoints {
                count: self.coordinates.len(),
                minimum: 2,
            });
        }
        if self.steps.is_empty() {
            return Err(NavError::NoSteps);
        }
        Ok(())
    }

    pub fn is_navigable(&self) -> bool {
        self.validate().is_ok()
    }

    /// Route length, falling back to the polyline length when the
    /// provider reported none.
    pub fn total_distance_m(&self) -> f64 {
        if self.distance_m > 0.0 {
            self.distance_m
        } else {
            track_length(&self.coordinates)
        }
    }

    /// Final point of the route, used as the recalculation target.
    pub fn destination(&self) -> Option<Coordinate> {
        self.coordinates
            .last()
            .or_else(|| self.steps.last().map(|s| &s.location))
            .copied()
    }

    pub fn last_step_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }
}

/// One position sample from the location collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveFix {
    pub position: Coordinate,
    /// Compass bearing of travel in degrees.
    #[serde(default)]
    pub heading_deg: Option<f64>,
    #[serde(default)]
    pub speed_mps: Option<f64>,
    /// Monotonic sample time in milliseconds.
    pub timestamp_ms: u64,
}

impl LiveFix {
    pub fn new(position: Coordinate, timestamp_ms: u64) -> Self {
        Self {
            position,
            heading_deg: None,
            speed_mps: None,
            timestamp_ms,
        }
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_mps = Some(speed_mps).filter(|s| s.is_finite());
        self
    }

    pub fn with_heading(mut self, heading_deg: f64) -> Self {
        self.heading_deg = Some(heading_deg).filter(|h| h.is_finite());
        self
    }
}

/// Remove tags and decode the handful of entities routing providers emit,
/// collapsing whitespace.
pub fn strip_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;

    for c in text.chars() {
        match c {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    let decoded = out
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
