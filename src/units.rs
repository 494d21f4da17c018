//! Distance phrasing for voice announcements.

use serde::{Deserialize, Serialize};

const METERS_PER_MILE: f64 = 1609.344;
const METERS_PER_FOOT: f64 = 0.3048;
const METERS_PER_YARD: f64 = 0.9144;

/// Unit system used in spoken distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    #[default]
    Metric,
    /// Miles and feet.
    Imperial,
    /// Miles and yards.
    ImperialUk,
}

/// Spoken form of a distance, e.g. "800 meters", "0.5 miles", "300 feet".
pub fn spoken_distance(meters: f64, units: Units) -> String {
    let meters = meters.max(0.0);

    match units {
        Units::Metric => {
            if meters >= 1000.0 {
                plural(meters / 1000.0, 1, "kilometer")
            } else {
                plural(round_to(meters, 10.0), 0, "meter")
            }
        }
        Units::Imperial | Units::ImperialUk => {
            let miles = meters / METERS_PER_MILE;
            if miles >= 0.1 {
                return plural(miles, 1, "mile");
            }
            if units == Units::Imperial {
                plural(round_to(meters / METERS_PER_FOOT, 50.0), 0, "foot")
            } else {
                plural(round_to(meters / METERS_PER_YARD, 10.0), 0, "yard")
            }
        }
    }
}

fn round_to(value: f64, step: f64) -> f64 {
    ((value / step).round() * step).max(step)
}

fn plural(value: f64, decimals: usize, unit: &str) -> String {
    let text = format!("{value:.decimals$}");
    let text = text
        .strip_suffix(".0")
        .map(str::to_string)
        .unwrap_or(text);

    let word = if text == "1" {
        unit.to_string()
    } else if unit == "foot" {
        "feet".to_string()
    } else {
        format!("{unit}s")
    };

    format!("{text} {word}")
}
