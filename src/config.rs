//! Guidance tunables.
//!
//! The distance and timing constants are calibration values rather than
//! a fixed contract, so they all live here and can be overridden from
//! JSON by the host app.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::units::Units;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Maximum fix-to-route distance at which the display position is
    /// snapped onto the route. Default: 30 m
    pub snap_tolerance_m: f64,

    /// A step counts as approached once the fix came this close to its
    /// maneuver point. Default: 20 m
    pub advance_close_m: f64,

    /// After approaching, the step advances once the fix is this far away
    /// again. Must be larger than `advance_close_m`. Default: 25 m
    pub advance_exit_m: f64,

    /// Distance to the final step that counts as arrival. Default: 30 m
    pub arrival_threshold_m: f64,

    /// Deviation from the route that triggers recalculation. Default: 80 m
    pub off_route_threshold_m: f64,

    /// Minimum spacing between off-route evaluations and between route
    /// requests. Default: 10 s
    pub off_route_interval_ms: u64,

    /// Speed below which the user is treated as stationary and off-route
    /// checks are skipped. Default: 2 m/s
    pub moving_speed_mps: f64,

    /// An instruction is repeated once inside this distance unless it was
    /// already spoken this close. Default: 300 ft
    pub voice_close_range_m: f64,

    /// How many polyline vertices past the snap point the derived heading
    /// looks. Default: 5
    pub heading_look_ahead: usize,

    pub units: Units,
    pub voice_locale: String,
    pub voice_rate: f32,

    /// Travel mode token passed to the routing collaborator.
    pub travel_mode: String,

    /// Speak a short confirmation when a session starts.
    pub announce_start: bool,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            snap_tolerance_m: 30.0,
            advance_close_m: 20.0,
            advance_exit_m: 25.0,
            arrival_threshold_m: 30.0,
            off_route_threshold_m: 80.0,
            off_route_interval_ms: 10_000,
            moving_speed_mps: 2.0,
            voice_close_range_m: 91.44,
            heading_look_ahead: 5,
            units: Units::Metric,
            voice_locale: "en-US".to_string(),
            voice_rate: 1.0,
            travel_mode: "driving".to_string(),
            announce_start: true,
        }
    }
}

impl NavConfig {
    /// Parse a config from JSON. Missing fields keep their defaults and an
    /// empty string yields the default config.
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_hysteresis_ordered() {
        let cfg = NavConfig::default();
        assert!(cfg.advance_exit_m > cfg.advance_close_m);
    }

    #[test]
    fn partial_json_overrides() {
        let cfg = NavConfig::from_json(r#"{"arrival_threshold_m": 80.0, "units": "imperial"}"#)
            .unwrap();
        assert_eq!(cfg.arrival_threshold_m, 80.0);
        assert_eq!(cfg.units, Units::Imperial);
        assert_eq!(cfg.snap_tolerance_m, 30.0);
    }

    #[test]
    fn empty_json_is_default() {
        assert_eq!(NavConfig::from_json("").unwrap(), NavConfig::default());
    }

    #[test]
    fn invalid_json_is_error() {
        assert!(NavConfig::from_json("{not json").is_err());
    }
}
