//! Mutable tracking state of one navigation session.

use crate::route::LiveFix;

/// Everything the engine remembers between fixes. One instance per
/// session; a new route replaces it wholesale via [`TrackingState::for_route`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingState {
    /// Identity token of the route this state was built for.
    pub route_token: String,
    /// Step the user is approaching. Always a valid step index.
    pub active_step_index: usize,
    /// Polyline vertex nearest the last fix. Held against small backward
    /// moves while the same step stays active; None means "search afresh".
    pub closest_polyline_index: Option<usize>,
    /// Smallest distance to the active maneuver since it became active.
    pub min_approach_distance_m: f64,
    pub is_recalculating: bool,
    pub last_spoken_step_index: Option<usize>,
    pub last_spoken_instruction: Option<String>,
    /// Whether the last spoken instruction was spoken inside close range.
    pub spoken_close: bool,
    /// Latched once the final step is reached.
    pub has_arrived: bool,
    pub last_recalculation_ms: Option<u64>,
    pub last_off_route_check_ms: Option<u64>,
    /// Reason given by the routing collaborator for the last failed
    /// recalculation.
    pub route_failure: Option<String>,
    /// Start of the current speed estimation window, for fixes that
    /// carry no speed.
    pub speed_anchor: Option<LiveFix>,
}

impl TrackingState {
    pub fn for_route(token: &str) -> Self {
        Self {
            route_token: token.to_string(),
            active_step_index: 0,
            closest_polyline_index: None,
            min_approach_distance_m: f64::INFINITY,
            is_recalculating: false,
            last_spoken_step_index: None,
            last_spoken_instruction: None,
            spoken_close: false,
            has_arrived: false,
            last_recalculation_ms: None,
            last_off_route_check_ms: None,
            route_failure: None,
            speed_anchor: None,
        }
    }

    /// Move to the next step, clearing per-step memory.
    pub fn advance_step(&mut self) {
        self.active_step_index += 1;
        self.min_approach_distance_m = f64::INFINITY;
        self.closest_polyline_index = None;
    }

    /// True while fixes may move guidance forward.
    pub fn is_guiding(&self) -> bool {
        !self.is_recalculating && !self.has_arrived
    }
}
