//! Maneuver state machine.
//!
//! A step advances only after the user came within `advance_close_m` of
//! its maneuver point and then moved beyond `advance_exit_m` again. A
//! single proximity threshold fires early when the road merely passes
//! near a maneuver point without the turn being taken.
//!
//! The final step never advances; reaching it within
//! `arrival_threshold_m` latches arrival for the rest of the session.

use crate::config::NavConfig;
use crate::geo::{distance_meters, Coordinate};
use crate::route::Route;
use crate::state::TrackingState;

/// Outcome of evaluating one fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepEvent {
    /// Nothing changed, or guidance is suspended.
    Holding,
    Advanced { from: usize, to: usize },
    /// Fired once per session, on the fix that reached the destination.
    Arrived,
}

/// Straight-line distance from `p` to the active step's maneuver point.
pub fn distance_to_maneuver(state: &TrackingState, route: &Route, p: &Coordinate) -> Option<f64> {
    route
        .steps
        .get(state.active_step_index)
        .map(|step| distance_meters(p, &step.location))
}

/// Evaluate one fix against the active step.
pub fn update(state: &mut TrackingState, route: &Route, p: &Coordinate, config: &NavConfig) -> StepEvent {
    if !state.is_guiding() {
        return StepEvent::Holding;
    }

    let Some(distance) = distance_to_maneuver(state, route, p) else {
        return StepEvent::Holding;
    };
    if distance.is_nan() {
        return StepEvent::Holding;
    }

    state.min_approach_distance_m = state.min_approach_distance_m.min(distance);

    if state.active_step_index >= route.last_step_index() {
        if distance < config.arrival_threshold_m {
            state.has_arrived = true;
            log::info!("Arrived, {distance:.0} m from destination");
            return StepEvent::Arrived;
        }
        return StepEvent::Holding;
    }

    let approached = state.min_approach_distance_m < config.advance_close_m;
    let receding = distance > config.advance_exit_m;

    if approached && receding {
        let from = state.active_step_index;
        let closest = state.min_approach_distance_m;
        state.advance_step();
        log::info!(
            "Step {from} passed (closest {closest:.0} m, now {distance:.0} m), advancing to {}",
            state.active_step_index
        );
        return StepEvent::Advanced {
            from,
            to: state.active_step_index,
        };
    }

    log::debug!(
        "Step {}: {distance:.0} m, closest {:.0} m",
        state.active_step_index,
        state.min_approach_distance_m
    );
    StepEvent::Holding
}
