//! Off-route detection.
//!
//! Evaluated at most once per `off_route_interval_ms`, and only while the
//! user is moving: parked GPS drifts far enough to look off-route. A
//! positive verdict is also rate limited by the time of the last route
//! request so an in-flight recalculation is not asked for again.

use crate::config::NavConfig;
use crate::geo::distance_to_polyline;
use crate::route::{LiveFix, Route};
use crate::state::TrackingState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OffRouteCheck {
    /// Too soon since the last evaluation, or guidance has ended.
    NotDue,
    /// Below the movement threshold; nothing was measured.
    Stationary,
    OnRoute { deviation_m: f64 },
    /// Off route, but a route was requested too recently.
    RateLimited { deviation_m: f64 },
    /// Off route and a new route should be requested now.
    Deviated { deviation_m: f64 },
}

fn elapsed_since(last: Option<u64>, now: u64) -> Option<u64> {
    last.map(|t| now.saturating_sub(t))
}

/// Measure deviation for one fix. `speed_mps` is the fix speed or an
/// estimate; None counts as stationary.
pub fn check(
    state: &mut TrackingState,
    route: &Route,
    fix: &LiveFix,
    speed_mps: Option<f64>,
    config: &NavConfig,
) -> OffRouteCheck {
    if state.has_arrived {
        return OffRouteCheck::NotDue;
    }

    let now = fix.timestamp_ms;
    if elapsed_since(state.last_off_route_check_ms, now)
        .is_some_and(|e| e < config.off_route_interval_ms)
    {
        return OffRouteCheck::NotDue;
    }

    let speed = speed_mps.unwrap_or(0.0);
    if !(speed > config.moving_speed_mps) {
        return OffRouteCheck::Stationary;
    }

    let Some(deviation_m) = distance_to_polyline(&fix.position, &route.coordinates) else {
        return OffRouteCheck::NotDue;
    };
    state.last_off_route_check_ms = Some(now);

    if !(deviation_m > config.off_route_threshold_m) {
        log::debug!("On route, deviation {deviation_m:.0} m");
        return OffRouteCheck::OnRoute { deviation_m };
    }

    if elapsed_since(state.last_recalculation_ms, now)
        .is_some_and(|e| e < config.off_route_interval_ms)
    {
        return OffRouteCheck::RateLimited { deviation_m };
    }

    state.last_recalculation_ms = Some(now);
    log::info!("Off route by {deviation_m:.0} m at {speed:.1} m/s");
    OffRouteCheck::Deviated { deviation_m }
}
