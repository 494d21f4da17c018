//! Active navigation session.
//!
//! One `NavigationSession` owns the route, the tracking state and the
//! collaborators for a single navigation. Each fix runs the whole pipeline
//! synchronously: progress snap, maneuver update, off-route check, voice
//! scheduling, heading. A new route (different token) replaces all
//! tracking state at once.

use serde::Serialize;

use crate::config::NavConfig;
use crate::error::Result;
use crate::geo::{distance_meters, track_length, Coordinate};
use crate::heading::display_heading;
use crate::maneuver::{self, StepEvent};
use crate::off_route::{self, OffRouteCheck};
use crate::progress::{self, Progress};
use crate::route::{LiveFix, Maneuver, Route};
use crate::state::TrackingState;
use crate::voice::{self, Utterance};

/// Speech output. A new utterance interrupts whatever is playing.
pub trait VoiceOutput {
    fn speak(&mut self, utterance: &Utterance) -> Result<()>;
    fn stop(&mut self);
}

/// Asynchronous route computation. The answer comes back through
/// [`NavigationSession::replace_route`] or
/// [`NavigationSession::route_unavailable`].
pub trait RouteRequester {
    fn request_route(&mut self, request: RouteRequest);
}

/// Lifecycle notifications for the host.
pub trait SessionObserver {
    /// Called exactly once, on arrival.
    fn on_arrived(&mut self);
    fn on_route_failure(&mut self, reason: &str);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub travel_mode: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavStatus {
    Navigating,
    Recalculating,
    /// Recalculating, and the last route request came back empty.
    RouteUnavailable,
    Arrived,
}

/// Read-only view for the presentation layer after each fix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub status: NavStatus,
    pub step_index: usize,
    pub step_count: usize,
    pub instruction: Option<String>,
    pub maneuver: Option<Maneuver>,
    pub transit_line: Option<String>,
    pub distance_to_maneuver_m: Option<f64>,
    pub remaining_distance_m: f64,
    pub remaining_duration_s: f64,
    /// Snapped position when on the route, raw fix otherwise.
    pub position: Coordinate,
    pub raw_position: Coordinate,
    pub on_route: bool,
    pub remaining_route: Vec<Coordinate>,
    /// Raw fix to nearest route point, drawn dashed when not snapped.
    pub off_route_connector: Option<[Coordinate; 2]>,
    pub heading_deg: Option<f64>,
    pub route_failure: Option<String>,
}

pub struct NavigationSession<L> {
    config: NavConfig,
    route: Route,
    route_length_m: f64,
    state: TrackingState,
    listener: L,
    snapshot: Option<Snapshot>,
}

impl<L> NavigationSession<L>
where
    L: VoiceOutput + RouteRequester + SessionObserver,
{
    /// Begin guidance along `route`.
    pub fn start(route: Route, config: NavConfig, listener: L) -> Self {
        let mut session = Self {
            config,
            route_length_m: track_length(&route.coordinates),
            state: TrackingState::for_route(&route.token),
            route,
            listener,
            snapshot: None,
        };

        match session.route.validate() {
            Ok(()) => {
                log::info!(
                    "Navigation started: {} steps, {:.0} m",
                    session.route.steps.len(),
                    session.route.total_distance_m()
                );
                if session.config.announce_start {
                    session.announce(voice::start_announcement(&session.config));
                }
            }
            Err(e) => log::warn!("Navigation started with unusable route: {e}"),
        }

        session
    }

    /// Run the full pipeline for one fix. Returns None when there is
    /// nothing to track yet.
    pub fn process_fix(&mut self, fix: &LiveFix) -> Option<Snapshot> {
        if !self.route.is_navigable() {
            log::debug!("Fix ignored, no usable route");
            return None;
        }
        if !(fix.position.lat.is_finite() && fix.position.lon.is_finite()) {
            log::warn!("Fix ignored, invalid position {:?}", fix.position);
            return None;
        }

        let speed = match fix.speed_mps {
            Some(speed) => {
                self.state.speed_anchor = Some(*fix);
                Some(speed)
            }
            None => self.estimate_speed(fix),
        };

        let progress = progress::track(
            &mut self.state,
            &self.route.coordinates,
            &fix.position,
            self.config.snap_tolerance_m,
        );

        match maneuver::update(&mut self.state, &self.route, &fix.position, &self.config) {
            StepEvent::Arrived => {
                self.announce(voice::arrival_announcement(&self.config));
                self.listener.on_arrived();
            }
            StepEvent::Advanced { .. } | StepEvent::Holding => {}
        }

        match off_route::check(&mut self.state, &self.route, fix, speed, &self.config) {
            OffRouteCheck::Deviated { .. } => self.request_recalculation(fix.position),
            OffRouteCheck::RateLimited { deviation_m } => {
                log::debug!("Off route by {deviation_m:.0} m, request already pending");
            }
            OffRouteCheck::NotDue | OffRouteCheck::Stationary | OffRouteCheck::OnRoute { .. } => {}
        }

        let distance = maneuver::distance_to_maneuver(&self.state, &self.route, &fix.position);
        if let Some(d) = distance {
            if let Some(utterance) = voice::schedule(&mut self.state, &self.route, d, &self.config) {
                self.announce(utterance);
            }
        }

        let heading = display_heading(
            fix,
            &self.route.coordinates,
            progress.map(|p| p.closest_index),
            self.config.heading_look_ahead,
        );

        let snapshot = self.build_snapshot(fix, progress, distance, heading);
        self.snapshot = Some(snapshot.clone());
        Some(snapshot)
    }

    /// Hand over a route from the routing collaborator. A route with the
    /// current token is the same route and leaves guidance untouched,
    /// unless a recalculation asked for it.
    pub fn replace_route(&mut self, route: Route) {
        if route.token == self.route.token && !self.state.is_recalculating {
            log::debug!("Same route delivered again, keeping state");
            return;
        }

        if let Err(e) = route.validate() {
            self.route_unavailable(&e.to_string());
            return;
        }

        log::info!(
            "Route replaced: {} steps, {:.0} m, resetting guidance",
            route.steps.len(),
            route.total_distance_m()
        );
        self.route_length_m = track_length(&route.coordinates);
        self.state = TrackingState::for_route(&route.token);
        self.route = route;
        self.snapshot = None;
    }

    /// The routing collaborator found no route. Recalculation stays
    /// pending; the next attempt waits for the rate limit and continued
    /// deviation. Outside a recalculation the current route stays in use
    /// and nothing is recorded.
    pub fn route_unavailable(&mut self, reason: &str) {
        log::warn!("Route unavailable: {reason}");
        if self.state.is_recalculating {
            self.state.route_failure = Some(reason.to_string());
        }
        self.listener.on_route_failure(reason);
    }

    /// Tear down the session. Voice output is stopped unless the arrival
    /// announcement is what is playing.
    pub fn end(mut self) -> L {
        if !self.state.has_arrived {
            self.listener.stop();
        }
        log::info!(
            "Navigation ended at step {} of {}",
            self.state.active_step_index,
            self.route.steps.len()
        );
        self.listener
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    /// Snapshot produced by the most recent fix.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    fn announce(&mut self, utterance: Utterance) {
        // Guidance never depends on speech succeeding
        if let Err(e) = self.listener.speak(&utterance) {
            log::warn!("Could not speak {:?}: {e}", utterance.text);
        }
    }

    fn request_recalculation(&mut self, origin: Coordinate) {
        let Some(destination) = self.route.destination() else {
            return;
        };

        if !self.state.is_recalculating {
            self.state.is_recalculating = true;
            self.announce(voice::recalculating_announcement(&self.config));
        } else {
            log::info!("Still off route, requesting again");
        }
        self.state.route_failure = None;

        self.listener.request_route(RouteRequest {
            origin,
            destination,
            travel_mode: self.config.travel_mode.clone(),
        });
    }

    /// Average speed since the anchor fix, once the user has moved further
    /// from it than position noise can explain. Until then there is no
    /// estimate and the fix counts as stationary.
    fn estimate_speed(&mut self, fix: &LiveFix) -> Option<f64> {
        let Some(anchor) = self.state.speed_anchor else {
            self.state.speed_anchor = Some(*fix);
            return None;
        };

        let moved_m = distance_meters(&anchor.position, &fix.position);
        if moved_m <= self.config.snap_tolerance_m {
            return None;
        }

        self.state.speed_anchor = Some(*fix);
        let elapsed_ms = fix.timestamp_ms.checked_sub(anchor.timestamp_ms).filter(|ms| *ms > 0)?;
        Some(moved_m / (elapsed_ms as f64 / 1000.0))
    }

    fn status(&self) -> NavStatus {
        if self.state.has_arrived {
            NavStatus::Arrived
        } else if self.state.is_recalculating && self.state.route_failure.is_some() {
            NavStatus::RouteUnavailable
        } else if self.state.is_recalculating {
            NavStatus::Recalculating
        } else {
            NavStatus::Navigating
        }
    }

    fn build_snapshot(
        &self,
        fix: &LiveFix,
        progress: Option<Progress>,
        distance_to_maneuver_m: Option<f64>,
        heading_deg: Option<f64>,
    ) -> Snapshot {
        let coords = &self.route.coordinates;
        let step = self.route.steps.get(self.state.active_step_index);

        let remaining_distance_m = progress
            .map(|p| p.remaining_distance_m(coords))
            .unwrap_or(self.route_length_m);
        let remaining_duration_s = if self.route_length_m > 0.0 {
            self.route.duration_s * (remaining_distance_m / self.route_length_m).min(1.0)
        } else {
            0.0
        };

        let on_route = progress.is_some_and(|p| p.on_route);

        Snapshot {
            status: self.status(),
            step_index: self.state.active_step_index,
            step_count: self.route.steps.len(),
            instruction: step.map(|s| s.instruction.clone()),
            maneuver: step.map(|s| s.maneuver),
            transit_line: step.and_then(|s| s.transit_line.clone()),
            distance_to_maneuver_m,
            remaining_distance_m,
            remaining_duration_s,
            position: progress
                .map(|p| p.display_position(&fix.position))
                .unwrap_or(fix.position),
            raw_position: fix.position,
            on_route,
            remaining_route: progress
                .map(|p| p.remaining_route(coords))
                .unwrap_or_else(|| coords.clone()),
            off_route_connector: progress
                .filter(|p| !p.on_route)
                .map(|p| [fix.position, p.snapped]),
            heading_deg,
            route_failure: self.state.route_failure.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NavError;
    use crate::events::{EventQueue, SessionEvent};
    use crate::route::RouteStep;
    use crate::voice::UtteranceKind;

    const M_PER_DEG: f64 = 6_371_008.8 * std::f64::consts::PI / 180.0;

    fn pt(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon)
    }

    /// Left at (0,0), right at (0,1), arrive at (1,1).
    fn l_route(token: &str) -> Route {
        Route::new(
            vec![
                RouteStep::new("Turn left", Maneuver::Left, pt(0.0, 0.0)),
                RouteStep::new("Turn right", Maneuver::Right, pt(0.0, 1.0)),
                RouteStep::new("Arrive at destination", Maneuver::Arrive, pt(1.0, 1.0)),
            ],
            vec![pt(0.0, 0.0), pt(0.0, 1.0), pt(1.0, 1.0)],
            0.0,
            3600.0,
            token,
        )
    }

    /// Short east-west street with vertices every ~11 m.
    fn street(token: &str) -> Route {
        let coords: Vec<Coordinate> = (0..=100).map(|i| pt(0.0, i as f64 * 0.0001)).collect();
        Route::new(
            vec![
                RouteStep::new("Head east", Maneuver::Depart, coords[0]),
                RouteStep::new("Arrive at destination", Maneuver::Arrive, coords[100]),
            ],
            coords,
            0.0,
            120.0,
            token,
        )
    }

    fn quiet() -> NavConfig {
        NavConfig {
            announce_start: false,
            ..NavConfig::default()
        }
    }

    fn fix(p: Coordinate, t: u64, speed: f64) -> LiveFix {
        LiveFix::new(p, t).with_speed(speed)
    }

    fn spoken(queue: &EventQueue) -> Vec<Utterance> {
        queue
            .events()
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Speak { utterance } => Some(utterance.clone()),
                _ => None,
            })
            .collect()
    }

    fn count(queue: &EventQueue, pred: impl Fn(&SessionEvent) -> bool) -> usize {
        queue.events().iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn end_to_end_walk() {
        let mut session = NavigationSession::start(l_route("a"), NavConfig::default(), EventQueue::new());

        let path = [
            pt(0.0, 0.0),
            pt(0.0, 0.25),
            pt(0.0, 0.5),
            pt(0.0, 0.75),
            pt(0.0, 1.0),
            pt(0.25, 1.0),
            pt(0.5, 1.0),
            pt(0.75, 1.0),
            pt(1.0, 1.0),
            pt(1.0, 1.0),
        ];

        let mut indices = Vec::new();
        for (i, p) in path.iter().enumerate() {
            let snap = session.process_fix(&fix(*p, i as u64 * 5_000, 10.0)).unwrap();
            indices.push(snap.step_index);
        }

        assert_eq!(indices, vec![0, 1, 1, 1, 1, 2, 2, 2, 2, 2]);
        assert_eq!(session.snapshot().unwrap().status, NavStatus::Arrived);

        let queue = session.listener();
        assert_eq!(count(queue, |e| matches!(e, SessionEvent::Arrived)), 1);
        assert_eq!(count(queue, |e| matches!(e, SessionEvent::RequestRoute { .. })), 0);

        let utterances = spoken(queue);
        let kinds: Vec<UtteranceKind> = utterances.iter().map(|u| u.kind).collect();
        assert_eq!(
            kinds,
            vec![
                UtteranceKind::Start,
                UtteranceKind::Close,
                UtteranceKind::Early,
                UtteranceKind::Close,
                UtteranceKind::Early,
                UtteranceKind::Arrival,
            ]
        );
        assert_eq!(utterances[1].text, "Turn left");
        assert!(utterances[2].text.ends_with("turn right"), "got {}", utterances[2].text);
        assert_eq!(utterances[3].text, "Turn right");
        assert!(utterances[4].text.ends_with("arrive at destination"), "got {}", utterances[4].text);
    }

    #[test]
    fn arrival_fires_once() {
        let route = street("s");
        let dest = route.coordinates[100];
        let mut session = NavigationSession::start(route, quiet(), EventQueue::new());
        session.state.active_step_index = 1;

        for t in 0..10 {
            session.process_fix(&fix(dest, t * 1_000, 0.0));
        }

        let queue = session.listener();
        assert_eq!(count(queue, |e| matches!(e, SessionEvent::Arrived)), 1);
        let arrivals = spoken(queue)
            .iter()
            .filter(|u| u.kind == UtteranceKind::Arrival)
            .count();
        assert_eq!(arrivals, 1);
    }

    #[test]
    fn stationary_far_fix_does_not_recalculate() {
        let mut session = NavigationSession::start(street("s"), quiet(), EventQueue::new());
        let far = pt(200.0 / M_PER_DEG, 0.005);

        for t in 0..5 {
            session.process_fix(&fix(far, t * 20_000, 0.3));
        }

        assert!(!session.state().is_recalculating);
        assert_eq!(
            count(session.listener(), |e| matches!(e, SessionEvent::RequestRoute { .. })),
            0
        );
    }

    #[test]
    fn moving_off_route_requests_once() {
        let mut session = NavigationSession::start(street("s"), quiet(), EventQueue::new());
        let far = pt(200.0 / M_PER_DEG, 0.005);

        let snap = session.process_fix(&fix(far, 0, 12.0)).unwrap();
        assert_eq!(snap.status, NavStatus::Recalculating);
        session.process_fix(&fix(far, 2_000, 12.0));

        let queue = session.listener();
        assert_eq!(count(queue, |e| matches!(e, SessionEvent::RequestRoute { .. })), 1);
        let recalcs = spoken(queue)
            .iter()
            .filter(|u| u.kind == UtteranceKind::Recalculating)
            .count();
        assert_eq!(recalcs, 1);

        match &queue.events()[1] {
            SessionEvent::RequestRoute { request } => {
                assert_eq!(request.origin, far);
                assert_eq!(request.destination, street("s").coordinates[100]);
                assert_eq!(request.travel_mode, "driving");
            }
            other => panic!("expected route request, got {other:?}"),
        }
    }

    #[test]
    fn recalculating_freezes_guidance() {
        let mut session = NavigationSession::start(street("s"), quiet(), EventQueue::new());
        session.process_fix(&fix(pt(200.0 / M_PER_DEG, 0.005), 0, 12.0));
        let before = session.listener().events().len();

        // Back on the route at the destination: no arrival while recalculating
        let snap = session.process_fix(&fix(pt(0.0, 0.01), 1_000, 12.0)).unwrap();
        assert_eq!(snap.status, NavStatus::Recalculating);
        assert!(!session.state().has_arrived);
        assert_eq!(session.listener().events().len(), before);
    }

    #[test]
    fn speed_is_estimated_when_missing() {
        let mut session = NavigationSession::start(street("s"), quiet(), EventQueue::new());

        // ~222 m north of the line; first standing still, then ~22 m/s
        session.process_fix(&LiveFix::new(pt(0.002, 0.001), 0));
        session.process_fix(&LiveFix::new(pt(0.002, 0.001), 1_000));
        assert!(!session.state().is_recalculating);

        // 44 m in 2 s from where it stood
        session.process_fix(&LiveFix::new(pt(0.002, 0.0014), 2_000));
        assert!(session.state().is_recalculating);
    }

    #[test]
    fn parked_jitter_without_speed_is_stationary() {
        let mut session = NavigationSession::start(street("s"), quiet(), EventQueue::new());
        let d = 5.0 / M_PER_DEG;
        let offsets = [(0.0, 0.0), (d, 0.0), (0.0, -d), (-d, d), (d, d), (-d, -d)];

        // 200 m north of the line, no speed field, 1 s fixes wandering ~5 m
        for t in 0..60u64 {
            let (dlat, dlon) = offsets[t as usize % offsets.len()];
            let p = pt(200.0 / M_PER_DEG + dlat, 0.005 + dlon);
            session.process_fix(&LiveFix::new(p, t * 1_000));
        }

        assert!(!session.state().is_recalculating);
        assert_eq!(
            count(session.listener(), |e| matches!(e, SessionEvent::RequestRoute { .. })),
            0
        );
    }

    #[test]
    fn failed_recalculation_stays_pending_and_retries() {
        let mut session = NavigationSession::start(street("s"), quiet(), EventQueue::new());
        let far = pt(200.0 / M_PER_DEG, 0.005);
        session.process_fix(&fix(far, 0, 12.0));

        session.route_unavailable("no route found");
        let snap = session.process_fix(&fix(far, 1_000, 12.0)).unwrap();
        assert_eq!(snap.status, NavStatus::RouteUnavailable);
        assert_eq!(snap.route_failure.as_deref(), Some("no route found"));
        assert!(session.state().is_recalculating);

        // Next window: asks again without a second announcement
        let snap = session.process_fix(&fix(far, 10_000, 12.0)).unwrap();
        assert_eq!(snap.status, NavStatus::Recalculating);

        let queue = session.listener();
        assert_eq!(count(queue, |e| matches!(e, SessionEvent::RequestRoute { .. })), 2);
        assert_eq!(count(queue, |e| matches!(e, SessionEvent::RouteFailure { .. })), 1);
        let recalcs = spoken(queue)
            .iter()
            .filter(|u| u.kind == UtteranceKind::Recalculating)
            .count();
        assert_eq!(recalcs, 1);
    }

    #[test]
    fn replacement_route_resets_everything() {
        let mut session = NavigationSession::start(l_route("a"), quiet(), EventQueue::new());
        session.process_fix(&fix(pt(0.0, 0.0), 0, 10.0));
        session.process_fix(&fix(pt(0.0, 0.25), 1_000, 10.0));
        assert_eq!(session.state().active_step_index, 1);

        session.state.is_recalculating = true;
        session.state.has_arrived = true;

        // Same geometry, new token
        session.replace_route(l_route("b"));
        let state = session.state();
        assert_eq!(state.route_token, "b");
        assert_eq!(state.active_step_index, 0);
        assert!(!state.has_arrived);
        assert!(!state.is_recalculating);
        assert_eq!(state.last_spoken_step_index, None);
        assert_eq!(state.last_spoken_instruction, None);
        assert!(state.min_approach_distance_m.is_infinite());
        assert!(session.snapshot().is_none());
    }

    #[test]
    fn same_token_keeps_state() {
        let mut session = NavigationSession::start(l_route("a"), quiet(), EventQueue::new());
        session.process_fix(&fix(pt(0.0, 0.0), 0, 10.0));
        session.process_fix(&fix(pt(0.0, 0.25), 1_000, 10.0));

        session.replace_route(l_route("a"));
        assert_eq!(session.state().active_step_index, 1);
    }

    #[test]
    fn invalid_replacement_is_a_failure() {
        let mut session = NavigationSession::start(street("s"), quiet(), EventQueue::new());
        session.process_fix(&fix(pt(200.0 / M_PER_DEG, 0.005), 0, 12.0));

        let broken = Route::new(Vec::new(), vec![pt(0.0, 0.0)], 0.0, 0.0, "x");
        session.replace_route(broken);

        assert_eq!(session.route().token, "s");
        assert!(session.state().is_recalculating);
        assert!(session.state().route_failure.is_some());
    }

    #[test]
    fn invalid_replacement_while_on_route_keeps_navigating() {
        let mut session = NavigationSession::start(street("s"), quiet(), EventQueue::new());
        session.process_fix(&fix(pt(0.0, 0.001), 0, 10.0));

        let broken = Route::new(Vec::new(), vec![pt(0.0, 0.0)], 0.0, 0.0, "x");
        session.replace_route(broken);

        let snap = session.process_fix(&fix(pt(0.0, 0.002), 1_000, 10.0)).unwrap();
        assert_eq!(snap.status, NavStatus::Navigating);
        assert_eq!(snap.route_failure, None);
        assert_eq!(session.route().token, "s");
        assert_eq!(
            count(session.listener(), |e| matches!(e, SessionEvent::RouteFailure { .. })),
            1
        );
    }

    #[test]
    fn u_turn_on_final_step_follows_the_line() {
        let mut session = NavigationSession::start(street("s"), quiet(), EventQueue::new());
        let coords = street("s").coordinates;

        let mut t = 0;
        for i in (0..=60).step_by(5) {
            session.process_fix(&fix(coords[i], t, 10.0));
            t += 1_000;
        }
        assert_eq!(session.state().active_step_index, 1);

        let mut snap = None;
        for i in (20..=55).rev().step_by(5) {
            snap = session.process_fix(&fix(coords[i], t, 10.0));
            t += 1_000;
        }

        let snap = snap.unwrap();
        assert!(snap.on_route);
        assert_eq!(snap.position, coords[20]);
        assert!(snap.off_route_connector.is_none());
        assert!((snap.remaining_distance_m - 80.0 * 11.12).abs() < 2.0,
            "got {}", snap.remaining_distance_m);
        assert!(!session.state().is_recalculating);
    }

    #[test]
    fn degenerate_route_is_a_no_op() {
        let route = Route::new(
            vec![RouteStep::new("Arrive", Maneuver::Arrive, pt(0.0, 0.0))],
            vec![pt(0.0, 0.0)],
            0.0,
            0.0,
            "d",
        );
        let mut session = NavigationSession::start(route, NavConfig::default(), EventQueue::new());
        assert!(session.process_fix(&fix(pt(0.0, 0.0), 0, 5.0)).is_none());
        assert!(session.listener().events().is_empty());
    }

    #[test]
    fn snapshot_reports_progress() {
        let mut session = NavigationSession::start(street("s"), quiet(), EventQueue::new());
        let p = pt(5.0 / M_PER_DEG, 0.00503);
        let snap = session.process_fix(&fix(p, 0, 10.0)).unwrap();

        assert_eq!(snap.status, NavStatus::Navigating);
        assert!(snap.on_route);
        assert!(snap.position.lat.abs() < 1e-9);
        assert_eq!(snap.raw_position, p);
        assert!(snap.off_route_connector.is_none());
        assert!((snap.remaining_distance_m - 552.6).abs() < 1.0,
            "got {}", snap.remaining_distance_m);
        assert!((snap.remaining_duration_s - 59.64).abs() < 0.2,
            "got {}", snap.remaining_duration_s);
        assert_eq!(snap.remaining_route.len(), 51);
        let heading = snap.heading_deg.unwrap();
        assert!((heading - 90.0).abs() < 10.0, "got {heading}");
    }

    #[test]
    fn snapshot_draws_connector_when_off_geometry() {
        let mut session = NavigationSession::start(street("s"), quiet(), EventQueue::new());
        let p = pt(50.0 / M_PER_DEG, 0.005);
        let snap = session.process_fix(&fix(p, 0, 1.0)).unwrap();

        assert!(!snap.on_route);
        assert_eq!(snap.position, p);
        let [from, to] = snap.off_route_connector.unwrap();
        assert_eq!(from, p);
        assert!(to.lat.abs() < 1e-9);
    }

    struct BrokenSpeaker {
        attempts: usize,
        arrived: bool,
    }

    impl VoiceOutput for BrokenSpeaker {
        fn speak(&mut self, _utterance: &Utterance) -> Result<()> {
            self.attempts += 1;
            Err(NavError::Voice {
                message: "engine unavailable".into(),
            })
        }
        fn stop(&mut self) {}
    }

    impl RouteRequester for BrokenSpeaker {
        fn request_route(&mut self, _request: RouteRequest) {}
    }

    impl SessionObserver for BrokenSpeaker {
        fn on_arrived(&mut self) {
            self.arrived = true;
        }
        fn on_route_failure(&mut self, _reason: &str) {}
    }

    #[test]
    fn voice_failure_does_not_block_guidance() {
        let speaker = BrokenSpeaker { attempts: 0, arrived: false };
        let mut session = NavigationSession::start(l_route("a"), NavConfig::default(), speaker);

        for (i, p) in [pt(0.0, 0.0), pt(0.0, 0.25), pt(0.0, 1.0), pt(0.25, 1.0), pt(1.0, 1.0)]
            .iter()
            .enumerate()
        {
            session.process_fix(&fix(*p, i as u64 * 1_000, 10.0));
        }

        assert!(session.state().has_arrived);
        let speaker = session.end();
        assert!(speaker.arrived);
        assert!(speaker.attempts > 0);
    }

    #[test]
    fn end_stops_voice_unless_arrived() {
        let session = NavigationSession::start(street("s"), quiet(), EventQueue::new());
        let queue = session.end();
        assert!(matches!(queue.events().last(), Some(SessionEvent::StopSpeech)));

        let route = street("s");
        let dest = route.coordinates[100];
        let mut session = NavigationSession::start(route, quiet(), EventQueue::new());
        session.state.active_step_index = 1;
        session.process_fix(&fix(dest, 0, 0.0));
        let queue = session.end();
        assert_eq!(count(&queue, |e| matches!(e, SessionEvent::StopSpeech)), 0);
    }
}
