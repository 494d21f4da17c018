//! JNI bindings for the Android app.
//!
//! Each public function here corresponds to an `external fun` declaration
//! in RustBridge.kt. The function names follow JNI naming conventions:
//! Java_<package>_<class>_<method> with dots replaced by underscores.
//!
//! A session lives on the Rust heap; Kotlin holds it as an opaque `Long`
//! handle from `startSession` until `endSession`. Calls that drive the
//! session return a JSON `Tick` with the snapshot (if any) and the events
//! the app must act on: speech, route requests, arrival.

use jni::objects::{JClass, JString};
use jni::sys::{jdouble, jlong, jstring};
use jni::JNIEnv;

use crate::config::NavConfig;
use crate::events::{EventQueue, Tick};
use crate::geo::Coordinate;
use crate::osrm;
use crate::route::LiveFix;
use crate::session::{NavigationSession, Snapshot};

type Session = NavigationSession<EventQueue>;

fn to_jstring(env: &mut JNIEnv, s: &str) -> jstring {
    match env.new_string(s) {
        Ok(js) => js.into_raw(),
        Err(e) => {
            log::error!("Failed to create Java string: {e}");
            std::ptr::null_mut()
        }
    }
}

fn read_string(env: &mut JNIEnv, s: &JString) -> Option<String> {
    match env.get_string(s) {
        Ok(js) => Some(js.into()),
        Err(e) => {
            log::error!("Failed to read Java string: {e}");
            None
        }
    }
}

/// Borrow the session behind a handle.
///
/// # Safety
/// `handle` must be 0 or a value returned by `startSession` that has not
/// been passed to `endSession`.
unsafe fn session_mut<'a>(handle: jlong) -> Option<&'a mut Session> {
    (handle as *mut Session).as_mut()
}

fn tick_json(env: &mut JNIEnv, snapshot: Option<Snapshot>, queue: &mut EventQueue) -> jstring {
    let tick = Tick {
        snapshot,
        events: queue.drain(),
    };
    match tick.to_json() {
        Ok(json) => to_jstring(env, &json),
        Err(e) => {
            log::error!("{e}");
            std::ptr::null_mut()
        }
    }
}

/// Returns the library version.
/// Maps to: RustBridge.version() -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_turnkit_navigation_RustBridge_version(
    mut env: JNIEnv,
    _class: JClass,
) -> jstring {
    to_jstring(&mut env, crate::VERSION)
}

/// Route `log` output to logcat.
/// Maps to: RustBridge.init()
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_turnkit_navigation_RustBridge_init(_env: JNIEnv, _class: JClass) {
    crate::init_logging();
}

/// Start a session from an OSRM response body and a config JSON (may be
/// empty). Returns 0 if either cannot be parsed.
/// Maps to: RustBridge.startSession(routeJson: String, configJson: String) -> Long
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_turnkit_navigation_RustBridge_startSession(
    mut env: JNIEnv,
    _class: JClass,
    route_json: JString,
    config_json: JString,
) -> jlong {
    let (Some(route_json), Some(config_json)) = (
        read_string(&mut env, &route_json),
        read_string(&mut env, &config_json),
    ) else {
        return 0;
    };

    let config = match NavConfig::from_json(&config_json) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid navigation config: {e}");
            return 0;
        }
    };
    let route = match osrm::parse_route(&route_json) {
        Ok(route) => route,
        Err(e) => {
            log::error!("Cannot start navigation: {e}");
            return 0;
        }
    };

    let session = Box::new(NavigationSession::start(route, config, EventQueue::new()));
    Box::into_raw(session) as jlong
}

/// Feed one location fix. Pass NaN for a missing heading or speed.
/// Maps to: RustBridge.processFix(handle: Long, lat: Double, lon: Double,
///     heading: Double, speed: Double, timestampMs: Long) -> String?
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_turnkit_navigation_RustBridge_processFix(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    lat: jdouble,
    lon: jdouble,
    heading: jdouble,
    speed: jdouble,
    timestamp_ms: jlong,
) -> jstring {
    let Some(session) = (unsafe { session_mut(handle) }) else {
        return std::ptr::null_mut();
    };

    let fix = LiveFix::new(Coordinate::new(lat, lon), timestamp_ms.max(0) as u64)
        .with_heading(heading)
        .with_speed(speed);
    let snapshot = session.process_fix(&fix);

    tick_json(&mut env, snapshot, session.listener_mut())
}

/// Deliver a recalculated route (OSRM response body). A body that does
/// not contain a usable route counts as "no route".
/// Maps to: RustBridge.replaceRoute(handle: Long, routeJson: String) -> String?
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_turnkit_navigation_RustBridge_replaceRoute(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    route_json: JString,
) -> jstring {
    let Some(session) = (unsafe { session_mut(handle) }) else {
        return std::ptr::null_mut();
    };
    let Some(route_json) = read_string(&mut env, &route_json) else {
        return std::ptr::null_mut();
    };

    match osrm::parse_route(&route_json) {
        Ok(route) => session.replace_route(route),
        Err(e) => session.route_unavailable(&e.to_string()),
    }

    tick_json(&mut env, None, session.listener_mut())
}

/// Report that the routing request failed.
/// Maps to: RustBridge.routeUnavailable(handle: Long, reason: String) -> String?
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_turnkit_navigation_RustBridge_routeUnavailable(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    reason: JString,
) -> jstring {
    let Some(session) = (unsafe { session_mut(handle) }) else {
        return std::ptr::null_mut();
    };
    let reason = read_string(&mut env, &reason).unwrap_or_default();

    session.route_unavailable(&reason);
    tick_json(&mut env, None, session.listener_mut())
}

/// Collect events produced outside a fix, e.g. the start announcement.
/// Maps to: RustBridge.drainEvents(handle: Long) -> String?
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_turnkit_navigation_RustBridge_drainEvents(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jstring {
    let Some(session) = (unsafe { session_mut(handle) }) else {
        return std::ptr::null_mut();
    };
    tick_json(&mut env, None, session.listener_mut())
}

/// End the session and free it. The handle is invalid afterwards.
/// Maps to: RustBridge.endSession(handle: Long) -> String?
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_turnkit_navigation_RustBridge_endSession(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jstring {
    if handle == 0 {
        return std::ptr::null_mut();
    }

    // SAFETY: handle came from Box::into_raw in startSession and Kotlin
    // drops it after this call
    let session = unsafe { Box::from_raw(handle as *mut Session) };
    let mut queue = session.end();
    tick_json(&mut env, None, &mut queue)
}
