pub mod android_jni;
pub mod config;
pub mod error;
pub mod events;
pub mod geo;
pub mod geometry;
pub mod gpx;
pub mod heading;
pub mod maneuver;
pub mod off_route;
pub mod osrm;
pub mod progress;
pub mod route;
pub mod session;
pub mod simplify;
pub mod state;
pub mod turns;
pub mod units;
pub mod voice;

pub use config::NavConfig;
pub use error::{NavError, Result};
pub use geo::Coordinate;
pub use route::{LiveFix, Maneuver, Route, RouteStep};
pub use session::{NavigationSession, NavStatus, Snapshot};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging to logcat.
#[cfg(target_os = "android")]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("TurnKit"),
    );
}

#[cfg(not(target_os = "android"))]
pub(crate) fn init_logging() {
    // Hosts install their own logger
}
