//! Error type shared by route import, configuration and collaborators.
//!
//! Nothing in the per-fix pipeline returns these to the caller; the
//! session logs them and keeps going.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum NavError {
    /// Route geometry has too few points to navigate.
    InsufficientPoints { count: usize, minimum: usize },
    /// Route has no maneuver steps.
    NoSteps,
    /// The routing provider answered without a usable route.
    NoRoute { reason: String },
    /// GPX data could not be read.
    Gpx { message: String },
    /// JSON input could not be decoded.
    Json { message: String },
    /// Encoded polyline was malformed.
    Polyline { message: String },
    /// The voice collaborator failed to speak.
    Voice { message: String },
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavError::InsufficientPoints { count, minimum } => {
                write!(f, "Route has {count} points, minimum {minimum} required")
            }
            NavError::NoSteps => write!(f, "Route has no maneuver steps"),
            NavError::NoRoute { reason } => write!(f, "No route: {reason}"),
            NavError::Gpx { message } => write!(f, "GPX parse error: {message}"),
            NavError::Json { message } => write!(f, "JSON error: {message}"),
            NavError::Polyline { message } => write!(f, "Polyline decode error: {message}"),
            NavError::Voice { message } => write!(f, "Voice output error: {message}"),
        }
    }
}

impl std::error::Error for NavError {}

impl From<serde_json::Error> for NavError {
    fn from(e: serde_json::Error) -> Self {
        NavError::Json {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NavError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_insufficient_points() {
        let err = NavError::InsufficientPoints { count: 1, minimum: 2 };
        assert_eq!(err.to_string(), "Route has 1 points, minimum 2 required");
    }

    #[test]
    fn json_error_converts() {
        let err: NavError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, NavError::Json { .. }));
    }
}
