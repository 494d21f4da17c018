//! Voice guidance scheduling.
//!
//! An instruction is spoken when its step becomes active (or its text
//! changes under the same index after a recalculation), and once more
//! when the user closes within `voice_close_range_m` unless the first
//! announcement was already that close. At most two announcements per
//! instruction.

use serde::Serialize;

use crate::config::NavConfig;
use crate::route::Route;
use crate::state::TrackingState;
use crate::units::spoken_distance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UtteranceKind {
    Start,
    /// Instruction announced ahead of the close range, with distance.
    Early,
    /// Instruction announced right before the maneuver.
    Close,
    Recalculating,
    Arrival,
}

/// A request for the voice collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Utterance {
    pub text: String,
    pub locale: String,
    pub rate: f32,
    pub kind: UtteranceKind,
}

impl Utterance {
    pub fn new(text: impl Into<String>, kind: UtteranceKind, config: &NavConfig) -> Self {
        Self {
            text: text.into(),
            locale: config.voice_locale.clone(),
            rate: config.voice_rate,
            kind,
        }
    }
}

pub fn start_announcement(config: &NavConfig) -> Utterance {
    Utterance::new("Driving mode started.", UtteranceKind::Start, config)
}

pub fn recalculating_announcement(config: &NavConfig) -> Utterance {
    Utterance::new("Recalculating.", UtteranceKind::Recalculating, config)
}

pub fn arrival_announcement(config: &NavConfig) -> Utterance {
    Utterance::new(
        "You have arrived at your destination.",
        UtteranceKind::Arrival,
        config,
    )
}

/// Decide whether the active step's instruction should be spoken for a
/// fix `distance_m` away from its maneuver point.
pub fn schedule(
    state: &mut TrackingState,
    route: &Route,
    distance_m: f64,
    config: &NavConfig,
) -> Option<Utterance> {
    if !state.is_guiding() {
        return None;
    }

    let index = state.active_step_index;
    let step = route.steps.get(index)?;
    let within_close = distance_m <= config.voice_close_range_m;

    let is_new = state.last_spoken_step_index != Some(index)
        || state.last_spoken_instruction.as_deref() != Some(step.instruction.as_str());

    if !is_new && (state.spoken_close || !within_close) {
        return None;
    }

    state.last_spoken_step_index = Some(index);
    state.last_spoken_instruction = Some(step.instruction.clone());
    state.spoken_close = within_close;

    let utterance = if within_close {
        Utterance::new(step.instruction.clone(), UtteranceKind::Close, config)
    } else {
        let text = format!(
            "In {}, {}",
            spoken_distance(distance_m, config.units),
            lowercase_first(&step.instruction)
        );
        Utterance::new(text, UtteranceKind::Early, config)
    };

    log::debug!("Announcing step {index}: {}", utterance.text);
    Some(utterance)
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
