//! Buffered session output.
//!
//! `EventQueue` implements every collaborator trait by recording what the
//! session asked for. The JNI bridge drains it after each call and hands
//! the events to the app as JSON, where the real speech engine, router
//! and UI act on them.

use serde::Serialize;

use crate::error::Result;
use crate::session::{RouteRequest, RouteRequester, SessionObserver, Snapshot, VoiceOutput};
use crate::voice::Utterance;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Speak { utterance: Utterance },
    StopSpeech,
    RequestRoute { request: RouteRequest },
    Arrived,
    RouteFailure { reason: String },
}

/// Output of one bridge call: the snapshot, if a fix was processed, and
/// everything the session asked its collaborators to do.
#[derive(Debug, Clone, Serialize)]
pub struct Tick {
    pub snapshot: Option<Snapshot>,
    pub events: Vec<SessionEvent>,
}

impl Tick {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<SessionEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}

impl VoiceOutput for EventQueue {
    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        self.events.push(SessionEvent::Speak {
            utterance: utterance.clone(),
        });
        Ok(())
    }

    fn stop(&mut self) {
        self.events.push(SessionEvent::StopSpeech);
    }
}

impl RouteRequester for EventQueue {
    fn request_route(&mut self, request: RouteRequest) {
        self.events.push(SessionEvent::RequestRoute { request });
    }
}

impl SessionObserver for EventQueue {
    fn on_arrived(&mut self) {
        self.events.push(SessionEvent::Arrived);
    }

    fn on_route_failure(&mut self, reason: &str) {
        self.events.push(SessionEvent::RouteFailure {
            reason: reason.to_string(),
        });
    }
}
