//! Render projection input and a plain-text projection.
//!
//! Front-ends never see a [`Session`] directly. After every state change
//! the engine publishes a [`SessionSnapshot`], a self-contained copy of
//! everything a renderer needs, and the renderer redraws from it in full.

use crate::character::TraitSet;
use crate::message::Message;
use crate::metrics::{Gauge, GaugeStyle};
use crate::session::{Phase, Session, SessionId};
use crate::theme::{Palette, StoryId};
use serde::Serialize;

/// One gauge as a renderer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GaugeReading {
    pub name: String,
    pub label: String,
    pub value: i32,
    pub min: i32,
    pub max: i32,
    pub style: GaugeStyle,
    pub alert: bool,
}

impl GaugeReading {
    fn from_gauge(gauge: &Gauge) -> Self {
        let spec = gauge.spec();
        Self {
            name: spec.name.clone(),
            label: spec.label.clone(),
            value: gauge.value(),
            min: spec.min,
            max: spec.max,
            style: spec.style,
            alert: gauge.is_alert(),
        }
    }

    /// Fraction of the range covered, in `[0, 1]`.
    pub fn ratio(&self) -> f64 {
        let span = (self.max - self.min) as f64;
        if span <= 0.0 {
            return 1.0;
        }
        (self.value - self.min) as f64 / span
    }
}

/// Everything a renderer needs, copied out of the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub story: StoryId,
    pub title: String,
    pub palette: Palette,
    pub player_name: String,
    pub traits: TraitSet,
    pub metrics: Vec<GaugeReading>,
    pub messages: Vec<Message>,
    pub phase: Phase,
    pub turns: u64,
}

impl SessionSnapshot {
    pub fn from_session(session: &Session) -> Self {
        let theme = session.theme();
        Self {
            session_id: session.id(),
            story: theme.story,
            title: theme.title.to_string(),
            palette: theme.palette,
            player_name: session.player_name().to_string(),
            traits: *session.traits(),
            metrics: session
                .metrics()
                .gauges()
                .iter()
                .map(GaugeReading::from_gauge)
                .collect(),
            messages: session.messages().as_slice().to_vec(),
            phase: session.phase(),
            turns: session.turns(),
        }
    }

    pub fn gauge(&self, name: &str) -> Option<&GaugeReading> {
        self.metrics.iter().find(|g| g.name == name)
    }

    pub fn is_processing(&self) -> bool {
        self.phase == Phase::AwaitingCompletion
    }

    /// The message log as `SENDER: text` paragraphs.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.sender.label(), m.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// One line summarising the turn count and every gauge.
    pub fn status_line(&self) -> String {
        let mut parts = vec![format!("Turn {}", self.turns)];
        parts.extend(
            self.metrics
                .iter()
                .map(|g| format!("{}: {}/{}", g.label, g.value, g.max)),
        );
        parts.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Sender;

    fn session() -> Session {
        Session::initialize(TraitSet::default(), StoryId::SpaceAdventure, "Parker", "k").unwrap()
    }

    #[test]
    fn test_snapshot_copies_state() {
        let session = session();
        let snapshot = SessionSnapshot::from_session(&session);

        assert_eq!(snapshot.session_id, session.id());
        assert_eq!(snapshot.title, "A Space Adventure");
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.gauge("stress").unwrap().value, 50);
        assert_eq!(snapshot.gauge("danger").unwrap().style, GaugeStyle::Pips);
        assert!(!snapshot.is_processing());
    }

    #[test]
    fn test_transcript_and_status_line() {
        let mut session = session();
        session.append_message(Sender::Player, "check the radio").unwrap();
        let snapshot = SessionSnapshot::from_session(&session);

        let transcript = snapshot.transcript();
        assert!(transcript.starts_with("GAMEMASTER: Welcome, Parker"));
        assert!(transcript.ends_with("\n\nPLAYER: check the radio"));
        assert_eq!(
            snapshot.status_line(),
            "Turn 0 | Stress Level: 50/100 | Danger Level: 0/10"
        );
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = SessionSnapshot::from_session(&session());
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["story"], "space-adventure");
        assert_eq!(json["phase"], "idle");
        assert_eq!(json["metrics"][0]["name"], "stress");
        assert_eq!(json["messages"][0]["sender"], "narrator");
    }
}
