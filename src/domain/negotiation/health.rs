//! Connection health classification
//!
//! Maps raw ICE connectivity transitions to session-level health events.
//! Never mutates session state and never retries; the caller decides whether
//! to renegotiate or tear down.

use crate::domain::negotiation::value_object::IceConnectionState;
use crate::domain::shared::events::{DomainEvent, EventMetadata};
use crate::domain::shared::value_objects::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

/// Severity of a connectivity transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthClassification {
    Informational,
    /// Possibly transient network loss
    Degraded,
    /// Fatal for this connection
    Fatal,
    Terminal,
}

/// Kind of health notification delivered to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthEventKind {
    #[serde(rename = "ICE_CONNECTION_DISCONNECTED")]
    IceConnectionDisconnected,
    #[serde(rename = "ICE_CONNECTION_FAILED")]
    IceConnectionFailed,
}

impl HealthEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthEventKind::IceConnectionDisconnected => "ICE_CONNECTION_DISCONNECTED",
            HealthEventKind::IceConnectionFailed => "ICE_CONNECTION_FAILED",
        }
    }
}

impl std::fmt::Display for HealthEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connectivity notification; delivered through a callback, never as an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthEvent {
    pub metadata: EventMetadata,
    pub kind: HealthEventKind,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl HealthEvent {
    pub fn new(kind: HealthEventKind, message: impl Into<String>) -> Self {
        Self {
            metadata: EventMetadata::now(),
            kind,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn for_session(mut self, session_id: SessionId) -> Self {
        self.metadata = self.metadata.for_session(session_id);
        self
    }
}

impl DomainEvent for HealthEvent {
    fn event_type(&self) -> &'static str {
        self.kind.as_str()
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

/// Classifier bound to one peer label, used in log lines and event payloads
#[derive(Debug, Clone)]
pub struct ConnectionHealthClassifier {
    peer_label: String,
}

impl ConnectionHealthClassifier {
    pub fn new(peer_label: impl Into<String>) -> Self {
        Self {
            peer_label: peer_label.into(),
        }
    }

    pub fn peer_label(&self) -> &str {
        &self.peer_label
    }

    pub fn classify(state: IceConnectionState) -> HealthClassification {
        match state {
            IceConnectionState::New
            | IceConnectionState::Checking
            | IceConnectionState::Connected
            | IceConnectionState::Completed => HealthClassification::Informational,
            IceConnectionState::Disconnected => HealthClassification::Degraded,
            IceConnectionState::Failed => HealthClassification::Fatal,
            IceConnectionState::Closed => HealthClassification::Terminal,
        }
    }

    /// Classify a transition, log it, and build the event to emit if any
    pub fn observe(&self, state: IceConnectionState) -> Option<HealthEvent> {
        let classification = Self::classify(state);
        let kind = match classification {
            HealthClassification::Informational | HealthClassification::Terminal => {
                info!(peer = %self.peer_label, %state, "ICE connection state changed");
                return None;
            }
            HealthClassification::Degraded => {
                warn!(peer = %self.peer_label, %state, "ICE connection degraded");
                HealthEventKind::IceConnectionDisconnected
            }
            HealthClassification::Fatal => {
                warn!(peer = %self.peer_label, %state, "ICE connection failed");
                HealthEventKind::IceConnectionFailed
            }
        };

        let message = format!("ICE connection {} for {}", state, self.peer_label);
        Some(HealthEvent::new(kind, message).with_data(json!({
            "peer": self.peer_label,
            "state": state,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_table() {
        use IceConnectionState::*;

        for state in [New, Checking, Connected, Completed] {
            assert_eq!(
                ConnectionHealthClassifier::classify(state),
                HealthClassification::Informational
            );
        }
        assert_eq!(
            ConnectionHealthClassifier::classify(Disconnected),
            HealthClassification::Degraded
        );
        assert_eq!(ConnectionHealthClassifier::classify(Failed), HealthClassification::Fatal);
        assert_eq!(ConnectionHealthClassifier::classify(Closed), HealthClassification::Terminal);
    }

    #[test]
    fn test_only_disconnected_and_failed_emit() {
        let classifier = ConnectionHealthClassifier::new("remote");

        assert!(classifier.observe(IceConnectionState::Checking).is_none());
        assert!(classifier.observe(IceConnectionState::Closed).is_none());

        let event = classifier.observe(IceConnectionState::Disconnected).unwrap();
        assert_eq!(event.kind, HealthEventKind::IceConnectionDisconnected);
        assert_eq!(event.event_type(), "ICE_CONNECTION_DISCONNECTED");

        let event = classifier.observe(IceConnectionState::Failed).unwrap();
        assert_eq!(event.kind, HealthEventKind::IceConnectionFailed);
        let data = event.data.unwrap();
        assert_eq!(data["peer"], "remote");
        assert_eq!(data["state"], "failed");
    }

    #[test]
    fn test_event_kind_serializes_as_wire_name() {
        let json = serde_json::to_string(&HealthEventKind::IceConnectionFailed).unwrap();
        assert_eq!(json, "\"ICE_CONNECTION_FAILED\"");
    }
}
