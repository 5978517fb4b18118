//! Domain event primitives

use super::value_objects::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Something that happened to a negotiation session
pub trait DomainEvent: Send + Sync {
    /// Stable name, as delivered to callers
    fn event_type(&self) -> &'static str;

    fn metadata(&self) -> &EventMetadata;

    fn occurred_at(&self) -> DateTime<Utc> {
        self.metadata().occurred_at
    }

    /// Session the event was raised for, once attached
    fn session_id(&self) -> Option<&SessionId> {
        self.metadata().session_id.as_ref()
    }
}

/// Identity and timing carried by every event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

impl EventMetadata {
    pub fn now() -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            session_id: None,
        }
    }

    pub fn for_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::now()
    }
}
