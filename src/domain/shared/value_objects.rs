//! Shared value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Session identifier
///
/// Opaque to the controller: callers may supply their own, otherwise a v4
/// UUID is generated. Immutable once the session exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_v4_uuids() {
        let id = SessionId::new();
        let parsed = Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_ne!(id, SessionId::new());
    }

    #[test]
    fn test_caller_supplied_id_is_kept_verbatim() {
        let id = SessionId::from("call-42");
        assert_eq!(id.as_str(), "call-42");
        assert_eq!(id.to_string(), "call-42");
    }
}
