//! Negotiation errors

use thiserror::Error;

/// Failures reported by the underlying real-time engine.
///
/// The controller forwards these unchanged from `process_remote_*` and from
/// candidate application; only failures observed after closure are rewritten
/// into [`NegotiationError::State`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("connection closed")]
    Closed,

    #[error("engine rejected operation: {0}")]
    Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    /// Required outgoing source missing for the requested mode
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Expected transceiver absent when answering
    #[error("Negotiation error: {0}")]
    Negotiation(String),

    /// Operation attempted after closure
    #[error("State error: {0}")]
    State(String),

    /// Local description absent after being set
    #[error("Description error: {0}")]
    Description(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl NegotiationError {
    pub fn closed() -> Self {
        NegotiationError::State("closed".to_string())
    }

    pub fn is_state(&self) -> bool {
        matches!(self, NegotiationError::State(_))
    }
}
