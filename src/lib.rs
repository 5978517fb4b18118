//! Negotiator - WebRTC offer/answer negotiation for a single endpoint
//!
//! A Domain-Driven Design (DDD) implementation of a negotiation controller
//! that creates and applies session descriptions, buffers trickled ICE
//! candidates until the signaling state allows them, and classifies
//! connectivity health. The real-time engine sits behind a port; a webrtc-rs
//! adapter is provided with the `webrtc-engine` feature.

pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use domain::negotiation::{NegotiationController, SessionConfig};
pub use domain::shared::error::{EngineError, NegotiationError};
pub use domain::shared::result::Result;
