//! Domain layer - Core negotiation logic and rules
//!
//! This layer contains:
//! - Value Objects: descriptions, candidates, media modes
//! - Domain Services: strategies, candidate buffering, health classification
//! - Ports: the real-time engine the controller drives
//! - Domain Events: connectivity health events

pub mod negotiation;
pub mod shared;

// Re-export commonly used types
pub use shared::{NegotiationError, Result};
