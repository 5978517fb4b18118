//! Infrastructure layer - Technical implementations
//!
//! This layer contains:
//! - The webrtc-rs implementation of the engine port
//! - Tracing subscriber setup for binaries

pub mod telemetry;

#[cfg(feature = "webrtc-engine")]
pub mod webrtc;
