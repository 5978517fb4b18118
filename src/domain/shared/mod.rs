//! Shared kernel - Common types used across the negotiation context

pub mod error;
pub mod events;
pub mod result;
pub mod value_objects;

pub use error::{EngineError, NegotiationError};
pub use result::Result;
pub use value_objects::*;
