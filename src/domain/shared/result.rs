//! Negotiation result type

use super::error::NegotiationError;

/// Standard result type for negotiation operations
pub type Result<T> = std::result::Result<T, NegotiationError>;
