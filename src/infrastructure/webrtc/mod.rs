//! WebRTC engine adapter built on webrtc-rs

mod convert;
pub mod engine;

pub use engine::WebRtcEngine;

use crate::domain::negotiation::controller::NegotiationController;
use crate::domain::negotiation::session::SessionConfig;
use crate::domain::shared::result::Result;
use std::sync::Arc;

impl NegotiationController {
    /// Build a controller over a fresh webrtc-rs peer connection
    ///
    /// The engine is returned as well so callers can reach its local tracks.
    pub async fn with_webrtc(config: SessionConfig) -> Result<(Self, Arc<WebRtcEngine>)> {
        let engine = Arc::new(WebRtcEngine::new(&config.resolved_ice_servers()).await?);
        let controller = NegotiationController::new(config, engine.clone());
        Ok((controller, engine))
    }
}
