//! Real-time engine port
//!
//! The controller drives the engine through this small operation set and
//! never looks inside it. ICE, DTLS and SRTP all happen behind this trait.
//! Implemented in the infrastructure layer (adapter).

use crate::domain::negotiation::value_object::{
    IceCandidate, IceConnectionState, LocalTrack, MediaKind, OfferOptions, SessionDescription,
    SignalingState, TransceiverDirection, TransceiverInfo, TransceiverInit,
};
use crate::domain::shared::error::EngineError;
use async_trait::async_trait;
use futures::future::BoxFuture;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Invoked on every signaling state transition
pub type OnSignalingStateChange =
    Box<dyn FnMut(SignalingState) -> BoxFuture<'static, ()> + Send + Sync>;

/// Invoked for each gathered local candidate; `None` marks end of gathering
pub type OnLocalCandidate =
    Box<dyn FnMut(Option<IceCandidate>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Invoked on every ICE connectivity transition
pub type OnIceConnectionStateChange =
    Box<dyn FnMut(IceConnectionState) -> BoxFuture<'static, ()> + Send + Sync>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RtcEngine: Send + Sync {
    /// Whether transceivers can be created and steered explicitly
    ///
    /// Probed once when a controller is constructed.
    fn supports_transceivers(&self) -> bool;

    /// Current signaling state
    fn signaling_state(&self) -> SignalingState;

    /// Add a sending transceiver for a local track
    async fn add_transceiver_from_track(
        &self,
        track: LocalTrack,
        init: TransceiverInit,
    ) -> EngineResult<()>;

    /// Add a transceiver with no local track
    async fn add_transceiver_from_kind(
        &self,
        kind: MediaKind,
        init: TransceiverInit,
    ) -> EngineResult<()>;

    /// Attach a track directly, without transceiver control
    async fn add_track(&self, track: LocalTrack, stream_id: String) -> EngineResult<()>;

    /// Existing transceivers, in creation order
    async fn transceivers(&self) -> Vec<TransceiverInfo>;

    async fn set_transceiver_direction(
        &self,
        index: usize,
        direction: TransceiverDirection,
    ) -> EngineResult<()>;

    async fn create_offer(&self, options: Option<OfferOptions>)
        -> EngineResult<SessionDescription>;

    async fn create_answer(&self) -> EngineResult<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> EngineResult<()>;

    async fn set_remote_description(&self, description: SessionDescription)
        -> EngineResult<()>;

    async fn local_description(&self) -> Option<SessionDescription>;

    async fn remote_description(&self) -> Option<SessionDescription>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> EngineResult<()>;

    async fn close(&self) -> EngineResult<()>;

    fn on_signaling_state_change(&self, handler: OnSignalingStateChange);

    fn on_ice_candidate(&self, handler: OnLocalCandidate);

    fn on_ice_connection_state_change(&self, handler: OnIceConnectionStateChange);
}
