//! Scripted in-memory engine shared by the integration tests
//!
//! Mirrors the signaling state machine of a real peer connection, records
//! every call it receives and lets tests fire local candidates and ICE
//! transitions by hand.

#![allow(dead_code)]

use async_trait::async_trait;
use negotiator::domain::negotiation::engine::{
    EngineResult, OnIceConnectionStateChange, OnLocalCandidate, OnSignalingStateChange, RtcEngine,
};
use negotiator::domain::negotiation::{
    IceCandidate, IceConnectionState, LocalTrack, MediaKind, OfferOptions, SdpType,
    SessionDescription, SignalingState, TransceiverDirection, TransceiverInfo, TransceiverInit,
};
use negotiator::EngineError;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    AddTransceiverFromTrack(LocalTrack, TransceiverInit),
    AddTransceiverFromKind(MediaKind, TransceiverInit),
    AddTrack(LocalTrack, String),
    SetTransceiverDirection(usize, TransceiverDirection),
    CreateOffer(Option<OfferOptions>),
    CreateAnswer,
    SetLocalDescription(SessionDescription),
    SetRemoteDescription(SessionDescription),
    AddIceCandidate(IceCandidate),
    Close,
}

/// Transceiver as created through the engine, with its init parameters
#[derive(Debug, Clone, PartialEq)]
pub struct FakeTransceiver {
    pub kind: MediaKind,
    pub direction: TransceiverDirection,
    pub track: Option<LocalTrack>,
    pub init: Option<TransceiverInit>,
}

#[derive(Default)]
struct State {
    signaling: SignalingState,
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
    transceivers: Vec<FakeTransceiver>,
    tracks: Vec<LocalTrack>,
    calls: Vec<Call>,
    applied: Vec<IceCandidate>,
    failing_candidates: HashSet<String>,
    remote_failure: Option<EngineError>,
    forget_local_description: bool,
}

pub struct FakeEngine {
    transceiver_capable: bool,
    state: Mutex<State>,
    signaling_handler: Mutex<Option<OnSignalingStateChange>>,
    candidate_handler: Mutex<Option<OnLocalCandidate>>,
    ice_handler: Mutex<Option<OnIceConnectionStateChange>>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::build(true))
    }

    /// Engine without transceiver control
    pub fn legacy() -> Arc<Self> {
        Arc::new(Self::build(false))
    }

    fn build(transceiver_capable: bool) -> Self {
        Self {
            transceiver_capable,
            state: Mutex::new(State::default()),
            signaling_handler: Mutex::new(None),
            candidate_handler: Mutex::new(None),
            ice_handler: Mutex::new(None),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.state().calls.iter().filter(|&c| matches(c)).count()
    }

    pub fn applied_candidates(&self) -> Vec<IceCandidate> {
        self.state().applied.clone()
    }

    pub fn fake_transceivers(&self) -> Vec<FakeTransceiver> {
        self.state().transceivers.clone()
    }

    pub fn attached_tracks(&self) -> Vec<LocalTrack> {
        self.state().tracks.clone()
    }

    pub fn fail_candidate(&self, candidate: &str) {
        self.state().failing_candidates.insert(candidate.to_string());
    }

    pub fn fail_remote_descriptions(&self, error: EngineError) {
        self.state().remote_failure = Some(error);
    }

    /// Accept local descriptions without retaining them
    pub fn forget_local_descriptions(&self) {
        self.state().forget_local_description = true;
    }

    /// Force a signaling transition, notifying the installed handler
    pub async fn transition(&self, state: SignalingState) {
        self.state().signaling = state;
        self.notify_signaling(state).await;
    }

    /// Mark a remote description as present without a transition
    pub fn set_remote_present(&self, sdp: &str) {
        self.state().remote = Some(SessionDescription::answer(sdp));
    }

    pub async fn gather(&self, candidate: Option<IceCandidate>) {
        let future = self
            .candidate_handler
            .lock()
            .unwrap()
            .as_mut()
            .map(|handler| handler(candidate));
        if let Some(future) = future {
            future.await;
        }
    }

    pub async fn ice_transition(&self, state: IceConnectionState) {
        let future = self
            .ice_handler
            .lock()
            .unwrap()
            .as_mut()
            .map(|handler| handler(state));
        if let Some(future) = future {
            future.await;
        }
    }

    async fn notify_signaling(&self, state: SignalingState) {
        let future = self
            .signaling_handler
            .lock()
            .unwrap()
            .as_mut()
            .map(|handler| handler(state));
        if let Some(future) = future {
            future.await;
        }
    }

    fn record(&self, call: Call) -> EngineResult<()> {
        let mut state = self.state();
        state.calls.push(call);
        if state.signaling.is_terminal() {
            return Err(EngineError::Closed);
        }
        Ok(())
    }

    /// SDP body listing one media line per kind
    fn describe(kinds: impl Iterator<Item = MediaKind>) -> String {
        let mut sdp = String::from("v=0\r\n");
        for kind in kinds {
            sdp.push_str(&format!("m={}\r\n", kind));
        }
        sdp
    }
}

#[async_trait]
impl RtcEngine for FakeEngine {
    fn supports_transceivers(&self) -> bool {
        self.transceiver_capable
    }

    fn signaling_state(&self) -> SignalingState {
        self.state().signaling
    }

    async fn add_transceiver_from_track(
        &self,
        track: LocalTrack,
        init: TransceiverInit,
    ) -> EngineResult<()> {
        self.record(Call::AddTransceiverFromTrack(track.clone(), init.clone()))?;
        self.state().transceivers.push(FakeTransceiver {
            kind: track.kind,
            direction: init.direction,
            track: Some(track),
            init: Some(init),
        });
        Ok(())
    }

    async fn add_transceiver_from_kind(
        &self,
        kind: MediaKind,
        init: TransceiverInit,
    ) -> EngineResult<()> {
        self.record(Call::AddTransceiverFromKind(kind, init.clone()))?;
        self.state().transceivers.push(FakeTransceiver {
            kind,
            direction: init.direction,
            track: None,
            init: Some(init),
        });
        Ok(())
    }

    async fn add_track(&self, track: LocalTrack, stream_id: String) -> EngineResult<()> {
        self.record(Call::AddTrack(track.clone(), stream_id))?;
        self.state().tracks.push(track);
        Ok(())
    }

    async fn transceivers(&self) -> Vec<TransceiverInfo> {
        self.state()
            .transceivers
            .iter()
            .enumerate()
            .map(|(index, t)| TransceiverInfo {
                index,
                mid: Some(index.to_string()),
                kind: t.kind,
                direction: t.direction,
            })
            .collect()
    }

    async fn set_transceiver_direction(
        &self,
        index: usize,
        direction: TransceiverDirection,
    ) -> EngineResult<()> {
        self.record(Call::SetTransceiverDirection(index, direction))?;
        let mut state = self.state();
        let transceiver = state
            .transceivers
            .get_mut(index)
            .ok_or_else(|| EngineError::Rejected(format!("no transceiver at {}", index)))?;
        transceiver.direction = direction;
        Ok(())
    }

    async fn create_offer(&self, options: Option<OfferOptions>) -> EngineResult<SessionDescription> {
        self.record(Call::CreateOffer(options))?;
        let state = self.state();
        let mut kinds: Vec<MediaKind> = state.transceivers.iter().map(|t| t.kind).collect();
        kinds.extend(state.tracks.iter().map(|t| t.kind));
        if let Some(options) = options {
            if options.offer_to_receive_audio && !kinds.contains(&MediaKind::Audio) {
                kinds.push(MediaKind::Audio);
            }
            if options.offer_to_receive_video && !kinds.contains(&MediaKind::Video) {
                kinds.push(MediaKind::Video);
            }
        }
        Ok(SessionDescription::offer(Self::describe(kinds.into_iter())))
    }

    async fn create_answer(&self) -> EngineResult<SessionDescription> {
        self.record(Call::CreateAnswer)?;
        let state = self.state();
        if state.signaling != SignalingState::HaveRemoteOffer {
            return Err(EngineError::Rejected("no remote offer".to_string()));
        }
        let kinds: Vec<MediaKind> = state.transceivers.iter().map(|t| t.kind).collect();
        Ok(SessionDescription::answer(Self::describe(kinds.into_iter())))
    }

    async fn set_local_description(&self, description: SessionDescription) -> EngineResult<()> {
        self.record(Call::SetLocalDescription(description.clone()))?;
        let next = {
            let mut state = self.state();
            let next = match (state.signaling, description.sdp_type) {
                (SignalingState::Stable, SdpType::Offer) => SignalingState::HaveLocalOffer,
                (SignalingState::HaveRemoteOffer, SdpType::Answer) => SignalingState::Stable,
                (current, sdp_type) => {
                    return Err(EngineError::Rejected(format!(
                        "cannot set local {:?} in {}",
                        sdp_type, current
                    )))
                }
            };
            state.signaling = next;
            if !state.forget_local_description {
                state.local = Some(description);
            }
            next
        };
        self.notify_signaling(next).await;
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> EngineResult<()> {
        self.record(Call::SetRemoteDescription(description.clone()))?;
        let next = {
            let mut state = self.state();
            if let Some(error) = state.remote_failure.clone() {
                return Err(error);
            }
            let next = match (state.signaling, description.sdp_type) {
                (SignalingState::Stable, SdpType::Offer) => SignalingState::HaveRemoteOffer,
                (SignalingState::HaveLocalOffer, SdpType::Answer) => SignalingState::Stable,
                (current, sdp_type) => {
                    return Err(EngineError::Rejected(format!(
                        "cannot set remote {:?} in {}",
                        sdp_type, current
                    )))
                }
            };

            // Offered media lines without a transceiver get a receiving one
            if description.sdp_type == SdpType::Offer {
                for kind in MediaKind::ALL {
                    let offered = description.sdp.contains(&format!("m={}", kind));
                    let present = state.transceivers.iter().any(|t| t.kind == kind);
                    if offered && !present {
                        state.transceivers.push(FakeTransceiver {
                            kind,
                            direction: TransceiverDirection::RecvOnly,
                            track: None,
                            init: None,
                        });
                    }
                }
            }

            state.signaling = next;
            state.remote = Some(description);
            next
        };
        self.notify_signaling(next).await;
        Ok(())
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        self.state().local.clone()
    }

    async fn remote_description(&self) -> Option<SessionDescription> {
        self.state().remote.clone()
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> EngineResult<()> {
        self.record(Call::AddIceCandidate(candidate.clone()))?;
        let mut state = self.state();
        if state.failing_candidates.contains(&candidate.candidate) {
            return Err(EngineError::Rejected(format!(
                "bad candidate {}",
                candidate.candidate
            )));
        }
        state.applied.push(candidate);
        Ok(())
    }

    async fn close(&self) -> EngineResult<()> {
        self.state().calls.push(Call::Close);
        self.transition(SignalingState::Closed).await;
        Ok(())
    }

    fn on_signaling_state_change(&self, handler: OnSignalingStateChange) {
        *self.signaling_handler.lock().unwrap() = Some(handler);
    }

    fn on_ice_candidate(&self, handler: OnLocalCandidate) {
        *self.candidate_handler.lock().unwrap() = Some(handler);
    }

    fn on_ice_connection_state_change(&self, handler: OnIceConnectionStateChange) {
        *self.ice_handler.lock().unwrap() = Some(handler);
    }
}

pub fn candidate(n: u32) -> IceCandidate {
    IceCandidate::new(format!(
        "candidate:{} 1 UDP 2122260223 192.168.1.{} 5000{} typ host",
        n, n, n
    ))
    .with_mid("0", 0)
}
