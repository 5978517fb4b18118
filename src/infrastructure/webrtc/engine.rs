//! webrtc-rs implementation of the engine port

use super::convert::{
    engine_error, ice_connection_state, media_kind, rtc_description, session_description,
    transceiver_direction,
};
use crate::domain::negotiation::engine::{
    EngineResult, OnIceConnectionStateChange, OnLocalCandidate, OnSignalingStateChange, RtcEngine,
};
use crate::domain::negotiation::value_object::{
    IceCandidate, IceServer, LocalTrack, MediaKind, OfferOptions, SessionDescription,
    SignalingState, TransceiverDirection, TransceiverInfo, TransceiverInit,
};
use crate::domain::shared::error::EngineError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MediaEngine, MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::offer_answer_options::RTCOfferOptions;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_local::TrackLocal;

/// Engine backed by an `RTCPeerConnection`
///
/// Local tracks are materialised as sample tracks (Opus or VP8) and can be
/// fetched by id to push media into them.
pub struct WebRtcEngine {
    peer_connection: Arc<RTCPeerConnection>,
    tracks: Mutex<HashMap<String, Arc<TrackLocalStaticSample>>>,
}

impl WebRtcEngine {
    pub async fn new(ice_servers: &[IceServer]) -> EngineResult<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(engine_error)?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(engine_error)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let configuration = RTCConfiguration {
            ice_servers: ice_servers.iter().map(RTCIceServer::from).collect(),
            ..Default::default()
        };

        let peer_connection = api
            .new_peer_connection(configuration)
            .await
            .map_err(engine_error)?;

        debug!(servers = ice_servers.len(), "Peer connection created");
        Ok(Self {
            peer_connection: Arc::new(peer_connection),
            tracks: Mutex::new(HashMap::new()),
        })
    }

    pub fn peer_connection(&self) -> &Arc<RTCPeerConnection> {
        &self.peer_connection
    }

    /// Sample track created for a local track id
    pub async fn local_track(&self, id: &str) -> Option<Arc<TrackLocalStaticSample>> {
        self.tracks.lock().await.get(id).cloned()
    }

    async fn sample_track(&self, track: &LocalTrack, stream_id: String) -> Arc<TrackLocalStaticSample> {
        let mime_type = match track.kind {
            MediaKind::Audio => MIME_TYPE_OPUS,
            MediaKind::Video => MIME_TYPE_VP8,
        };
        let sample = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: mime_type.to_string(),
                ..Default::default()
            },
            track.id.clone(),
            stream_id,
        ));

        self.tracks
            .lock()
            .await
            .insert(track.id.clone(), Arc::clone(&sample));
        sample
    }
}

#[async_trait]
impl RtcEngine for WebRtcEngine {
    fn supports_transceivers(&self) -> bool {
        true
    }

    fn signaling_state(&self) -> SignalingState {
        self.peer_connection.signaling_state().into()
    }

    async fn add_transceiver_from_track(
        &self,
        track: LocalTrack,
        init: TransceiverInit,
    ) -> EngineResult<()> {
        let stream_id = init
            .stream_ids
            .first()
            .cloned()
            .unwrap_or_else(|| track.id.clone());
        let sample = self.sample_track(&track, stream_id).await;

        // Simulcast layers are negotiated through rids in SDP; webrtc-rs does
        // not take encodings on transceiver creation.
        if !init.send_encodings.is_empty() {
            debug!(
                track = %track.id,
                rids = ?init.send_encodings.iter().map(|e| e.rid.as_str()).collect::<Vec<_>>(),
                "Requested send encodings"
            );
        }

        self.peer_connection
            .add_transceiver_from_track(
                sample as Arc<dyn TrackLocal + Send + Sync>,
                Some(RTCRtpTransceiverInit {
                    direction: init.direction.into(),
                    send_encodings: vec![],
                }),
            )
            .await
            .map_err(engine_error)?;
        Ok(())
    }

    async fn add_transceiver_from_kind(
        &self,
        kind: MediaKind,
        init: TransceiverInit,
    ) -> EngineResult<()> {
        self.peer_connection
            .add_transceiver_from_kind(
                kind.into(),
                Some(RTCRtpTransceiverInit {
                    direction: init.direction.into(),
                    send_encodings: vec![],
                }),
            )
            .await
            .map_err(engine_error)?;
        Ok(())
    }

    async fn add_track(&self, track: LocalTrack, stream_id: String) -> EngineResult<()> {
        let sample = self.sample_track(&track, stream_id).await;
        self.peer_connection
            .add_track(sample as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map_err(engine_error)?;
        Ok(())
    }

    async fn transceivers(&self) -> Vec<TransceiverInfo> {
        self.peer_connection
            .get_transceivers()
            .await
            .iter()
            .enumerate()
            .filter_map(|(index, transceiver)| {
                Some(TransceiverInfo {
                    index,
                    mid: transceiver.mid().map(|mid| mid.to_string()),
                    kind: media_kind(transceiver.kind())?,
                    direction: transceiver_direction(transceiver.direction()),
                })
            })
            .collect()
    }

    async fn set_transceiver_direction(
        &self,
        index: usize,
        direction: TransceiverDirection,
    ) -> EngineResult<()> {
        let transceivers = self.peer_connection.get_transceivers().await;
        let transceiver = transceivers
            .get(index)
            .ok_or_else(|| EngineError::Rejected(format!("no transceiver at index {}", index)))?;
        transceiver.set_direction(direction.into()).await;
        Ok(())
    }

    async fn create_offer(&self, options: Option<OfferOptions>) -> EngineResult<SessionDescription> {
        // Receive flags have no webrtc-rs counterpart; only ice restart carries over
        let options = options.map(|o| RTCOfferOptions {
            ice_restart: o.ice_restart,
            ..Default::default()
        });
        let offer = self
            .peer_connection
            .create_offer(options)
            .await
            .map_err(engine_error)?;
        session_description(offer)
            .ok_or_else(|| EngineError::Rejected("offer without sdp type".to_string()))
    }

    async fn create_answer(&self) -> EngineResult<SessionDescription> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(engine_error)?;
        session_description(answer)
            .ok_or_else(|| EngineError::Rejected("answer without sdp type".to_string()))
    }

    async fn set_local_description(&self, description: SessionDescription) -> EngineResult<()> {
        self.peer_connection
            .set_local_description(rtc_description(description)?)
            .await
            .map_err(engine_error)
    }

    async fn set_remote_description(&self, description: SessionDescription) -> EngineResult<()> {
        self.peer_connection
            .set_remote_description(rtc_description(description)?)
            .await
            .map_err(engine_error)
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        self.peer_connection
            .local_description()
            .await
            .and_then(session_description)
    }

    async fn remote_description(&self) -> Option<SessionDescription> {
        self.peer_connection
            .remote_description()
            .await
            .and_then(session_description)
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> EngineResult<()> {
        self.peer_connection
            .add_ice_candidate(RTCIceCandidateInit::from(candidate))
            .await
            .map_err(engine_error)
    }

    async fn close(&self) -> EngineResult<()> {
        self.peer_connection.close().await.map_err(engine_error)
    }

    fn on_signaling_state_change(&self, mut handler: OnSignalingStateChange) {
        self.peer_connection
            .on_signaling_state_change(Box::new(move |state: RTCSignalingState| {
                // Detached so the handler may call back into the peer connection.
                // The controller drains again after each applied description.
                tokio::spawn(handler(state.into()));
                Box::pin(async {})
            }));
    }

    fn on_ice_candidate(&self, mut handler: OnLocalCandidate) {
        self.peer_connection
            .on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
                match candidate.map(|c| c.to_json()) {
                    Some(Ok(init)) => handler(Some(IceCandidate::from(init))),
                    Some(Err(e)) => {
                        warn!(error = %e, "Dropping local candidate that failed to serialize");
                        Box::pin(async {})
                    }
                    None => handler(None),
                }
            }));
    }

    fn on_ice_connection_state_change(&self, mut handler: OnIceConnectionStateChange) {
        self.peer_connection
            .on_ice_connection_state_change(Box::new(move |state: RTCIceConnectionState| {
                match ice_connection_state(state) {
                    Some(state) => handler(state),
                    None => Box::pin(async {}),
                }
            }));
    }
}
