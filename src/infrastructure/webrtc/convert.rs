//! Conversions between negotiation value objects and webrtc-rs types

use crate::domain::negotiation::value_object::{
    IceCandidate, IceConnectionState, IceServer, MediaKind, SdpType, SessionDescription,
    SignalingState, TransceiverDirection,
};
use crate::domain::shared::error::EngineError;
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;

pub(crate) fn engine_error(err: webrtc::Error) -> EngineError {
    match err {
        webrtc::Error::ErrConnectionClosed => EngineError::Closed,
        other => EngineError::Rejected(other.to_string()),
    }
}

impl From<RTCSignalingState> for SignalingState {
    fn from(state: RTCSignalingState) -> Self {
        match state {
            // A fresh connection reports unspecified until its first transition
            RTCSignalingState::Unspecified | RTCSignalingState::Stable => SignalingState::Stable,
            RTCSignalingState::HaveLocalOffer => SignalingState::HaveLocalOffer,
            RTCSignalingState::HaveRemoteOffer => SignalingState::HaveRemoteOffer,
            RTCSignalingState::HaveLocalPranswer => SignalingState::HaveLocalPranswer,
            RTCSignalingState::HaveRemotePranswer => SignalingState::HaveRemotePranswer,
            RTCSignalingState::Closed => SignalingState::Closed,
        }
    }
}

pub(crate) fn ice_connection_state(state: RTCIceConnectionState) -> Option<IceConnectionState> {
    match state {
        RTCIceConnectionState::Unspecified => None,
        RTCIceConnectionState::New => Some(IceConnectionState::New),
        RTCIceConnectionState::Checking => Some(IceConnectionState::Checking),
        RTCIceConnectionState::Connected => Some(IceConnectionState::Connected),
        RTCIceConnectionState::Completed => Some(IceConnectionState::Completed),
        RTCIceConnectionState::Disconnected => Some(IceConnectionState::Disconnected),
        RTCIceConnectionState::Failed => Some(IceConnectionState::Failed),
        RTCIceConnectionState::Closed => Some(IceConnectionState::Closed),
    }
}

impl From<TransceiverDirection> for RTCRtpTransceiverDirection {
    fn from(direction: TransceiverDirection) -> Self {
        match direction {
            TransceiverDirection::SendRecv => RTCRtpTransceiverDirection::Sendrecv,
            TransceiverDirection::SendOnly => RTCRtpTransceiverDirection::Sendonly,
            TransceiverDirection::RecvOnly => RTCRtpTransceiverDirection::Recvonly,
            TransceiverDirection::Inactive => RTCRtpTransceiverDirection::Inactive,
        }
    }
}

pub(crate) fn transceiver_direction(
    direction: RTCRtpTransceiverDirection,
) -> TransceiverDirection {
    match direction {
        RTCRtpTransceiverDirection::Sendrecv => TransceiverDirection::SendRecv,
        RTCRtpTransceiverDirection::Sendonly => TransceiverDirection::SendOnly,
        RTCRtpTransceiverDirection::Recvonly => TransceiverDirection::RecvOnly,
        _ => TransceiverDirection::Inactive,
    }
}

impl From<MediaKind> for RTPCodecType {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Audio => RTPCodecType::Audio,
            MediaKind::Video => RTPCodecType::Video,
        }
    }
}

pub(crate) fn media_kind(kind: RTPCodecType) -> Option<MediaKind> {
    match kind {
        RTPCodecType::Audio => Some(MediaKind::Audio),
        RTPCodecType::Video => Some(MediaKind::Video),
        RTPCodecType::Unspecified => None,
    }
}

pub(crate) fn rtc_description(
    description: SessionDescription,
) -> Result<RTCSessionDescription, EngineError> {
    let result = match description.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(description.sdp),
        SdpType::Answer => RTCSessionDescription::answer(description.sdp),
        SdpType::Pranswer => RTCSessionDescription::pranswer(description.sdp),
        SdpType::Rollback => {
            let mut rollback = RTCSessionDescription::default();
            rollback.sdp_type = RTCSdpType::Rollback;
            Ok(rollback)
        }
    };
    result.map_err(engine_error)
}

pub(crate) fn session_description(description: RTCSessionDescription) -> Option<SessionDescription> {
    let sdp_type = match description.sdp_type {
        RTCSdpType::Offer => SdpType::Offer,
        RTCSdpType::Answer => SdpType::Answer,
        RTCSdpType::Pranswer => SdpType::Pranswer,
        RTCSdpType::Rollback => SdpType::Rollback,
        RTCSdpType::Unspecified => return None,
    };
    Some(SessionDescription::new(sdp_type, description.sdp))
}

impl From<IceCandidate> for RTCIceCandidateInit {
    fn from(candidate: IceCandidate) -> Self {
        RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_mline_index,
            username_fragment: candidate.username_fragment,
        }
    }
}

impl From<RTCIceCandidateInit> for IceCandidate {
    fn from(init: RTCIceCandidateInit) -> Self {
        IceCandidate {
            candidate: init.candidate,
            sdp_mid: init.sdp_mid,
            sdp_mline_index: init.sdp_mline_index,
            username_fragment: init.username_fragment,
        }
    }
}

impl From<&IceServer> for RTCIceServer {
    fn from(server: &IceServer) -> Self {
        RTCIceServer {
            urls: server.urls.clone(),
            username: server.username.clone().unwrap_or_default(),
            credential: server.credential.clone().unwrap_or_default(),
        }
    }
}
