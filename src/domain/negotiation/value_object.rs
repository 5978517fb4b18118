//! Negotiation value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Media direction a session participates in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaMode {
    SendOnly,
    ReceiveOnly,
    #[default]
    SendReceive,
}

impl MediaMode {
    pub fn sends(&self) -> bool {
        !matches!(self, MediaMode::ReceiveOnly)
    }

    pub fn receives(&self) -> bool {
        !matches!(self, MediaMode::SendOnly)
    }
}

impl fmt::Display for MediaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MediaMode::SendOnly => "send-only",
            MediaMode::ReceiveOnly => "receive-only",
            MediaMode::SendReceive => "send-receive",
        };
        write!(f, "{}", s)
    }
}

/// Media kinds this core negotiates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Kinds in negotiation order
    pub const ALL: [MediaKind; 2] = [MediaKind::Audio, MediaKind::Video];
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Which media kinds the session participates in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl MediaConstraints {
    pub fn new(audio: bool, video: bool) -> Self {
        Self { audio, video }
    }

    pub fn audio_only() -> Self {
        Self::new(true, false)
    }

    pub fn audio_video() -> Self {
        Self::new(true, true)
    }

    pub fn wants(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Audio => self.audio,
            MediaKind::Video => self.video,
        }
    }

    /// Requested kinds, audio first
    pub fn kinds(&self) -> impl Iterator<Item = MediaKind> + '_ {
        MediaKind::ALL.into_iter().filter(move |kind| self.wants(*kind))
    }
}

/// Transceiver direction as understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransceiverDirection {
    SendRecv,
    SendOnly,
    RecvOnly,
    Inactive,
}

impl From<MediaMode> for TransceiverDirection {
    fn from(mode: MediaMode) -> Self {
        match mode {
            MediaMode::SendOnly => TransceiverDirection::SendOnly,
            MediaMode::ReceiveOnly => TransceiverDirection::RecvOnly,
            MediaMode::SendReceive => TransceiverDirection::SendRecv,
        }
    }
}

/// Signaling state mirrored from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalingState {
    #[default]
    Stable,
    HaveLocalOffer,
    HaveRemoteOffer,
    HaveLocalPranswer,
    HaveRemotePranswer,
    Closed,
}

impl SignalingState {
    pub fn is_stable(&self) -> bool {
        matches!(self, SignalingState::Stable)
    }

    /// `closed` is the only terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, SignalingState::Closed)
    }
}

impl fmt::Display for SignalingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalingState::Stable => "stable",
            SignalingState::HaveLocalOffer => "have-local-offer",
            SignalingState::HaveRemoteOffer => "have-remote-offer",
            SignalingState::HaveLocalPranswer => "have-local-pranswer",
            SignalingState::HaveRemotePranswer => "have-remote-pranswer",
            SignalingState::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}

/// Raw ICE connectivity state reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IceConnectionState {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

impl fmt::Display for IceConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IceConnectionState::New => "new",
            IceConnectionState::Checking => "checking",
            IceConnectionState::Connected => "connected",
            IceConnectionState::Completed => "completed",
            IceConnectionState::Disconnected => "disconnected",
            IceConnectionState::Failed => "failed",
            IceConnectionState::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}

/// SDP payload type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

/// Opaque SDP text tagged with its type
///
/// The SDP body is never parsed or rewritten here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn new(sdp_type: SdpType, sdp: impl Into<String>) -> Self {
        Self {
            sdp_type,
            sdp: sdp.into(),
        }
    }

    pub fn offer(sdp: impl Into<String>) -> Self {
        Self::new(SdpType::Offer, sdp)
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self::new(SdpType::Answer, sdp)
    }
}

/// ICE candidate forwarded verbatim between the engine and the signaling transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_mline_index: Option<u16>,
    #[serde(default)]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_mline_index: None,
            username_fragment: None,
        }
    }

    pub fn with_mid(mut self, sdp_mid: impl Into<String>, sdp_mline_index: u16) -> Self {
        self.sdp_mid = Some(sdp_mid.into());
        self.sdp_mline_index = Some(sdp_mline_index);
        self
    }
}

/// ICE server descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    pub urls: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
}

impl IceServer {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }

    pub fn turn(
        url: impl Into<String>,
        username: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            urls: vec![url.into()],
            username: Some(username.into()),
            credential: Some(credential.into()),
        }
    }

    pub fn is_turn(&self) -> bool {
        self.urls
            .iter()
            .any(|url| url.starts_with("turn:") || url.starts_with("turns:"))
    }

    /// Built-in discovery list used when the caller supplies none
    pub fn default_servers() -> Vec<IceServer> {
        vec![IceServer {
            urls: vec![
                "stun:stun.l.google.com:19302".to_string(),
                "stun:stun1.l.google.com:19302".to_string(),
            ],
            username: None,
            credential: None,
        }]
    }
}

/// A local track offered for sending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalTrack {
    pub id: String,
    pub kind: MediaKind,
}

impl LocalTrack {
    pub fn new(id: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn audio(id: impl Into<String>) -> Self {
        Self::new(id, MediaKind::Audio)
    }

    pub fn video(id: impl Into<String>) -> Self {
        Self::new(id, MediaKind::Video)
    }
}

/// Handle to a local media stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStream {
    pub id: String,
    pub tracks: Vec<LocalTrack>,
}

impl MediaStream {
    pub fn new(id: impl Into<String>, tracks: Vec<LocalTrack>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    /// Fresh empty stream that receive-only transceivers are bound to
    pub fn placeholder() -> Self {
        Self::new(Uuid::new_v4().to_string(), Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// One entry of the send-encoding parameters attached to a transceiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEncoding {
    pub rid: String,
    pub max_bitrate: u32,
    pub scale_resolution_down_by: f64,
}

/// Parameters for a new transceiver
#[derive(Debug, Clone, PartialEq)]
pub struct TransceiverInit {
    pub direction: TransceiverDirection,
    pub send_encodings: Vec<SendEncoding>,
    pub stream_ids: Vec<String>,
}

impl TransceiverInit {
    pub fn new(direction: TransceiverDirection) -> Self {
        Self {
            direction,
            send_encodings: Vec::new(),
            stream_ids: Vec::new(),
        }
    }

    pub fn with_stream(mut self, stream_id: impl Into<String>) -> Self {
        self.stream_ids.push(stream_id.into());
        self
    }

    pub fn with_encodings(mut self, encodings: Vec<SendEncoding>) -> Self {
        self.send_encodings = encodings;
        self
    }
}

/// Engine-side view of an existing transceiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransceiverInfo {
    pub index: usize,
    pub mid: Option<String>,
    /// Kind of the receiver track
    pub kind: MediaKind,
    pub direction: TransceiverDirection,
}

/// Options for offers on engines without transceiver control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OfferOptions {
    pub offer_to_receive_audio: bool,
    pub offer_to_receive_video: bool,
    pub ice_restart: bool,
}
