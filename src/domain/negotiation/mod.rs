//! Negotiation bounded context - offer/answer exchange for one peer connection

pub mod candidate_buffer;
pub mod controller;
pub mod encoding;
pub mod engine;
pub mod health;
pub mod session;
pub mod strategy;
pub mod subscription;
pub mod value_object;

pub use candidate_buffer::{CandidateDisposition, FlushReport, IceCandidateBuffer};
pub use controller::NegotiationController;
pub use encoding::{EncodingPolicy, SimulcastEncoding, SIMULCAST_ENCODINGS};
pub use engine::{EngineResult, RtcEngine};
pub use health::{ConnectionHealthClassifier, HealthClassification, HealthEvent, HealthEventKind};
pub use session::{Session, SessionConfig, SessionSnapshot};
pub use strategy::{select_strategy, LegacyStrategy, NegotiationStrategy, TransceiverStrategy};
pub use subscription::{Subscribers, Subscription};
pub use value_object::{
    IceCandidate, IceConnectionState, IceServer, LocalTrack, MediaConstraints, MediaKind,
    MediaMode, MediaStream, OfferOptions, SdpType, SendEncoding, SessionDescription,
    SignalingState, TransceiverDirection, TransceiverInfo, TransceiverInit,
};
