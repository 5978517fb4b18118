//! Session data model and construction configuration

use crate::domain::negotiation::health::HealthEvent;
use crate::domain::negotiation::value_object::{
    IceCandidate, IceServer, MediaConstraints, MediaMode, MediaStream, SignalingState,
};
use crate::domain::shared::value_objects::SessionId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::Span;

/// Receives every local candidate the engine gathers
pub type IceCandidateCallback = Arc<dyn Fn(&IceCandidate) + Send + Sync>;

/// Receives connectivity health events
pub type ConnectivityExceptionCallback = Arc<dyn Fn(&HealthEvent) + Send + Sync>;

/// One logical peer connection
///
/// Every field is fixed at construction; mutable negotiation state lives in
/// the controller and mirrors the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    mode: MediaMode,
    media_constraints: MediaConstraints,
    simulcast_enabled: bool,
    ice_servers: Vec<IceServer>,
    outgoing_media_source: Option<MediaStream>,
}

impl Session {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn mode(&self) -> MediaMode {
        self.mode
    }

    pub fn media_constraints(&self) -> MediaConstraints {
        self.media_constraints
    }

    pub fn simulcast_enabled(&self) -> bool {
        self.simulcast_enabled
    }

    /// Never empty
    pub fn ice_servers(&self) -> &[IceServer] {
        &self.ice_servers
    }

    pub fn outgoing_media_source(&self) -> Option<&MediaStream> {
        self.outgoing_media_source.as_ref()
    }
}

/// Construction configuration for a negotiation session
///
/// Only `media_constraints`, `simulcast` and the two callbacks are required;
/// the rest fall back to the documented defaults.
#[derive(Clone)]
pub struct SessionConfig {
    pub media_constraints: MediaConstraints,
    pub simulcast: bool,
    pub ice_servers: Option<Vec<IceServer>>,
    pub outgoing_media_source: Option<MediaStream>,
    pub mode: Option<MediaMode>,
    pub id: Option<SessionId>,
    pub on_ice_candidate: IceCandidateCallback,
    pub on_connectivity_exception: ConnectivityExceptionCallback,
    pub span: Option<Span>,
}

impl SessionConfig {
    pub fn new<C, E>(
        media_constraints: MediaConstraints,
        simulcast: bool,
        on_ice_candidate: C,
        on_connectivity_exception: E,
    ) -> Self
    where
        C: Fn(&IceCandidate) + Send + Sync + 'static,
        E: Fn(&HealthEvent) + Send + Sync + 'static,
    {
        Self {
            media_constraints,
            simulcast,
            ice_servers: None,
            outgoing_media_source: None,
            mode: None,
            id: None,
            on_ice_candidate: Arc::new(on_ice_candidate),
            on_connectivity_exception: Arc::new(on_connectivity_exception),
            span: None,
        }
    }

    /// Sending-only session for `source`
    pub fn send_only<C, E>(
        media_constraints: MediaConstraints,
        simulcast: bool,
        source: MediaStream,
        on_ice_candidate: C,
        on_connectivity_exception: E,
    ) -> Self
    where
        C: Fn(&IceCandidate) + Send + Sync + 'static,
        E: Fn(&HealthEvent) + Send + Sync + 'static,
    {
        Self::new(media_constraints, simulcast, on_ice_candidate, on_connectivity_exception)
            .with_mode(MediaMode::SendOnly)
            .with_source(source)
    }

    pub fn receive_only<C, E>(
        media_constraints: MediaConstraints,
        on_ice_candidate: C,
        on_connectivity_exception: E,
    ) -> Self
    where
        C: Fn(&IceCandidate) + Send + Sync + 'static,
        E: Fn(&HealthEvent) + Send + Sync + 'static,
    {
        Self::new(media_constraints, false, on_ice_candidate, on_connectivity_exception)
            .with_mode(MediaMode::ReceiveOnly)
    }

    pub fn send_receive<C, E>(
        media_constraints: MediaConstraints,
        simulcast: bool,
        source: MediaStream,
        on_ice_candidate: C,
        on_connectivity_exception: E,
    ) -> Self
    where
        C: Fn(&IceCandidate) + Send + Sync + 'static,
        E: Fn(&HealthEvent) + Send + Sync + 'static,
    {
        Self::new(media_constraints, simulcast, on_ice_candidate, on_connectivity_exception)
            .with_mode(MediaMode::SendReceive)
            .with_source(source)
    }

    pub fn with_mode(mut self, mode: MediaMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_id(mut self, id: impl Into<SessionId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<IceServer>) -> Self {
        self.ice_servers = Some(ice_servers);
        self
    }

    pub fn with_source(mut self, source: MediaStream) -> Self {
        self.outgoing_media_source = Some(source);
        self
    }

    /// Span every operation of the session is recorded under
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// ICE servers the engine should be built with
    pub fn resolved_ice_servers(&self) -> Vec<IceServer> {
        match &self.ice_servers {
            Some(servers) if !servers.is_empty() => servers.clone(),
            _ => IceServer::default_servers(),
        }
    }

    /// Freeze the configuration into a session, applying defaults
    pub fn into_session(self) -> (Session, Callbacks) {
        let ice_servers = self.resolved_ice_servers();
        let session = Session {
            id: self.id.unwrap_or_default(),
            mode: self.mode.unwrap_or_default(),
            media_constraints: self.media_constraints,
            simulcast_enabled: self.simulcast,
            ice_servers,
            outgoing_media_source: self.outgoing_media_source,
        };
        let callbacks = Callbacks {
            on_ice_candidate: self.on_ice_candidate,
            on_connectivity_exception: self.on_connectivity_exception,
            span: self.span,
        };
        (session, callbacks)
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("media_constraints", &self.media_constraints)
            .field("simulcast", &self.simulcast)
            .field("ice_servers", &self.ice_servers)
            .field("outgoing_media_source", &self.outgoing_media_source)
            .field("mode", &self.mode)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Caller hooks split off a [`SessionConfig`]
#[derive(Clone)]
pub struct Callbacks {
    pub on_ice_candidate: IceCandidateCallback,
    pub on_connectivity_exception: ConnectivityExceptionCallback,
    pub span: Option<Span>,
}

/// Point-in-time view of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub mode: MediaMode,
    pub signaling_state: SignalingState,
    pub closed: bool,
    pub has_local_description: bool,
    pub has_remote_description: bool,
    pub pending_remote_candidates: usize,
    pub local_candidates: usize,
    pub remote_candidates: usize,
}
