//! Negotiation controller
//!
//! Drives the offer/answer exchange for one session against an opaque
//! [`RtcEngine`]. Signaling transitions are observed, never invented: the
//! engine moves between states and the controller reacts, flushing buffered
//! remote candidates whenever the engine settles back into `stable`.
//!
//! No internal mutual exclusion is provided between renegotiation calls;
//! issuing `create_offer` and `process_remote_offer` concurrently on the same
//! session is a caller bug. Remote candidates may be added at any time.

use crate::domain::negotiation::candidate_buffer::{CandidateDisposition, IceCandidateBuffer};
use crate::domain::negotiation::engine::RtcEngine;
use crate::domain::negotiation::health::ConnectionHealthClassifier;
use crate::domain::negotiation::session::{
    ConnectivityExceptionCallback, IceCandidateCallback, Session, SessionConfig, SessionSnapshot,
};
use crate::domain::negotiation::strategy::{select_strategy, NegotiationStrategy};
use crate::domain::negotiation::subscription::{Subscribers, Subscription};
use crate::domain::negotiation::value_object::{
    IceCandidate, IceConnectionState, SdpType, SessionDescription, SignalingState,
};
use crate::domain::shared::error::{EngineError, NegotiationError};
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::SessionId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, info_span, warn, Instrument, Span};

pub struct NegotiationController {
    session: Session,
    engine: Arc<dyn RtcEngine>,
    strategy: Box<dyn NegotiationStrategy>,
    candidates: Arc<IceCandidateBuffer>,
    local_candidates: Arc<Mutex<Vec<IceCandidate>>>,
    local_candidate_subscribers: Subscribers<IceCandidate>,
    connectivity: Subscribers<IceConnectionState>,
    on_connectivity_exception: ConnectivityExceptionCallback,
    closed: Arc<AtomicBool>,
    span: Span,
}

impl NegotiationController {
    /// Build a controller over `engine`
    ///
    /// The engine is probed once here to pick the negotiation strategy, and
    /// the controller's handlers are installed on it.
    pub fn new(config: SessionConfig, engine: Arc<dyn RtcEngine>) -> Self {
        let (session, callbacks) = config.into_session();
        let span = callbacks
            .span
            .unwrap_or_else(|| info_span!("negotiation", session_id = %session.id()));
        let strategy = select_strategy(engine.as_ref());

        let controller = Self {
            session,
            engine,
            strategy,
            candidates: Arc::new(IceCandidateBuffer::new()),
            local_candidates: Arc::new(Mutex::new(Vec::new())),
            local_candidate_subscribers: Subscribers::new(),
            connectivity: Subscribers::new(),
            on_connectivity_exception: callbacks.on_connectivity_exception,
            closed: Arc::new(AtomicBool::new(false)),
            span,
        };

        controller.watch_signaling_state();
        controller.watch_local_candidates(callbacks.on_ice_candidate);
        controller.watch_connectivity();

        controller.span.in_scope(|| {
            info!(
                mode = %controller.session.mode(),
                strategy = controller.strategy.name(),
                simulcast = controller.session.simulcast_enabled(),
                "Negotiation session created"
            )
        });
        controller
    }

    fn watch_signaling_state(&self) {
        // Weak: the engine owns this handler
        let engine = Arc::downgrade(&self.engine);
        let candidates = Arc::clone(&self.candidates);
        let closed = Arc::clone(&self.closed);
        let span = self.span.clone();

        self.engine.on_signaling_state_change(Box::new(move |state| {
            let engine = engine.clone();
            let candidates = Arc::clone(&candidates);
            let closed = Arc::clone(&closed);

            Box::pin(
                async move {
                    debug!(%state, "Signaling state changed");
                    match state {
                        SignalingState::Stable => {
                            let Some(engine) = engine.upgrade() else {
                                return;
                            };
                            let report = candidates.flush(engine.as_ref()).await;
                            if report.total() > 0 {
                                info!(
                                    applied = report.applied,
                                    failed = report.failed,
                                    "Applied buffered remote ICE candidates"
                                );
                            }
                        }
                        SignalingState::Closed => {
                            closed.store(true, Ordering::SeqCst);
                        }
                        _ => {}
                    }
                }
                .instrument(span.clone()),
            )
        }));
    }

    fn watch_local_candidates(&self, on_ice_candidate: IceCandidateCallback) {
        let local = Arc::clone(&self.local_candidates);
        let subscribers = self.local_candidate_subscribers.clone();
        let span = self.span.clone();

        self.engine.on_ice_candidate(Box::new(move |candidate| {
            let _entered = span.enter();
            match candidate {
                Some(candidate) => {
                    debug!(candidate = %candidate.candidate, "Local ICE candidate gathered");
                    local
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(candidate.clone());
                    on_ice_candidate(&candidate);
                    subscribers.emit(&candidate);
                }
                None => debug!("Local ICE candidate gathering complete"),
            }
            Box::pin(async {})
        }));
    }

    fn watch_connectivity(&self) {
        let connectivity = self.connectivity.clone();

        self.engine
            .on_ice_connection_state_change(Box::new(move |state| {
                connectivity.emit(&state);
                Box::pin(async {})
            }));
    }

    pub fn id(&self) -> &SessionId {
        self.session.id()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Name of the strategy picked by the capability probe
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn signaling_state(&self) -> SignalingState {
        if self.closed.load(Ordering::SeqCst) {
            SignalingState::Closed
        } else {
            self.engine.signaling_state()
        }
    }

    pub fn is_closed(&self) -> bool {
        self.signaling_state().is_terminal()
    }

    pub async fn create_offer(&self) -> Result<SessionDescription> {
        self.ensure_open("create offer")?;
        let result = self
            .strategy
            .create_offer(&self.session, self.engine.as_ref())
            .instrument(self.span.clone())
            .await;
        self.settle(result)
    }

    pub async fn create_answer(&self) -> Result<SessionDescription> {
        self.ensure_open("create answer")?;
        let result = self
            .strategy
            .create_answer(&self.session, self.engine.as_ref())
            .instrument(self.span.clone())
            .await;
        self.settle(result)
    }

    pub async fn process_local_offer(&self, offer: SessionDescription) -> Result<()> {
        self.apply_local(SessionDescription::new(SdpType::Offer, offer.sdp))
            .await
    }

    pub async fn process_local_answer(&self, answer: SessionDescription) -> Result<()> {
        self.apply_local(SessionDescription::new(SdpType::Answer, answer.sdp))
            .await
    }

    pub async fn process_remote_offer(&self, sdp: impl Into<String>) -> Result<()> {
        self.apply_remote(SessionDescription::offer(sdp)).await
    }

    pub async fn process_remote_answer(&self, sdp: impl Into<String>) -> Result<()> {
        self.apply_remote(SessionDescription::answer(sdp)).await
    }

    async fn apply_local(&self, description: SessionDescription) -> Result<()> {
        let sdp_type = description.sdp_type;
        self.ensure_open("apply local description")?;

        let result = async {
            self.engine.set_local_description(description).await?;
            if self.engine.local_description().await.is_none() {
                return Err(NegotiationError::Description(format!(
                    "local {:?} missing after being set",
                    sdp_type
                )));
            }
            info!(?sdp_type, state = %self.engine.signaling_state(), "Applied local description");
            self.flush_if_settled().await;
            Ok::<(), NegotiationError>(())
        }
        .instrument(self.span.clone())
        .await;
        self.settle(result)
    }

    async fn apply_remote(&self, description: SessionDescription) -> Result<()> {
        let sdp_type = description.sdp_type;
        self.ensure_open("apply remote description")?;

        let result = async {
            self.engine.set_remote_description(description).await?;
            info!(?sdp_type, state = %self.engine.signaling_state(), "Applied remote description");
            self.flush_if_settled().await;
            Ok::<(), NegotiationError>(())
        }
        .instrument(self.span.clone())
        .await;
        self.settle(result)
    }

    /// Apply a remote candidate now, or buffer it until the engine is stable
    ///
    /// Buffering is not an error. Fails with a state error once closed.
    pub async fn add_remote_candidate(
        &self,
        candidate: IceCandidate,
    ) -> Result<CandidateDisposition> {
        let result = self
            .candidates
            .add_remote_candidate(
                self.engine.as_ref(),
                self.closed.load(Ordering::SeqCst),
                candidate,
            )
            .instrument(self.span.clone())
            .await;
        self.settle(result)
    }

    /// Route connectivity transitions through the health classifier
    ///
    /// Degraded and failed transitions reach the configured
    /// `on_connectivity_exception` callback; the rest are only logged.
    pub fn subscribe_connectivity_changes(&self, peer_label: impl Into<String>) -> Subscription {
        let classifier = ConnectionHealthClassifier::new(peer_label);
        let callback = Arc::clone(&self.on_connectivity_exception);
        let session_id = self.session.id().clone();
        let span = self.span.clone();

        self.connectivity.subscribe(move |state| {
            let _entered = span.enter();
            if let Some(event) = classifier.observe(*state) {
                callback(&event.for_session(session_id.clone()));
            }
        })
    }

    /// Additional listener for gathered local candidates
    pub fn subscribe_local_candidates<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&IceCandidate) + Send + Sync + 'static,
    {
        self.local_candidate_subscribers.subscribe(handler)
    }

    /// Close the engine and drop all candidate state. Idempotent.
    pub async fn dispose(&self) -> Result<()> {
        async {
            if self.closed.swap(true, Ordering::SeqCst)
                || self.engine.signaling_state().is_terminal()
            {
                debug!("Session already closed");
                return Ok(());
            }

            let result = self.engine.close().await;

            self.local_candidates
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
            self.candidates.clear().await;

            match result {
                Ok(()) | Err(EngineError::Closed) => {
                    info!("Session disposed");
                    Ok(())
                }
                Err(e) => {
                    warn!(error = %e, "Engine failed to close cleanly");
                    // Leave the session open so a later dispose retries the close
                    if !self.engine.signaling_state().is_terminal() {
                        self.closed.store(false, Ordering::SeqCst);
                    }
                    Err(NegotiationError::from(e))
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    /// Audit trail of gathered local candidates
    pub fn local_candidates(&self) -> Vec<IceCandidate> {
        self.local_candidates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Audit trail of received remote candidates
    pub async fn remote_candidates(&self) -> Vec<IceCandidate> {
        self.candidates.received().await
    }

    pub async fn pending_remote_candidates(&self) -> Vec<IceCandidate> {
        self.candidates.pending().await
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.session.id().clone(),
            mode: self.session.mode(),
            signaling_state: self.signaling_state(),
            closed: self.is_closed(),
            has_local_description: self.engine.local_description().await.is_some(),
            has_remote_description: self.engine.remote_description().await.is_some(),
            pending_remote_candidates: self.candidates.pending_len().await,
            local_candidates: self.local_candidates().len(),
            remote_candidates: self.candidates.received().await.len(),
        }
    }

    fn ensure_open(&self, operation: &str) -> Result<()> {
        if self.is_closed() {
            self.span
                .in_scope(|| warn!(operation, "Rejecting operation on closed session"));
            return Err(NegotiationError::closed());
        }
        Ok(())
    }

    /// Drain buffered candidates once a description leaves the engine stable
    ///
    /// Engines may deliver the stable transition after the description call
    /// returns; draining here keeps the buffer empty by the time it does.
    async fn flush_if_settled(&self) {
        let report = self.candidates.flush(self.engine.as_ref()).await;
        if report.total() > 0 {
            info!(
                applied = report.applied,
                failed = report.failed,
                "Applied buffered remote ICE candidates"
            );
        }
    }

    /// Engine failures after closure surface as state errors
    fn settle<T>(&self, result: Result<T>) -> Result<T> {
        match result {
            Err(NegotiationError::Engine(e)) if self.is_closed() => {
                self.span
                    .in_scope(|| debug!(error = %e, "Engine failure after closure"));
                Err(NegotiationError::closed())
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for NegotiationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NegotiationController")
            .field("session", &self.session)
            .field("strategy", &self.strategy.name())
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
