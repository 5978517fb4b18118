//! Remote ICE candidate buffering
//!
//! Remote candidates can arrive before the description they belong to has
//! been applied. They are parked here until the signaling state returns to
//! `stable` with a remote description present, then applied in arrival order.

use crate::domain::negotiation::engine::RtcEngine;
use crate::domain::negotiation::value_object::{IceCandidate, SignalingState};
use crate::domain::shared::error::NegotiationError;
use crate::domain::shared::result::Result;
use std::collections::VecDeque;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// What happened to a candidate handed to the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateDisposition {
    Applied,
    Buffered,
}

/// Outcome of draining the pending queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushReport {
    pub applied: usize,
    pub failed: usize,
}

impl FlushReport {
    pub fn total(&self) -> usize {
        self.applied + self.failed
    }
}

#[derive(Default)]
struct BufferState {
    /// Waiting for a stable state with a remote description
    pending: VecDeque<IceCandidate>,
    /// Every candidate ever received, in arrival order
    received: Vec<IceCandidate>,
}

/// FIFO queue of remote candidates keyed off the engine's signaling state
///
/// Appends and flushes are serialized by one async lock, so a candidate that
/// arrives while a flush is running waits behind it and is never applied
/// ahead of earlier ones.
#[derive(Default)]
pub struct IceCandidateBuffer {
    state: Mutex<BufferState>,
}

impl IceCandidateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a remote candidate and apply it now or park it
    ///
    /// `closed` lets the owner report closure before the engine catches up.
    pub async fn add_remote_candidate(
        &self,
        engine: &dyn RtcEngine,
        closed: bool,
        candidate: IceCandidate,
    ) -> Result<CandidateDisposition> {
        let mut state = self.state.lock().await;
        state.received.push(candidate.clone());

        let signaling = if closed {
            SignalingState::Closed
        } else {
            engine.signaling_state()
        };

        if signaling.is_terminal() {
            return Err(NegotiationError::State("connection closed".to_string()));
        }

        if !signaling.is_stable() {
            debug!(state = %signaling, pending = state.pending.len() + 1, "Buffering remote ICE candidate");
            state.pending.push_back(candidate);
            return Ok(CandidateDisposition::Buffered);
        }

        if engine.remote_description().await.is_none() {
            debug!("Stable without remote description, buffering remote ICE candidate");
            state.pending.push_back(candidate);
            return Ok(CandidateDisposition::Buffered);
        }

        // Earlier arrivals go first
        if !state.pending.is_empty() {
            drain(&mut state.pending, engine).await;
        }

        engine.add_ice_candidate(candidate).await?;
        Ok(CandidateDisposition::Applied)
    }

    /// Drain the pending queue if the engine is stable with a remote description
    ///
    /// Individual failures are logged and skipped; the queue is empty after
    /// any attempted drain.
    pub async fn flush(&self, engine: &dyn RtcEngine) -> FlushReport {
        let mut state = self.state.lock().await;
        if state.pending.is_empty() {
            return FlushReport::default();
        }

        let signaling = engine.signaling_state();
        if !signaling.is_stable() {
            debug!(state = %signaling, "Not stable, keeping buffered candidates");
            return FlushReport::default();
        }
        if engine.remote_description().await.is_none() {
            debug!(pending = state.pending.len(), "No remote description yet, keeping buffered candidates");
            return FlushReport::default();
        }

        drain(&mut state.pending, engine).await
    }

    pub async fn pending(&self) -> Vec<IceCandidate> {
        self.state.lock().await.pending.iter().cloned().collect()
    }

    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Audit trail of every remote candidate seen
    pub async fn received(&self) -> Vec<IceCandidate> {
        self.state.lock().await.received.clone()
    }

    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.pending.clear();
        state.received.clear();
    }
}

async fn drain(pending: &mut VecDeque<IceCandidate>, engine: &dyn RtcEngine) -> FlushReport {
    let mut report = FlushReport::default();

    while let Some(candidate) = pending.pop_front() {
        let line = candidate.candidate.clone();
        match engine.add_ice_candidate(candidate).await {
            Ok(()) => report.applied += 1,
            Err(e) => {
                warn!(candidate = %line, error = %e, "Failed to apply buffered ICE candidate");
                report.failed += 1;
            }
        }
    }

    debug!(applied = report.applied, failed = report.failed, "Flushed buffered ICE candidates");
    report
}
