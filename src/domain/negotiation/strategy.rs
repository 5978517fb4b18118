//! Offer/answer strategies
//!
//! Engines that support transceivers get explicit per-track control; the
//! rest fall back to attaching tracks and offer options. The choice is made
//! once, when the controller is built.

use crate::domain::negotiation::encoding::EncodingPolicy;
use crate::domain::negotiation::engine::RtcEngine;
use crate::domain::negotiation::session::Session;
use crate::domain::negotiation::value_object::{
    MediaKind, MediaStream, OfferOptions, SessionDescription, TransceiverDirection,
    TransceiverInit,
};
use crate::domain::shared::error::NegotiationError;
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use tracing::{debug, info};

#[async_trait]
pub trait NegotiationStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_offer(
        &self,
        session: &Session,
        engine: &dyn RtcEngine,
    ) -> Result<SessionDescription>;

    async fn create_answer(
        &self,
        session: &Session,
        engine: &dyn RtcEngine,
    ) -> Result<SessionDescription>;
}

/// Probe the engine and pick the matching strategy
pub fn select_strategy(engine: &dyn RtcEngine) -> Box<dyn NegotiationStrategy> {
    if engine.supports_transceivers() {
        Box::new(TransceiverStrategy::new(EncodingPolicy::new()))
    } else {
        Box::new(LegacyStrategy)
    }
}

/// Explicit transceiver control
#[derive(Debug, Clone, Default)]
pub struct TransceiverStrategy {
    policy: EncodingPolicy,
}

impl TransceiverStrategy {
    pub fn new(policy: EncodingPolicy) -> Self {
        Self { policy }
    }

    async fn add_sending_transceivers(
        &self,
        session: &Session,
        engine: &dyn RtcEngine,
    ) -> Result<()> {
        let source = session.outgoing_media_source().ok_or_else(|| {
            NegotiationError::Configuration("no stream for send mode".to_string())
        })?;
        let direction = TransceiverDirection::from(session.mode());

        for track in &source.tracks {
            let encodings = self
                .policy
                .send_encodings(track.kind, session.simulcast_enabled());
            debug!(track = %track.id, kind = %track.kind, encodings = encodings.len(), "Adding sending transceiver");

            let init = TransceiverInit::new(direction)
                .with_stream(source.id.clone())
                .with_encodings(encodings);
            engine
                .add_transceiver_from_track(track.clone(), init)
                .await?;
        }
        Ok(())
    }

    async fn add_receiving_transceivers(
        &self,
        session: &Session,
        engine: &dyn RtcEngine,
    ) -> Result<()> {
        for kind in session.media_constraints().kinds() {
            let stream = MediaStream::placeholder();
            debug!(%kind, stream = %stream.id, "Adding receive-only transceiver");

            let init = TransceiverInit::new(TransceiverDirection::RecvOnly).with_stream(stream.id);
            engine.add_transceiver_from_kind(kind, init).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl NegotiationStrategy for TransceiverStrategy {
    fn name(&self) -> &'static str {
        "transceiver"
    }

    async fn create_offer(
        &self,
        session: &Session,
        engine: &dyn RtcEngine,
    ) -> Result<SessionDescription> {
        if session.mode().sends() {
            self.add_sending_transceivers(session, engine).await?;
        } else {
            self.add_receiving_transceivers(session, engine).await?;
        }

        let offer = engine.create_offer(None).await?;
        info!(mode = %session.mode(), "Created offer");
        Ok(offer)
    }

    async fn create_answer(
        &self,
        session: &Session,
        engine: &dyn RtcEngine,
    ) -> Result<SessionDescription> {
        let direction = TransceiverDirection::from(session.mode());
        let transceivers = engine.transceivers().await;

        for kind in session.media_constraints().kinds() {
            // Created by the engine when the remote offer was applied
            let transceiver = transceivers
                .iter()
                .find(|t| t.kind == kind)
                .ok_or_else(|| {
                    NegotiationError::Negotiation(format!("missing transceiver for {}", kind))
                })?;

            debug!(%kind, index = transceiver.index, ?direction, "Setting transceiver direction");
            engine
                .set_transceiver_direction(transceiver.index, direction)
                .await?;
        }

        let answer = engine.create_answer().await?;
        info!(mode = %session.mode(), "Created answer");
        Ok(answer)
    }
}

/// Engines without transceiver control
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyStrategy;

impl LegacyStrategy {
    pub fn offer_options(session: &Session) -> OfferOptions {
        let receives = session.mode().receives();
        let constraints = session.media_constraints();
        OfferOptions {
            offer_to_receive_audio: receives && constraints.wants(MediaKind::Audio),
            offer_to_receive_video: receives && constraints.wants(MediaKind::Video),
            ice_restart: false,
        }
    }
}

#[async_trait]
impl NegotiationStrategy for LegacyStrategy {
    fn name(&self) -> &'static str {
        "legacy"
    }

    async fn create_offer(
        &self,
        session: &Session,
        engine: &dyn RtcEngine,
    ) -> Result<SessionDescription> {
        if let Some(source) = session.outgoing_media_source() {
            for track in &source.tracks {
                debug!(track = %track.id, kind = %track.kind, "Attaching track");
                engine.add_track(track.clone(), source.id.clone()).await?;
            }
        }

        let options = Self::offer_options(session);
        let offer = engine.create_offer(Some(options)).await?;
        info!(mode = %session.mode(), ?options, "Created offer");
        Ok(offer)
    }

    /// No transceiver hook exists here, so the engine answers with whatever
    /// the remote offer implied.
    async fn create_answer(
        &self,
        session: &Session,
        engine: &dyn RtcEngine,
    ) -> Result<SessionDescription> {
        let answer = engine.create_answer().await?;
        info!(mode = %session.mode(), "Created answer without transceiver control");
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::negotiation::engine::MockRtcEngine;
    use crate::domain::negotiation::session::SessionConfig;
    use crate::domain::negotiation::value_object::{LocalTrack, MediaConstraints, MediaMode};

    fn session(mode: MediaMode, constraints: MediaConstraints, source: Option<MediaStream>) -> Session {
        let mut config = SessionConfig::new(constraints, true, |_| {}, |_| {}).with_mode(mode);
        if let Some(source) = source {
            config = config.with_source(source);
        }
        config.into_session().0
    }

    #[test]
    fn test_probe_selects_strategy() {
        let mut capable = MockRtcEngine::new();
        capable.expect_supports_transceivers().return_const(true);
        assert_eq!(select_strategy(&capable).name(), "transceiver");

        let mut legacy = MockRtcEngine::new();
        legacy.expect_supports_transceivers().return_const(false);
        assert_eq!(select_strategy(&legacy).name(), "legacy");
    }

    #[test]
    fn test_legacy_offer_options() {
        let s = session(MediaMode::SendOnly, MediaConstraints::audio_video(), None);
        let options = LegacyStrategy::offer_options(&s);
        assert!(!options.offer_to_receive_audio);
        assert!(!options.offer_to_receive_video);

        let s = session(MediaMode::SendReceive, MediaConstraints::audio_only(), None);
        let options = LegacyStrategy::offer_options(&s);
        assert!(options.offer_to_receive_audio);
        assert!(!options.offer_to_receive_video);
    }

    #[tokio::test]
    async fn test_send_mode_without_source_fails_before_engine() {
        let mut engine = MockRtcEngine::new();
        engine.expect_add_transceiver_from_track().never();
        engine.expect_create_offer().never();

        let s = session(MediaMode::SendOnly, MediaConstraints::audio_only(), None);
        let err = TransceiverStrategy::default()
            .create_offer(&s, &engine)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            NegotiationError::Configuration("no stream for send mode".to_string())
        );
    }

    #[tokio::test]
    async fn test_legacy_attaches_tracks_then_offers() {
        let source = MediaStream::new(
            "mic",
            vec![LocalTrack::audio("a0"), LocalTrack::video("v0")],
        );
        let s = session(MediaMode::SendReceive, MediaConstraints::audio_video(), Some(source));

        let mut engine = MockRtcEngine::new();
        engine
            .expect_add_track()
            .withf(|_, stream| stream == "mic")
            .times(2)
            .returning(|_, _| Ok(()));
        engine
            .expect_create_offer()
            .withf(|options| {
                matches!(options, Some(o) if o.offer_to_receive_audio && o.offer_to_receive_video)
            })
            .times(1)
            .returning(|_| Ok(SessionDescription::offer("v=0")));

        let offer = LegacyStrategy.create_offer(&s, &engine).await.unwrap();
        assert_eq!(offer, SessionDescription::offer("v=0"));
    }

    #[tokio::test]
    async fn test_legacy_answer_resolves() {
        let s = session(MediaMode::ReceiveOnly, MediaConstraints::audio_video(), None);

        let mut engine = MockRtcEngine::new();
        engine.expect_transceivers().never();
        engine
            .expect_create_answer()
            .times(1)
            .returning(|| Ok(SessionDescription::answer("v=0")));

        let answer = LegacyStrategy.create_answer(&s, &engine).await.unwrap();
        assert_eq!(answer.sdp, "v=0");
    }
}
