use negotiator::config::Settings;
use negotiator::domain::negotiation::{
    IceCandidate, LocalTrack, MediaConstraints, MediaMode, MediaStream, NegotiationController,
    SessionConfig,
};
use negotiator::infrastructure::telemetry::init_tracing;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// How long the demo waits for ICE to settle before reporting
const SETTLE_TIME: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional settings file as the first argument
    let path = std::env::args().nth(1).map(PathBuf::from);
    let settings = Settings::load(path.as_deref())?;
    init_tracing(&settings.logging)?;

    info!("Starting loopback negotiation demo");

    let (offerer_tx, offerer_rx) = mpsc::unbounded_channel::<IceCandidate>();
    let (answerer_tx, answerer_rx) = mpsc::unbounded_channel::<IceCandidate>();

    let source = MediaStream::new("demo-stream", vec![LocalTrack::audio("demo-audio")]);
    let offerer_config = SessionConfig::from_settings(
        &settings.negotiation,
        MediaConstraints::audio_only(),
        move |candidate| {
            let _ = offerer_tx.send(candidate.clone());
        },
        |event| warn!(kind = %event.kind, "{}", event.message),
    )
    .with_id("offerer")
    .with_mode(MediaMode::SendReceive)
    .with_source(source);

    let answerer_config = SessionConfig::from_settings(
        &settings.negotiation,
        MediaConstraints::audio_only(),
        move |candidate| {
            let _ = answerer_tx.send(candidate.clone());
        },
        |event| warn!(kind = %event.kind, "{}", event.message),
    )
    .with_id("answerer")
    .with_mode(MediaMode::ReceiveOnly);

    let (offerer, _) = NegotiationController::with_webrtc(offerer_config).await?;
    let (answerer, _) = NegotiationController::with_webrtc(answerer_config).await?;
    let offerer = Arc::new(offerer);
    let answerer = Arc::new(answerer);

    let mut offerer_health = offerer.subscribe_connectivity_changes("answerer");
    let mut answerer_health = answerer.subscribe_connectivity_changes("offerer");

    // Trickle candidates across as they are gathered
    let to_answerer = forward(offerer_rx, Arc::clone(&answerer));
    let to_offerer = forward(answerer_rx, Arc::clone(&offerer));

    let offer = offerer.create_offer().await?;
    offerer.process_local_offer(offer.clone()).await?;
    answerer.process_remote_offer(offer.sdp).await?;

    let answer = answerer.create_answer().await?;
    answerer.process_local_answer(answer.clone()).await?;
    offerer.process_remote_answer(answer.sdp).await?;

    info!("Offer/answer exchange complete, waiting for connectivity");
    tokio::time::sleep(SETTLE_TIME).await;

    for controller in [&offerer, &answerer] {
        let snapshot = controller.snapshot().await;
        info!("{}", serde_json::to_string(&snapshot)?);
    }

    offerer_health.cancel();
    answerer_health.cancel();
    offerer.dispose().await?;
    answerer.dispose().await?;
    to_answerer.abort();
    to_offerer.abort();

    info!("Demo finished");
    Ok(())
}

fn forward(
    mut candidates: mpsc::UnboundedReceiver<IceCandidate>,
    target: Arc<NegotiationController>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(candidate) = candidates.recv().await {
            if let Err(e) = target.add_remote_candidate(candidate).await {
                warn!(session = %target.id(), error = %e, "Remote candidate rejected");
            }
        }
    })
}
