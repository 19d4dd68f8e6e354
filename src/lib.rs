pub mod aggregation;
pub mod error;
pub mod feed;
pub mod ingestion;
pub mod models;
pub mod session;
pub mod settings;
pub mod snapshot;
mod utils;

use anyhow::Context;
use log::{info, warn};

pub use aggregation::{momentum, Momentum};
pub use error::{EngineError, Result};
pub use ingestion::{Signal, SignalBuffer, SignalOutcome};
pub use models::{Emotion, MoodBucket, MoodKind, Participant, ParticipantProfile, RiskLevel};
pub use session::{
    format_elapsed, SessionController, SessionLaunch, SessionStatus, SessionStatusView,
    SessionSummary,
};
pub use settings::{EngineSettings, SettingsStore};
pub use snapshot::{EngagementScore, EngagementTier, Snapshot};

/// Runs a simulated instant session and logs each snapshot until Ctrl-C.
pub fn run() -> anyhow::Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    info!("ClassPulse starting up...");

    let store = SettingsStore::from_env()?;
    let mut settings = store.engine().apply_env();
    if !settings.simulation {
        warn!("no classifier is attached to the demo runner; enabling simulation mode");
        settings.simulation = true;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(run_demo_session(settings))
}

async fn run_demo_session(settings: EngineSettings) -> anyhow::Result<()> {
    let controller = SessionController::new(&settings);
    controller.register_roster(feed::demo_roster());

    controller
        .start(
            SessionLaunch::Instant {
                topic: "Data Structures".into(),
            },
            Some("https://meet.google.com/new".into()),
        )
        .await?;

    let mut snapshots = controller.subscribe();
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                let dominant = snapshot.dominant_mood();
                info!(
                    "[{}] engagement {}% ({:?}, {:?}) | {} students | {:?} {}% | most at risk: {}",
                    snapshot.elapsed_display(),
                    snapshot.engagement.current,
                    snapshot.momentum(),
                    snapshot.engagement.tier(),
                    snapshot.student_count,
                    dominant.kind,
                    dominant.percent,
                    snapshot
                        .participants
                        .first()
                        .map(|entry| format!("{} ({})", entry.participant.name, entry.participant.emotion))
                        .unwrap_or_else(|| "-".into()),
                );
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for ctrl-c")?;
                break;
            }
        }
    }

    let summary = controller.end().await?;
    let stats = controller.stats();
    info!(
        "session {} ended after {} with engagement {}% ({} ticks, {} stale signals dropped)",
        summary.id,
        format_elapsed(summary.elapsed_secs),
        summary.final_snapshot.engagement.current,
        stats.aggregation.ticks_published,
        stats.ingestion.signals_stale
    );

    Ok(())
}
