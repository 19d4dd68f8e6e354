use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::{
    sync::{watch, Mutex},
    time::{Duration, Instant},
};
use uuid::Uuid;

use crate::{
    aggregation::{AggregationConfig, AggregationStats, Aggregator},
    error::{EngineError, Result},
    feed::FeedController,
    ingestion::{IngestionStats, Signal, SignalBuffer, SignalOutcome},
    models::{Emotion, ParticipantProfile},
    settings::EngineSettings,
    snapshot::Snapshot,
};

use super::{
    ticker::Ticker, LifecycleAction, SessionInfo, SessionLaunch, SessionState, SessionStatus,
};

/// What a participant-facing view needs to decide whether to join.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusView {
    pub status: SessionStatus,
    pub join_reference: Option<String>,
}

/// Returned when a session ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub launch: SessionLaunch,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub elapsed_secs: u64,
    pub final_snapshot: Snapshot,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub ingestion: IngestionStats,
    pub aggregation: AggregationStats,
}

/// Owner of all mutable session state.
///
/// Lifecycle calls are serialized through `transition`. Producers write the
/// signal buffer directly; everything else reads the published snapshot.
#[derive(Clone)]
pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    transition: Arc<Mutex<()>>,
    buffer: Arc<SignalBuffer>,
    aggregator: Arc<Aggregator>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    feed: Arc<Mutex<FeedController>>,
    tick_interval: Duration,
    clock_interval: Duration,
    feed_interval: Duration,
    simulation: bool,
    rng_seed: Option<u64>,
}

impl SessionController {
    pub fn new(settings: &EngineSettings) -> Self {
        let buffer = Arc::new(SignalBuffer::new(settings.initial_student_count));
        let seed = Snapshot::seed(settings.initial_score, settings.initial_student_count);
        let aggregator = Aggregator::new(
            Arc::clone(&buffer),
            seed,
            AggregationConfig::default(),
            settings.simulation,
            settings.rng_seed,
        );

        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
            transition: Arc::new(Mutex::new(())),
            buffer,
            aggregator: Arc::new(aggregator),
            ticker: Arc::new(Mutex::new(None)),
            feed: Arc::new(Mutex::new(FeedController::new())),
            tick_interval: settings.tick_interval(),
            clock_interval: settings.clock_interval(),
            feed_interval: settings.feed_interval(),
            simulation: settings.simulation,
            rng_seed: settings.rng_seed,
        }
    }

    pub async fn get_state(&self) -> SessionState {
        let mut guard = self.state.lock().await;
        guard.sync_elapsed(Instant::now());
        guard.clone()
    }

    pub async fn status(&self) -> SessionStatusView {
        let guard = self.state.lock().await;
        SessionStatusView {
            status: guard.status,
            join_reference: guard.join_reference().map(str::to_string),
        }
    }

    pub async fn elapsed_secs(&self) -> u64 {
        self.state.lock().await.elapsed_secs(Instant::now())
    }

    /// Latest published snapshot; frozen while paused.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.aggregator.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.aggregator.publisher().subscribe()
    }

    /// Shared handle for classifier producers.
    pub fn signals(&self) -> Arc<SignalBuffer> {
        Arc::clone(&self.buffer)
    }

    pub fn record_signal(
        &self,
        participant_id: &str,
        emotion: Emotion,
        observed_at: DateTime<Utc>,
    ) -> SignalOutcome {
        self.buffer.record_signal(participant_id, emotion, observed_at)
    }

    pub fn record(&self, signal: &Signal) -> SignalOutcome {
        self.buffer.record(signal)
    }

    pub fn register_roster(&self, roster: impl IntoIterator<Item = ParticipantProfile>) {
        let now = Utc::now();
        for profile in roster {
            self.buffer.register(profile, now);
        }
    }

    pub fn participant_joined(&self, profile: ParticipantProfile) {
        self.buffer.participant_joined(profile, Utc::now());
    }

    pub fn participant_left(&self, participant_id: &str) -> bool {
        self.buffer.participant_left(participant_id)
    }

    /// Idle -> Live for a new session, or Paused -> Live for the current one.
    pub async fn start(
        &self,
        launch: SessionLaunch,
        join_reference: Option<String>,
    ) -> Result<SessionState> {
        let _transition = self.transition.lock().await;

        let status = self.state.lock().await.status;
        match status {
            SessionStatus::Idle => {}
            SessionStatus::Paused => {
                info!("start on a paused session resumes it; launch details ignored");
                return self.resume_locked().await;
            }
            from => {
                return Err(EngineError::InvalidTransition {
                    from,
                    action: LifecycleAction::Start,
                })
            }
        }

        let info = SessionInfo {
            id: Uuid::new_v4().to_string(),
            launch,
            join_reference,
            started_at: Utc::now(),
        };
        info!("starting session {} ({})", info.id, info.launch.label());

        {
            let mut state = self.state.lock().await;
            state.begin(info, Instant::now())?;
        }

        self.aggregator.republish(SessionStatus::Live, 0).await;
        self.spawn_workers().await;

        Ok(self.get_state().await)
    }

    pub async fn resume(&self) -> Result<SessionState> {
        let _transition = self.transition.lock().await;
        self.resume_locked().await
    }

    async fn resume_locked(&self) -> Result<SessionState> {
        let elapsed_secs = {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            state.resume(now)?;
            state.elapsed_secs(now)
        };

        self.aggregator
            .republish(SessionStatus::Live, elapsed_secs)
            .await;
        self.spawn_workers().await;

        Ok(self.get_state().await)
    }

    pub async fn pause(&self) -> Result<SessionState> {
        let _transition = self.transition.lock().await;
        let paused_at = Instant::now();

        let status = self.state.lock().await.status;
        if status != SessionStatus::Live {
            return Err(EngineError::InvalidTransition {
                from: status,
                action: LifecycleAction::Pause,
            });
        }

        // Let an in-flight tick publish before the pause becomes visible.
        self.stop_workers().await;

        let elapsed_secs = {
            let mut state = self.state.lock().await;
            state.pause(paused_at)?;
            state.elapsed_secs(paused_at)
        };
        self.aggregator
            .republish(SessionStatus::Paused, elapsed_secs)
            .await;

        info!("session paused at {}", super::format_elapsed(elapsed_secs));
        Ok(self.get_state().await)
    }

    pub async fn end(&self) -> Result<SessionSummary> {
        let _transition = self.transition.lock().await;
        let ended_at = Instant::now();

        let status = self.state.lock().await.status;
        if !matches!(status, SessionStatus::Live | SessionStatus::Paused) {
            return Err(EngineError::InvalidTransition {
                from: status,
                action: LifecycleAction::End,
            });
        }

        self.stop_workers().await;

        let (info, final_ms) = {
            let mut state = self.state.lock().await;
            let final_ms = state.end(ended_at)?;
            (state.session.clone(), final_ms)
        };

        let final_snapshot = self.aggregator.republish(SessionStatus::Ended, 0).await;
        let elapsed_secs = final_ms / 1000;

        let Some(info) = info else {
            return Err(EngineError::InvalidTransition {
                from: status,
                action: LifecycleAction::End,
            });
        };
        info!(
            "session {} ended after {}",
            info.id,
            super::format_elapsed(elapsed_secs)
        );

        Ok(SessionSummary {
            id: info.id,
            launch: info.launch,
            started_at: info.started_at,
            ended_at: Utc::now(),
            elapsed_secs,
            final_snapshot: final_snapshot.as_ref().clone(),
        })
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            ingestion: self.buffer.stats(),
            aggregation: self.aggregator.stats(),
        }
    }

    async fn spawn_workers(&self) {
        {
            let mut ticker_guard = self.ticker.lock().await;
            if let Some(previous) = ticker_guard.take() {
                warn!("replacing an aggregation ticker that was still running");
                if let Err(err) = previous.stop().await {
                    error!("failed to stop previous ticker: {err:#}");
                }
            }
            *ticker_guard = Some(Ticker::spawn(
                Arc::clone(&self.state),
                Arc::clone(&self.aggregator),
                self.tick_interval,
                self.clock_interval,
            ));
        }

        if self.simulation {
            let mut feed = self.feed.lock().await;
            if let Err(err) =
                feed.start_feed(Arc::clone(&self.buffer), self.feed_interval, self.rng_seed)
            {
                warn!("simulated feed not started: {err:#}");
            }
        }
    }

    async fn stop_workers(&self) {
        if let Err(err) = self.feed.lock().await.stop_feed().await {
            error!("failed to stop simulated feed: {err:#}");
        }

        let ticker = self.ticker.lock().await.take();
        if let Some(ticker) = ticker {
            if let Err(err) = ticker.stop().await {
                error!("failed to stop aggregation ticker: {err:#}");
            }
        }
    }
}
