use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, Duration, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{aggregation::Aggregator, error::EngineError};

use super::{SessionState, SessionStatus};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Handle to the running aggregation worker.
pub(crate) struct Ticker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

impl Ticker {
    pub(crate) fn spawn(
        state: Arc<Mutex<SessionState>>,
        aggregator: Arc<Aggregator>,
        tick_interval: Duration,
        clock_interval: Duration,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(tick_loop(
            state,
            aggregator,
            tick_interval,
            clock_interval,
            cancel_token.clone(),
        ));

        Self {
            handle,
            cancel_token,
        }
    }

    /// Cancels the schedule and waits for an in-flight tick to publish.
    pub(crate) async fn stop(self) -> Result<()> {
        self.cancel_token.cancel();
        self.handle
            .await
            .context("aggregation ticker task failed to join")
    }
}

async fn tick_loop(
    state: Arc<Mutex<SessionState>>,
    aggregator: Arc<Aggregator>,
    tick_interval: Duration,
    clock_interval: Duration,
    cancel_token: CancellationToken,
) {
    let start = Instant::now();
    let mut ticks = time::interval_at(start + tick_interval, tick_interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut clock = time::interval_at(start + clock_interval, clock_interval);
    clock.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let aggregate = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("aggregation ticker shutting down");
                break;
            }
            _ = ticks.tick() => true,
            _ = clock.tick() => false,
        };

        let (status, elapsed_secs) = {
            let guard = state.lock().await;
            (guard.status, guard.elapsed_secs(Instant::now()))
        };
        if status != SessionStatus::Live {
            break;
        }

        if aggregate {
            match aggregator.tick(&state).await {
                Ok(_) => {}
                Err(EngineError::InvalidState(_)) => break,
                Err(err) => log_error!("aggregation tick failed: {err}"),
            }
        } else if aggregator.current().elapsed_secs != elapsed_secs {
            aggregator.republish(status, elapsed_secs).await;
        }
    }
}
