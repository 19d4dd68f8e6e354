use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::ingestion::SignalBuffer;

use super::simulator::simulated_feed;

/// Owns the simulated classifier task for the current live window.
pub struct FeedController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl FeedController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn start_feed(
        &mut self,
        buffer: Arc<SignalBuffer>,
        interval: Duration,
        rng_seed: Option<u64>,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("simulated feed already active");
        }

        info!("starting simulated classifier feed every {:?}", interval);
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(simulated_feed(
            buffer,
            interval,
            rng_seed,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop_feed(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("simulated feed task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for FeedController {
    fn default() -> Self {
        Self::new()
    }
}
