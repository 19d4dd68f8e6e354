use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Idle,
    Live,
    Paused,
    Ended,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Idle
    }
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Live => "live",
            SessionStatus::Paused => "paused",
            SessionStatus::Ended => "ended",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleAction {
    Start,
    Pause,
    Resume,
    End,
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LifecycleAction::Start => "start",
            LifecycleAction::Pause => "pause",
            LifecycleAction::Resume => "resume",
            LifecycleAction::End => "end",
        })
    }
}

/// The only permitted lifecycle edges. Start on a paused session resumes it.
pub fn transition(from: SessionStatus, action: LifecycleAction) -> Result<SessionStatus> {
    use LifecycleAction as A;
    use SessionStatus as S;

    match (from, action) {
        (S::Idle, A::Start) => Ok(S::Live),
        (S::Paused, A::Start | A::Resume) => Ok(S::Live),
        (S::Live, A::Pause) => Ok(S::Paused),
        (S::Live | S::Paused, A::End) => Ok(S::Ended),
        _ => Err(EngineError::InvalidTransition { from, action }),
    }
}

/// How the operator opened the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum SessionLaunch {
    /// A lecture from the timetable, identified by its reference.
    Scheduled { reference: String },
    /// An ad hoc session named on the spot.
    Instant { topic: String },
}

impl SessionLaunch {
    pub fn label(&self) -> &str {
        match self {
            SessionLaunch::Scheduled { reference } => reference,
            SessionLaunch::Instant { topic } => topic,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: String,
    pub launch: SessionLaunch,
    /// Meeting link handed to joining participants while live.
    pub join_reference: Option<String>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub status: SessionStatus,
    pub session: Option<SessionInfo>,
    pub elapsed_ms: u64,
    /// Time accumulated from earlier live windows; combines with `running_anchor`
    /// to compute the true elapsed duration.
    #[serde(skip)]
    pub elapsed_ms_baseline: u64,
    #[serde(skip)]
    pub running_anchor: Option<Instant>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: SessionStatus::Idle,
            session: None,
            elapsed_ms: 0,
            elapsed_ms_baseline: 0,
            running_anchor: None,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_elapsed_ms(&self, now: Instant) -> u64 {
        if let (SessionStatus::Live, Some(anchor)) = (self.status, self.running_anchor) {
            let running = now.saturating_duration_since(anchor).as_millis() as u64;
            self.elapsed_ms_baseline.saturating_add(running)
        } else {
            self.elapsed_ms
        }
    }

    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        self.current_elapsed_ms(now) / 1000
    }

    pub fn sync_elapsed(&mut self, now: Instant) {
        self.elapsed_ms = self.current_elapsed_ms(now);
    }

    /// Idle -> Live with the clock at zero. A paused session goes through
    /// [`SessionState::resume`] instead.
    pub fn begin(&mut self, info: SessionInfo, now: Instant) -> Result<()> {
        if self.status != SessionStatus::Idle {
            return Err(EngineError::InvalidTransition {
                from: self.status,
                action: LifecycleAction::Start,
            });
        }

        *self = Self {
            status: SessionStatus::Live,
            session: Some(info),
            elapsed_ms: 0,
            elapsed_ms_baseline: 0,
            running_anchor: Some(now),
        };
        Ok(())
    }

    pub fn pause(&mut self, now: Instant) -> Result<()> {
        let status = transition(self.status, LifecycleAction::Pause)?;
        self.sync_elapsed(now);
        self.elapsed_ms_baseline = self.elapsed_ms;
        self.running_anchor = None;
        self.status = status;
        Ok(())
    }

    pub fn resume(&mut self, now: Instant) -> Result<()> {
        if self.status != SessionStatus::Paused {
            return Err(EngineError::InvalidTransition {
                from: self.status,
                action: LifecycleAction::Resume,
            });
        }
        self.status = transition(self.status, LifecycleAction::Resume)?;
        self.running_anchor = Some(now);
        Ok(())
    }

    /// Live/Paused -> Ended; the clock is discarded. Returns the elapsed
    /// time at the moment of ending.
    pub fn end(&mut self, now: Instant) -> Result<u64> {
        let status = transition(self.status, LifecycleAction::End)?;
        let final_ms = self.current_elapsed_ms(now);
        self.status = status;
        self.elapsed_ms = 0;
        self.elapsed_ms_baseline = 0;
        self.running_anchor = None;
        Ok(final_ms)
    }

    /// Meeting link, exposed only while the session is live.
    pub fn join_reference(&self) -> Option<&str> {
        if self.status != SessionStatus::Live {
            return None;
        }
        self.session
            .as_ref()
            .and_then(|info| info.join_reference.as_deref())
            .filter(|link| !link.is_empty())
    }
}

/// `MM:SS`, or `H:MM:SS` once an hour has passed.
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}
