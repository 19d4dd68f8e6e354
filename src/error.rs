use thiserror::Error;

use crate::session::{LifecycleAction, SessionStatus};

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures surfaced to callers of the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Lifecycle operation attempted from a state that does not permit it.
    #[error("cannot {action} a session that is {from}")]
    InvalidTransition {
        from: SessionStatus,
        action: LifecycleAction,
    },

    /// Aggregation requested while the session is not live.
    #[error("aggregation requires a live session (current state: {0})")]
    InvalidState(SessionStatus),

    /// Internal consistency check failed; the tick is discarded.
    #[error("aggregation invariant violated: {0}")]
    InvariantViolation(String),

    #[error("unknown emotion label '{0}'")]
    UnknownEmotion(String),
}
