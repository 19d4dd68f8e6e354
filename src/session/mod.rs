pub mod controller;
pub mod state;
mod ticker;

pub use controller::{EngineStats, SessionController, SessionStatusView, SessionSummary};
pub use state::{
    format_elapsed, transition, LifecycleAction, SessionInfo, SessionLaunch, SessionState,
    SessionStatus,
};
