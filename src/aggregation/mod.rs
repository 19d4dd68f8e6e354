pub mod config;
pub mod engine;
pub mod momentum;
pub mod mood;
pub mod ranking;
pub mod scoring;

pub use config::AggregationConfig;
pub use engine::{compute_snapshot, AggregationStats, Aggregator, TickInput};
pub use momentum::{momentum, Momentum, MOMENTUM_THRESHOLD};
pub use ranking::rank_participants;
