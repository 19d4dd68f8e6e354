mod publisher;
mod types;

pub use publisher::SnapshotPublisher;
pub use types::{EngagementScore, EngagementTier, Snapshot, SEED_MOOD_PERCENTS};
