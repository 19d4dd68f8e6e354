pub mod buffer;

pub use buffer::{IngestionStats, Signal, SignalBuffer, SignalOutcome};
