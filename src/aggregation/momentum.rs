use serde::{Deserialize, Serialize};

/// Score change (exclusive) beyond which the trend is no longer Stable.
pub const MOMENTUM_THRESHOLD: i32 = 2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Momentum {
    Improving,
    Declining,
    Stable,
}

pub fn momentum(current: u8, previous: u8) -> Momentum {
    let diff = i32::from(current) - i32::from(previous);
    if diff > MOMENTUM_THRESHOLD {
        Momentum::Improving
    } else if diff < -MOMENTUM_THRESHOLD {
        Momentum::Declining
    } else {
        Momentum::Stable
    }
}
