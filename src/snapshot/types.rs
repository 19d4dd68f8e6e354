use serde::{Deserialize, Serialize};

use crate::aggregation::momentum::{momentum, Momentum};
use crate::models::{distribution_from_percents, MoodBucket, MoodDistribution, RankedParticipant};
use crate::session::{format_elapsed, SessionStatus};

/// Distribution shown before the first tick.
pub const SEED_MOOD_PERCENTS: [u8; 4] = [55, 15, 20, 10];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EngagementScore {
    pub current: u8,
    /// Score before the most recent tick.
    pub previous: u8,
}

impl EngagementScore {
    pub fn steady(score: u8) -> Self {
        Self {
            current: score,
            previous: score,
        }
    }

    pub fn momentum(&self) -> Momentum {
        momentum(self.current, self.previous)
    }

    pub fn tier(&self) -> EngagementTier {
        match self.current {
            71.. => EngagementTier::Healthy,
            51..=70 => EngagementTier::Moderate,
            _ => EngagementTier::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EngagementTier {
    Healthy,
    Moderate,
    Low,
}

/// Everything a consumer can read about the session, as of one tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub engagement: EngagementScore,
    pub mood: MoodDistribution,
    pub participants: Vec<RankedParticipant>,
    pub student_count: u32,
    pub state: SessionStatus,
    pub elapsed_secs: u64,
    /// Number of completed aggregation ticks.
    pub tick: u64,
}

impl Snapshot {
    pub fn seed(initial_score: u8, student_count: u32) -> Self {
        Self {
            engagement: EngagementScore::steady(initial_score.min(100)),
            mood: distribution_from_percents(SEED_MOOD_PERCENTS),
            participants: Vec::new(),
            student_count,
            state: SessionStatus::Idle,
            elapsed_secs: 0,
            tick: 0,
        }
    }

    pub fn momentum(&self) -> Momentum {
        self.engagement.momentum()
    }

    /// Bucket with the largest share; the earlier bucket wins a tie.
    pub fn dominant_mood(&self) -> MoodBucket {
        self.mood
            .iter()
            .copied()
            .fold(self.mood[0], |best, bucket| {
                if bucket.percent > best.percent {
                    bucket
                } else {
                    best
                }
            })
    }

    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed_secs)
    }

    /// Copy with lifecycle fields replaced and aggregates left as they were.
    pub fn with_lifecycle(&self, state: SessionStatus, elapsed_secs: u64) -> Self {
        Self {
            state,
            elapsed_secs,
            ..self.clone()
        }
    }
}
