use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Closed set of labels the external classifier can produce.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Emotion {
    Focused,
    Happy,
    Neutral,
    Bored,
    Confused,
    Distracted,
    Disengaged,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Focused,
        Emotion::Happy,
        Emotion::Neutral,
        Emotion::Bored,
        Emotion::Confused,
        Emotion::Distracted,
        Emotion::Disengaged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Focused => "Focused",
            Emotion::Happy => "Happy",
            Emotion::Neutral => "Neutral",
            Emotion::Bored => "Bored",
            Emotion::Confused => "Confused",
            Emotion::Distracted => "Distracted",
            Emotion::Disengaged => "Disengaged",
        }
    }

    /// Attention priority; lower values surface first in the ranked view.
    pub fn priority(&self) -> u8 {
        match self {
            Emotion::Disengaged => 0,
            Emotion::Distracted | Emotion::Confused => 1,
            Emotion::Bored => 2,
            Emotion::Neutral => 3,
            Emotion::Happy | Emotion::Focused => 4,
        }
    }

    /// Aggregate bucket this label counts towards. Neutral is not counted.
    pub fn mood(&self) -> Option<MoodKind> {
        match self {
            Emotion::Focused | Emotion::Happy => Some(MoodKind::Focused),
            Emotion::Neutral => None,
            Emotion::Confused => Some(MoodKind::Confused),
            Emotion::Bored => Some(MoodKind::Bored),
            Emotion::Distracted | Emotion::Disengaged => Some(MoodKind::Distracted),
        }
    }

    /// Labels that count as positive attention for the engagement score.
    pub fn is_attentive(&self) -> bool {
        matches!(self, Emotion::Focused | Emotion::Happy)
    }

    pub fn risk(&self) -> RiskLevel {
        match self.priority() {
            0 | 1 => RiskLevel::High,
            2 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Emotion::ALL
            .into_iter()
            .find(|emotion| emotion.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| EngineError::UnknownEmotion(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum MoodKind {
    Focused,
    Confused,
    Bored,
    Distracted,
}

impl MoodKind {
    /// Display order of the distribution; also the tie-break order for rounding.
    pub const ALL: [MoodKind; 4] = [
        MoodKind::Focused,
        MoodKind::Confused,
        MoodKind::Bored,
        MoodKind::Distracted,
    ];

    pub fn index(&self) -> usize {
        match self {
            MoodKind::Focused => 0,
            MoodKind::Confused => 1,
            MoodKind::Bored => 2,
            MoodKind::Distracted => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MoodBucket {
    pub kind: MoodKind,
    pub percent: u8,
}

/// Four buckets in `MoodKind::ALL` order.
pub type MoodDistribution = [MoodBucket; 4];

pub fn distribution_from_percents(percents: [u8; 4]) -> MoodDistribution {
    let mut buckets = MoodKind::ALL.map(|kind| MoodBucket { kind, percent: 0 });
    for (bucket, percent) in buckets.iter_mut().zip(percents) {
        bucket.percent = percent;
    }
    buckets
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}
