use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Emotion, RiskLevel};

/// Identity details known before any classification arrives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantProfile {
    pub id: String,
    pub name: String,
    pub roll_no: String,
    pub emotion: Emotion,
}

impl ParticipantProfile {
    pub fn new(id: &str, name: &str, roll_no: &str, emotion: Emotion) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            roll_no: roll_no.to_string(),
            emotion,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub roll_no: String,
    pub emotion: Emotion,
    pub updated_at: DateTime<Utc>,
    /// Participants who leave stay on the roster with `active = false`.
    pub active: bool,
    /// Position in join order; the ranking falls back to it on ties.
    pub join_seq: u64,
}

impl Participant {
    pub fn from_profile(profile: ParticipantProfile, join_seq: u64, at: DateTime<Utc>) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            roll_no: profile.roll_no,
            emotion: profile.emotion,
            updated_at: at,
            active: true,
            join_seq,
        }
    }

    /// Entry for an id first seen through a classification event.
    pub fn unnamed(id: &str, emotion: Emotion, join_seq: u64, at: DateTime<Utc>) -> Self {
        Self::from_profile(ParticipantProfile::new(id, id, "", emotion), join_seq, at)
    }
}

/// A participant as shown in the attention-ordered view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RankedParticipant {
    #[serde(flatten)]
    pub participant: Participant,
    pub priority: u8,
    pub risk: RiskLevel,
}

impl From<Participant> for RankedParticipant {
    fn from(participant: Participant) -> Self {
        Self {
            priority: participant.emotion.priority(),
            risk: participant.emotion.risk(),
            participant,
        }
    }
}
