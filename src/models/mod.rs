mod emotion;
mod participant;

pub use emotion::{
    distribution_from_percents, Emotion, MoodBucket, MoodDistribution, MoodKind, RiskLevel,
};
pub use participant::{Participant, ParticipantProfile, RankedParticipant};
