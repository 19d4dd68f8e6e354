use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use serde::{Deserialize, Serialize};

use crate::models::{Emotion, Participant, ParticipantProfile};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// One decoded classification from the external classifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub participant_id: String,
    pub emotion: Emotion,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    /// Existing participant's label replaced.
    Applied,
    /// Unknown id; a new roster entry was created.
    Created,
    /// Older than the recorded observation; dropped.
    Stale,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IngestionStats {
    pub signals_accepted: u64,
    pub signals_stale: u64,
}

/// Latest-wins store of per-participant emotion state.
///
/// Writers only contend on the shard holding their participant, so many
/// classifier sources can record concurrently. The aggregation tick reads a
/// cloned, join-ordered view through [`SignalBuffer::roster`].
pub struct SignalBuffer {
    roster: DashMap<String, Participant>,
    next_seq: AtomicU64,
    student_count: AtomicU32,
    fresh: AtomicBool,
    accepted: AtomicU64,
    stale: AtomicU64,
}

impl SignalBuffer {
    pub fn new(initial_student_count: u32) -> Self {
        Self {
            roster: DashMap::new(),
            next_seq: AtomicU64::new(0),
            student_count: AtomicU32::new(initial_student_count),
            fresh: AtomicBool::new(false),
            accepted: AtomicU64::new(0),
            stale: AtomicU64::new(0),
        }
    }

    pub fn record_signal(
        &self,
        participant_id: &str,
        emotion: Emotion,
        observed_at: DateTime<Utc>,
    ) -> SignalOutcome {
        let outcome = match self.roster.entry(participant_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let participant = entry.get_mut();
                if observed_at < participant.updated_at {
                    SignalOutcome::Stale
                } else {
                    if !participant.active {
                        participant.active = true;
                        self.adjust_student_count(1);
                    }
                    participant.emotion = emotion;
                    participant.updated_at = observed_at;
                    SignalOutcome::Applied
                }
            }
            Entry::Vacant(entry) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                entry.insert(Participant::unnamed(participant_id, emotion, seq, observed_at));
                self.adjust_student_count(1);
                SignalOutcome::Created
            }
        };

        match outcome {
            SignalOutcome::Stale => {
                self.stale.fetch_add(1, Ordering::Relaxed);
                log_warn!(
                    "dropping stale signal for participant {} observed at {}",
                    participant_id,
                    observed_at
                );
            }
            SignalOutcome::Applied | SignalOutcome::Created => {
                self.accepted.fetch_add(1, Ordering::Relaxed);
                self.fresh.store(true, Ordering::Release);
            }
        }

        outcome
    }

    pub fn record(&self, signal: &Signal) -> SignalOutcome {
        self.record_signal(&signal.participant_id, signal.emotion, signal.observed_at)
    }

    /// Adds a known participant without counting it as a join.
    ///
    /// Used to load a roster before the session goes live.
    pub fn register(&self, profile: ParticipantProfile, at: DateTime<Utc>) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.roster
            .entry(profile.id.clone())
            .or_insert_with(|| Participant::from_profile(profile, seq, at));
    }

    pub fn participant_joined(&self, profile: ParticipantProfile, at: DateTime<Utc>) {
        match self.roster.entry(profile.id.clone()) {
            Entry::Occupied(mut entry) => {
                let participant = entry.get_mut();
                if participant.active {
                    return;
                }
                participant.active = true;
                participant.name = profile.name;
                participant.roll_no = profile.roll_no;
            }
            Entry::Vacant(entry) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                entry.insert(Participant::from_profile(profile, seq, at));
            }
        }
        self.adjust_student_count(1);
        log_info!("participant joined, {} students present", self.student_count());
    }

    /// Marks the participant inactive. Returns false for unknown or already
    /// inactive ids.
    pub fn participant_left(&self, participant_id: &str) -> bool {
        let Some(mut participant) = self.roster.get_mut(participant_id) else {
            return false;
        };
        if !participant.active {
            return false;
        }
        participant.active = false;
        drop(participant);

        self.adjust_student_count(-1);
        true
    }

    /// Applies a join/leave delta, saturating at zero.
    pub fn adjust_student_count(&self, delta: i32) {
        let _ = self
            .student_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                Some(count.saturating_add_signed(delta))
            });
    }

    pub fn set_student_count(&self, count: u32) {
        self.student_count.store(count, Ordering::Release);
    }

    pub fn student_count(&self) -> u32 {
        self.student_count.load(Ordering::Acquire)
    }

    /// Returns whether any signal was accepted since the previous call.
    pub fn take_fresh(&self) -> bool {
        self.fresh.swap(false, Ordering::AcqRel)
    }

    /// Clone of every participant, in join order.
    pub fn roster(&self) -> Vec<Participant> {
        let mut participants: Vec<Participant> =
            self.roster.iter().map(|entry| entry.value().clone()).collect();
        participants.sort_by_key(|participant| participant.join_seq);
        participants
    }

    pub fn get(&self, participant_id: &str) -> Option<Participant> {
        self.roster.get(participant_id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn stats(&self) -> IngestionStats {
        IngestionStats {
            signals_accepted: self.accepted.load(Ordering::Relaxed),
            signals_stale: self.stale.load(Ordering::Relaxed),
        }
    }
}
