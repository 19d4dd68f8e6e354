use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, time::Instant};

use crate::{
    aggregation::{
        config::AggregationConfig,
        mood::{distribution_total, mood_distribution, perturb_distribution},
        ranking::rank_participants,
        scoring::{attentive_target, blend_score, perturb_score, MAX_SCORE},
    },
    error::{EngineError, Result},
    ingestion::SignalBuffer,
    models::Participant,
    session::{SessionState, SessionStatus},
    snapshot::{EngagementScore, Snapshot, SnapshotPublisher},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Inputs for one tick beyond the previous snapshot.
pub struct TickInput<'a> {
    pub roster: &'a [Participant],
    /// A classifier signal was accepted since the last tick.
    pub fresh_signal: bool,
    /// Random walk and synthetic moods stand in for a missing classifier.
    pub simulation: bool,
    pub student_count: u32,
    pub elapsed_secs: u64,
}

/// Derives the next snapshot from the previous one. Pure apart from `rng`.
pub fn compute_snapshot<R: Rng + ?Sized>(
    previous: &Snapshot,
    input: &TickInput<'_>,
    config: &AggregationConfig,
    rng: &mut R,
) -> Snapshot {
    let prior = previous.engagement.current;

    let current = if input.fresh_signal {
        attentive_target(input.roster)
            .map(|target| blend_score(prior, target, config.blend_factor))
            .unwrap_or(prior)
    } else if input.simulation {
        perturb_score(prior, config.max_perturbation, rng)
    } else {
        prior
    };

    // The roster is authoritative whenever anyone in it maps to a bucket.
    let mood = match mood_distribution(input.roster) {
        Some(distribution) => distribution,
        None if input.simulation => perturb_distribution(&previous.mood, config, rng),
        None => previous.mood,
    };

    Snapshot {
        engagement: EngagementScore {
            current,
            previous: prior,
        },
        mood,
        participants: rank_participants(input.roster),
        student_count: input.student_count,
        state: SessionStatus::Live,
        elapsed_secs: input.elapsed_secs,
        tick: previous.tick + 1,
    }
}

pub fn check_invariants(snapshot: &Snapshot) -> Result<()> {
    let total = distribution_total(&snapshot.mood);
    if total != 100 {
        return Err(EngineError::InvariantViolation(format!(
            "mood buckets sum to {total}"
        )));
    }
    let EngagementScore { current, previous } = snapshot.engagement;
    if current > MAX_SCORE || previous > MAX_SCORE {
        return Err(EngineError::InvariantViolation(format!(
            "engagement score out of range ({previous} -> {current})"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AggregationStats {
    pub ticks_published: u64,
    pub ticks_aborted: u64,
}

/// Runs ticks against the shared buffer and owns the snapshot publisher.
///
/// Every read-aggregate-publish sequence holds `tick_lock`, so at most one
/// tick (or lifecycle republish) is in flight at a time.
pub struct Aggregator {
    buffer: Arc<SignalBuffer>,
    publisher: SnapshotPublisher,
    config: AggregationConfig,
    simulation: bool,
    tick_lock: Mutex<StdRng>,
    published: AtomicU64,
    aborted: AtomicU64,
}

impl Aggregator {
    pub fn new(
        buffer: Arc<SignalBuffer>,
        seed: Snapshot,
        config: AggregationConfig,
        simulation: bool,
        rng_seed: Option<u64>,
    ) -> Self {
        let rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            buffer,
            publisher: SnapshotPublisher::new(seed),
            config,
            simulation,
            tick_lock: Mutex::new(rng),
            published: AtomicU64::new(0),
            aborted: AtomicU64::new(0),
        }
    }

    /// Aggregates the buffer into the next snapshot. The status and clock are
    /// read from `session` while the tick lock is held.
    pub async fn tick(&self, session: &Mutex<SessionState>) -> Result<Arc<Snapshot>> {
        let mut rng = self.tick_lock.lock().await;
        let (status, elapsed_secs) = {
            let state = session.lock().await;
            (state.status, state.elapsed_secs(Instant::now()))
        };
        if status != SessionStatus::Live {
            return Err(EngineError::InvalidState(status));
        }

        let previous = self.publisher.current();
        let fresh_signal = self.buffer.take_fresh();
        let roster = self.buffer.roster();

        let input = TickInput {
            roster: &roster,
            fresh_signal,
            simulation: self.simulation,
            student_count: self.buffer.student_count(),
            elapsed_secs,
        };
        let next = compute_snapshot(&previous, &input, &self.config, &mut *rng);

        if let Err(err) = check_invariants(&next) {
            self.aborted.fetch_add(1, Ordering::Relaxed);
            log_error!("aborting tick {}: {err}", next.tick);
            debug_assert!(false, "aborting tick {}: {err}", next.tick);
            return Ok(previous);
        }

        self.published.fetch_add(1, Ordering::Relaxed);
        if next.tick % 20 == 0 {
            log_info!(
                "tick {}: engagement {} ({:?}), {} students",
                next.tick,
                next.engagement.current,
                next.momentum(),
                next.student_count
            );
        }
        Ok(self.publisher.publish(next))
    }

    /// Publishes the current aggregates under a new lifecycle state/clock.
    pub async fn republish(&self, status: SessionStatus, elapsed_secs: u64) -> Arc<Snapshot> {
        let _guard = self.tick_lock.lock().await;
        let previous = self.publisher.current();
        let mut next = previous.with_lifecycle(status, elapsed_secs);
        next.student_count = self.buffer.student_count();
        self.publisher.publish(next)
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.publisher.current()
    }

    pub fn publisher(&self) -> &SnapshotPublisher {
        &self.publisher
    }

    pub fn stats(&self) -> AggregationStats {
        AggregationStats {
            ticks_published: self.published.load(Ordering::Relaxed),
            ticks_aborted: self.aborted.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::aggregation::momentum::Momentum;
    use crate::feed::demo_roster;
    use crate::models::{distribution_from_percents, Emotion, MoodKind, ParticipantProfile};

    fn aggregator(simulation: bool) -> (Arc<SignalBuffer>, Aggregator) {
        let buffer = Arc::new(SignalBuffer::new(0));
        let aggregator = Aggregator::new(
            Arc::clone(&buffer),
            Snapshot::seed(78, 0),
            AggregationConfig::default(),
            simulation,
            Some(42),
        );
        (buffer, aggregator)
    }

    #[test]
    fn classifier_tick_blends_towards_attentive_share() {
        let now = Utc::now();
        let roster = vec![
            Participant::unnamed("a", Emotion::Focused, 0, now),
            Participant::unnamed("b", Emotion::Bored, 1, now),
            Participant::unnamed("c", Emotion::Bored, 2, now),
            Participant::unnamed("d", Emotion::Bored, 3, now),
        ];
        let previous = Snapshot::seed(78, 4);
        let input = TickInput {
            roster: &roster,
            fresh_signal: true,
            simulation: true,
            student_count: 4,
            elapsed_secs: 9,
        };

        let mut rng = StdRng::seed_from_u64(1);
        let next = compute_snapshot(&previous, &input, &AggregationConfig::default(), &mut rng);

        // target 25, blended with 78 -> 51.5 -> 52
        assert_eq!(
            next.engagement,
            EngagementScore {
                current: 52,
                previous: 78
            }
        );
        assert_eq!(next.momentum(), Momentum::Declining);
        assert_eq!(next.mood[MoodKind::Bored.index()].percent, 75);
        assert_eq!(next.participants[0].participant.emotion, Emotion::Bored);
        assert_eq!(next.tick, 1);
        assert_eq!(next.state, SessionStatus::Live);
    }

    #[test]
    fn without_classifier_or_simulation_the_score_holds() {
        let previous = Snapshot::seed(64, 0);
        let input = TickInput {
            roster: &[],
            fresh_signal: false,
            simulation: false,
            student_count: 0,
            elapsed_secs: 3,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let next = compute_snapshot(&previous, &input, &AggregationConfig::default(), &mut rng);
        assert_eq!(next.engagement, EngagementScore::steady(64));
        assert_eq!(next.mood, previous.mood);
    }

    #[test]
    fn simulated_ticks_stay_within_bounds() {
        let config = AggregationConfig::default();
        let mut rng = StdRng::seed_from_u64(99);
        let mut snapshot = Snapshot::seed(98, 0);
        for _ in 0..1_000 {
            let input = TickInput {
                roster: &[],
                fresh_signal: false,
                simulation: true,
                student_count: 0,
                elapsed_secs: 0,
            };
            snapshot = compute_snapshot(&snapshot, &input, &config, &mut rng);
            assert!(check_invariants(&snapshot).is_ok());
            let EngagementScore { current, previous } = snapshot.engagement;
            assert!((i32::from(current) - i32::from(previous)).abs() <= 5);
        }
    }

    #[test]
    fn invariant_check_rejects_bad_bundles() {
        let mut snapshot = Snapshot::seed(50, 0);
        snapshot.mood = distribution_from_percents([50, 20, 20, 9]);
        assert!(matches!(
            check_invariants(&snapshot),
            Err(EngineError::InvariantViolation(_))
        ));

        let mut snapshot = Snapshot::seed(50, 0);
        snapshot.engagement.current = 101;
        assert!(check_invariants(&snapshot).is_err());
    }

    fn session(status: SessionStatus, elapsed_ms: u64) -> Mutex<SessionState> {
        Mutex::new(SessionState {
            status,
            elapsed_ms,
            ..SessionState::default()
        })
    }

    #[tokio::test]
    async fn tick_requires_live_session() {
        let (_buffer, aggregator) = aggregator(false);
        for status in [SessionStatus::Idle, SessionStatus::Paused, SessionStatus::Ended] {
            assert_eq!(
                aggregator.tick(&session(status, 0)).await.unwrap_err(),
                EngineError::InvalidState(status)
            );
        }
        assert_eq!(aggregator.stats().ticks_published, 0);
        assert_eq!(aggregator.current().tick, 0);
    }

    #[tokio::test]
    async fn simulated_mood_follows_the_roster_between_signals() {
        let (buffer, aggregator) = aggregator(true);
        let now = Utc::now();
        for profile in demo_roster() {
            buffer.register(profile, now);
        }
        let live = session(SessionStatus::Live, 0);

        buffer.record_signal("1", Emotion::Confused, Utc::now());
        let first = aggregator.tick(&live).await.unwrap();
        assert_eq!(Some(first.mood), mood_distribution(&buffer.roster()));

        // No signal in between: the roster has not changed, neither may the mood.
        let quiet = aggregator.tick(&live).await.unwrap();
        assert_eq!(quiet.mood, first.mood);

        buffer.record_signal("2", Emotion::Focused, Utc::now());
        let third = aggregator.tick(&live).await.unwrap();
        assert_eq!(Some(third.mood), mood_distribution(&buffer.roster()));

        for _ in 0..10 {
            let next = aggregator.tick(&live).await.unwrap();
            assert_eq!(next.mood, third.mood);
        }
    }

    #[test]
    fn synthetic_mood_only_without_a_bucketed_roster() {
        let now = Utc::now();
        let neutral = vec![Participant::unnamed("a", Emotion::Neutral, 0, now)];
        let previous = Snapshot::seed(70, 1);
        let config = AggregationConfig::default();
        let mut rng = StdRng::seed_from_u64(5);

        let input = TickInput {
            roster: &neutral,
            fresh_signal: false,
            simulation: false,
            student_count: 1,
            elapsed_secs: 0,
        };
        let held = compute_snapshot(&previous, &input, &config, &mut rng);
        assert_eq!(held.mood, previous.mood);

        let input = TickInput {
            simulation: true,
            ..input
        };
        let synthetic = compute_snapshot(&previous, &input, &config, &mut rng);
        let focused = synthetic.mood[MoodKind::Focused.index()].percent;
        assert!((50..=60).contains(&focused));
        assert_eq!(distribution_total(&synthetic.mood), 100);
    }

    #[tokio::test]
    async fn tick_publishes_from_buffer() {
        let (buffer, aggregator) = aggregator(false);
        let now = Utc::now();
        buffer.register(ParticipantProfile::new("1", "Alice", "CS-001", Emotion::Focused), now);
        buffer.record_signal("2", Emotion::Disengaged, now);

        let published = aggregator
            .tick(&session(SessionStatus::Live, 12_000))
            .await
            .unwrap();

        assert_eq!(published.elapsed_secs, 12);
        assert_eq!(published.participants.len(), 2);
        assert_eq!(published.participants[0].participant.id, "2");
        assert_eq!(published.student_count, 1);
        assert_eq!(aggregator.current().tick, 1);
        assert_eq!(aggregator.stats().ticks_published, 1);
    }
}
