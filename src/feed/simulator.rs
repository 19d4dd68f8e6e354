use std::sync::Arc;

use chrono::Utc;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{ingestion::SignalBuffer, models::Emotion};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::log_info;

/// Chance that a participant is re-labelled on a given round.
const RELABEL_PROBABILITY: f64 = 0.3;
/// Chance that the head count moves by one on a given round.
const HEADCOUNT_CHANGE_PROBABILITY: f64 = 0.2;

/// Label pool skewed towards attentive states.
pub const WEIGHTED_EMOTIONS: [(Emotion, u32); 7] = [
    (Emotion::Focused, 5),
    (Emotion::Neutral, 3),
    (Emotion::Happy, 2),
    (Emotion::Bored, 2),
    (Emotion::Confused, 1),
    (Emotion::Distracted, 1),
    (Emotion::Disengaged, 1),
];

pub fn sample_emotion<R: Rng + ?Sized>(rng: &mut R) -> Emotion {
    WEIGHTED_EMOTIONS
        .choose_weighted(rng, |(_, weight)| *weight)
        .map(|(emotion, _)| *emotion)
        .unwrap_or(Emotion::Neutral)
}

/// One round of synthetic classifier output over the current roster.
/// Returns the number of signals recorded.
pub fn simulate_round<R: Rng + ?Sized>(buffer: &SignalBuffer, rng: &mut R) -> usize {
    let observed_at = Utc::now();
    let mut recorded = 0;

    for participant in buffer.roster().iter().filter(|p| p.active) {
        if rng.gen_bool(RELABEL_PROBABILITY) {
            buffer.record_signal(&participant.id, sample_emotion(rng), observed_at);
            recorded += 1;
        }
    }

    if rng.gen_bool(HEADCOUNT_CHANGE_PROBABILITY) {
        buffer.adjust_student_count(if rng.gen_bool(0.5) { 1 } else { -1 });
    }

    recorded
}

/// Stand-in for the external classifier while a session runs in simulation mode.
pub async fn simulated_feed(
    buffer: Arc<SignalBuffer>,
    interval: Duration,
    rng_seed: Option<u64>,
    cancel_token: CancellationToken,
) {
    let mut rng = match rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_entropy(),
    };
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("simulated feed shutting down");
                break;
            }
            _ = ticker.tick() => {
                let recorded = simulate_round(&buffer, &mut rng);
                log_info!("simulated feed recorded {} signals", recorded);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::demo_roster;

    #[test]
    fn sampling_only_yields_pool_labels() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut seen_focused = 0;
        for _ in 0..1_000 {
            let emotion = sample_emotion(&mut rng);
            if emotion == Emotion::Focused {
                seen_focused += 1;
            }
        }
        // 5 of 16 weight units
        assert!((200..=430).contains(&seen_focused), "{seen_focused}");
    }

    #[test]
    fn rounds_only_touch_active_participants() {
        let buffer = SignalBuffer::new(42);
        let now = Utc::now();
        for profile in demo_roster() {
            buffer.register(profile, now);
        }
        buffer.participant_left("1");
        let before = buffer.get("1").unwrap();

        let mut rng = StdRng::seed_from_u64(8);
        let mut recorded = 0;
        for _ in 0..20 {
            recorded += simulate_round(&buffer, &mut rng);
        }

        assert!(recorded > 0);
        assert_eq!(buffer.get("1").unwrap(), before);
        assert_eq!(buffer.len(), 10);
    }
}
