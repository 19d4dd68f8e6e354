use rand::Rng;

use crate::models::Participant;

pub const MAX_SCORE: u8 = 100;

/// Share of active participants showing positive attention, scaled to 0..=100.
/// Returns `None` when nobody is active.
pub fn attentive_target(roster: &[Participant]) -> Option<u8> {
    let (attentive, active) = roster
        .iter()
        .filter(|participant| participant.active)
        .fold((0u64, 0u64), |(attentive, active), participant| {
            (attentive + u64::from(participant.emotion.is_attentive()), active + 1)
        });

    if active == 0 {
        return None;
    }

    // Round half up without going through floats.
    let target = (200 * attentive + active) / (2 * active);
    Some(target.min(u64::from(MAX_SCORE)) as u8)
}

/// Exponential blend of the previous score towards `target`.
pub fn blend_score(previous: u8, target: u8, blend_factor: f64) -> u8 {
    let alpha = blend_factor.clamp(0.0, 1.0);
    let blended = alpha * f64::from(target) + (1.0 - alpha) * f64::from(previous);
    blended.round().clamp(0.0, f64::from(MAX_SCORE)) as u8
}

/// Bounded random walk used when no classifier signal arrived this tick.
pub fn perturb_score<R: Rng + ?Sized>(previous: u8, max_step: i32, rng: &mut R) -> u8 {
    let step = max_step.abs();
    let delta = rng.gen_range(-step..=step);
    (i32::from(previous) + delta).clamp(0, i32::from(MAX_SCORE)) as u8
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::models::Emotion;

    fn roster(emotions: &[Emotion]) -> Vec<Participant> {
        emotions
            .iter()
            .enumerate()
            .map(|(idx, emotion)| {
                Participant::unnamed(&idx.to_string(), *emotion, idx as u64, Utc::now())
            })
            .collect()
    }

    #[test]
    fn target_counts_focused_and_happy() {
        let participants = roster(&[
            Emotion::Focused,
            Emotion::Happy,
            Emotion::Bored,
            Emotion::Neutral,
        ]);
        assert_eq!(attentive_target(&participants), Some(50));
    }

    #[test]
    fn target_rounds_half_up() {
        // 2 of 3 is 66.67
        let participants = roster(&[Emotion::Focused, Emotion::Focused, Emotion::Bored]);
        assert_eq!(attentive_target(&participants), Some(67));
    }

    #[test]
    fn inactive_participants_are_ignored() {
        let mut participants = roster(&[Emotion::Focused, Emotion::Disengaged]);
        participants[1].active = false;
        assert_eq!(attentive_target(&participants), Some(100));

        participants[0].active = false;
        assert_eq!(attentive_target(&participants), None);
    }

    #[test]
    fn blend_moves_halfway() {
        assert_eq!(blend_score(80, 40, 0.5), 60);
        assert_eq!(blend_score(0, 100, 1.0), 100);
        assert_eq!(blend_score(33, 100, 0.0), 33);
    }

    #[test]
    fn random_walk_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut score = 50u8;
        for _ in 0..10_000 {
            let next = perturb_score(score, 5, &mut rng);
            assert!(next <= MAX_SCORE);
            assert!((i32::from(next) - i32::from(score)).abs() <= 5);
            score = next;
        }
    }

    #[test]
    fn random_walk_clamps_at_edges() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            assert!(perturb_score(100, 5, &mut rng) >= 95);
            assert!(perturb_score(0, 5, &mut rng) <= 5);
            assert!(perturb_score(98, 40, &mut rng) <= MAX_SCORE);
        }
    }
}
