use rand::Rng;

use crate::aggregation::config::AggregationConfig;
use crate::models::{distribution_from_percents, MoodDistribution, Participant};

/// Splits `units` across `weights` so the parts sum to exactly `units`.
///
/// Each part is floored first; the leftover units go one at a time to the
/// largest fractional remainders, earlier positions winning ties.
/// Returns `None` when every weight is zero.
pub fn apportion<const N: usize>(units: u32, weights: [u32; N]) -> Option<[u32; N]> {
    let total: u64 = weights.iter().map(|w| u64::from(*w)).sum();
    if total == 0 {
        return None;
    }

    let mut parts = [0u32; N];
    let mut remainders = [0u64; N];
    for (idx, weight) in weights.iter().enumerate() {
        let raw = u64::from(units) * u64::from(*weight);
        parts[idx] = (raw / total) as u32;
        remainders[idx] = raw % total;
    }

    let assigned: u32 = parts.iter().sum();
    let mut order: Vec<usize> = (0..N).collect();
    // Stable sort keeps index order among equal remainders.
    order.sort_by(|a, b| remainders[*b].cmp(&remainders[*a]));
    for idx in order.into_iter().take((units - assigned) as usize) {
        parts[idx] += 1;
    }

    Some(parts)
}

/// Distribution of active participants across the four mood buckets.
///
/// `None` when no active participant maps to a bucket (empty roster or
/// everyone Neutral); callers keep the previous distribution in that case.
pub fn mood_distribution(roster: &[Participant]) -> Option<MoodDistribution> {
    let mut counts = [0u32; 4];
    for participant in roster.iter().filter(|p| p.active) {
        if let Some(kind) = participant.emotion.mood() {
            counts[kind.index()] += 1;
        }
    }

    let percents = apportion(100, counts)?;
    Some(distribution_from_percents(percents.map(|p| p as u8)))
}

/// Synthetic distribution for sessions without a classifier feed.
///
/// Nudges the Focused share by at most the configured step within its bounds
/// and spreads the rest with the fixed split.
pub fn perturb_distribution<R: Rng + ?Sized>(
    previous: &MoodDistribution,
    config: &AggregationConfig,
    rng: &mut R,
) -> MoodDistribution {
    let step = config.max_perturbation.abs();
    let focused = (i64::from(previous[0].percent) + i64::from(rng.gen_range(-step..=step)))
        .clamp(
            i64::from(config.synthetic_focused_min),
            i64::from(config.synthetic_focused_max.min(100)),
        ) as u32;

    let rest = apportion(100 - focused, config.synthetic_split).unwrap_or([100 - focused, 0, 0]);
    distribution_from_percents([
        focused as u8,
        rest[0] as u8,
        rest[1] as u8,
        rest[2] as u8,
    ])
}

pub fn distribution_total(distribution: &MoodDistribution) -> u32 {
    distribution.iter().map(|bucket| u32::from(bucket.percent)).sum()
}
