/// Fixed tuning constants for one aggregation tick.
#[derive(Debug, Clone)]
pub struct AggregationConfig {
    /// Weight of the classifier-derived target when blending with the previous score
    pub blend_factor: f64,

    /// Largest step of the fallback random walk, in score points
    pub max_perturbation: i32,

    /// Bounds for the synthetic Focused share when no classifier is attached
    pub synthetic_focused_min: u32,
    pub synthetic_focused_max: u32,

    /// Split of the non-focused share across Confused, Bored and Distracted
    pub synthetic_split: [u32; 3],
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            blend_factor: 0.5,
            max_perturbation: 5,
            synthetic_focused_min: 20,
            synthetic_focused_max: 80,
            synthetic_split: [2, 2, 1],
        }
    }
}
