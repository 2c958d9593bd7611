use serde::{Deserialize, Serialize};

use super::domain::IDEAL_UTILIZATION;

/// Knobs for plan generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancingConfig {
    /// Default target utilization percentage when a request does not supply one.
    pub target_utilization: f64,
    pub minutes_per_operation: u32,
    /// Candidates fetched per requested transfer to absorb schedule-conflict rejections.
    pub candidate_multiplier: usize,
}

impl Default for BalancingConfig {
    fn default() -> Self {
        Self {
            target_utilization: IDEAL_UTILIZATION,
            minutes_per_operation: 5,
            candidate_multiplier: 2,
        }
    }
}
