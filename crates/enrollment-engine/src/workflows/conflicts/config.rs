use serde::{Deserialize, Serialize};

/// Thresholds for the detection passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Enrollment events strictly above this count inside the window are suspicious.
    pub suspicious_event_threshold: usize,
    pub suspicious_window_hours: i64,
}

impl DetectionConfig {
    /// Longest lookback the suspicious-activity pass accepts: one year.
    pub const MAX_WINDOW_HOURS: i64 = 24 * 365;
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            suspicious_event_threshold: 10,
            suspicious_window_hours: 24,
        }
    }
}
