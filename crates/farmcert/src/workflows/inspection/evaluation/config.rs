use serde::{Deserialize, Serialize};

pub const DEFAULT_SECONDARY_PASS_THRESHOLD: u8 = 60;

/// Thresholds applied when turning requirement evaluations into a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Minimum secondary compliance percentage, inclusive.
    pub secondary_pass_threshold: u8,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            secondary_pass_threshold: DEFAULT_SECONDARY_PASS_THRESHOLD,
        }
    }
}
