use serde::{Deserialize, Serialize};

use super::super::domain::Verdict;
use super::config::EvaluationConfig;
use super::rules::Tally;

/// Why a requirement set failed, so the auditor can see what to revisit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailReason {
    MainRequirementsFailed { count: usize },
    SecondaryBelowThreshold { compliance: u8, threshold: u8 },
}

impl FailReason {
    pub fn summary(&self) -> String {
        match self {
            FailReason::MainRequirementsFailed { count } => {
                format!("{count} main requirement(s) not met")
            }
            FailReason::SecondaryBelowThreshold {
                compliance,
                threshold,
            } => format!("secondary compliance {compliance}% is below the required {threshold}%"),
        }
    }
}

/// The main and secondary conditions are ANDed; neither can compensate for the other.
pub(crate) fn decide_verdict(
    tally: &Tally,
    compliance: u8,
    config: &EvaluationConfig,
) -> (Verdict, Vec<FailReason>) {
    let mut reasons = Vec::new();

    if tally.main_failed > 0 {
        reasons.push(FailReason::MainRequirementsFailed {
            count: tally.main_failed,
        });
    }

    // An item without secondary requirements satisfies the secondary condition.
    let secondary_satisfied =
        tally.secondary_total == 0 || compliance >= config.secondary_pass_threshold;
    if !secondary_satisfied {
        reasons.push(FailReason::SecondaryBelowThreshold {
            compliance,
            threshold: config.secondary_pass_threshold,
        });
    }

    let verdict = if reasons.is_empty() {
        Verdict::Pass
    } else {
        Verdict::Fail
    };
    (verdict, reasons)
}
