mod config;
mod policy;
mod rules;

pub use config::{EvaluationConfig, DEFAULT_SECONDARY_PASS_THRESHOLD};
pub use policy::FailReason;

use super::domain::{InspectionItem, Requirement, Verdict};
use policy::decide_verdict;
use serde::{Deserialize, Serialize};

/// Stateless calculator turning requirement evaluations into a verdict.
///
/// The same rule applies to a single item and to a whole inspection; the inspection
/// scope flattens the requirements of every item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InspectionResultCalculator {
    config: EvaluationConfig,
}

impl InspectionResultCalculator {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn evaluate<'a>(
        &self,
        requirements: impl IntoIterator<Item = &'a Requirement>,
    ) -> VerdictBreakdown {
        let tally = rules::tally(requirements);
        let secondary_compliance =
            rules::compliance_percent(tally.secondary_passed, tally.secondary_total);
        let (verdict, fail_reasons) = decide_verdict(&tally, secondary_compliance, &self.config);

        VerdictBreakdown {
            verdict,
            main_total: tally.main_total,
            main_failed: tally.main_failed,
            secondary_total: tally.secondary_total,
            secondary_passed: tally.secondary_passed,
            secondary_compliance,
            secondary_threshold: self.config.secondary_pass_threshold,
            fail_reasons,
        }
    }

    /// Item-level verdict, used for display and navigation only.
    pub fn item_verdict(&self, item: &InspectionItem) -> Verdict {
        self.evaluate(item.requirements.iter()).verdict
    }

    pub fn inspection_breakdown(&self, items: &[InspectionItem]) -> VerdictBreakdown {
        self.evaluate(items.iter().flat_map(|item| item.requirements.iter()))
    }
}

/// Verdict plus the counts it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictBreakdown {
    pub verdict: Verdict,
    pub main_total: usize,
    pub main_failed: usize,
    pub secondary_total: usize,
    pub secondary_passed: usize,
    /// Zero when there are no secondary requirements; see `fail_reasons` for whether it mattered.
    pub secondary_compliance: u8,
    pub secondary_threshold: u8,
    pub fail_reasons: Vec<FailReason>,
}

impl VerdictBreakdown {
    pub fn summary(&self) -> String {
        match self.verdict {
            Verdict::Pass if self.secondary_total == 0 => {
                "pass: all main requirements met, no secondary requirements".to_string()
            }
            Verdict::Pass => format!(
                "pass: all main requirements met, secondary compliance {}%",
                self.secondary_compliance
            ),
            Verdict::Fail => {
                let reasons: Vec<String> =
                    self.fail_reasons.iter().map(FailReason::summary).collect();
                format!("fail: {}", reasons.join("; "))
            }
        }
    }
}
