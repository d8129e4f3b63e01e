use super::super::domain::{EvaluationResult, Requirement, RequirementClass};

/// Counts gathered in a single pass over a requirement set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Tally {
    pub main_total: usize,
    pub main_failed: usize,
    pub secondary_total: usize,
    pub secondary_passed: usize,
}

pub(crate) fn tally<'a>(requirements: impl IntoIterator<Item = &'a Requirement>) -> Tally {
    let mut tally = Tally::default();
    for requirement in requirements {
        let passed = requirement.result == EvaluationResult::Yes;
        match requirement.class {
            RequirementClass::Main => {
                tally.main_total += 1;
                if !passed {
                    tally.main_failed += 1;
                }
            }
            RequirementClass::Secondary => {
                tally.secondary_total += 1;
                if passed {
                    tally.secondary_passed += 1;
                }
            }
        }
    }
    tally
}

/// `passed / total * 100` rounded half-up, in integer arithmetic. Zero when `total` is zero.
pub(crate) fn compliance_percent(passed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let passed = passed.min(total) as u64;
    let total = total as u64;
    ((200 * passed + total) / (2 * total)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up() {
        assert_eq!(compliance_percent(6, 10), 60);
        assert_eq!(compliance_percent(1, 8), 13); // 12.5
        assert_eq!(compliance_percent(1, 3), 33); // 33.33
        assert_eq!(compliance_percent(2, 3), 67); // 66.67
        assert_eq!(compliance_percent(119, 200), 60); // 59.5
        assert_eq!(compliance_percent(0, 7), 0);
        assert_eq!(compliance_percent(7, 7), 100);
    }

    #[test]
    fn empty_total_reports_zero() {
        assert_eq!(compliance_percent(0, 0), 0);
    }

    #[test]
    fn compliance_never_decreases_as_more_pass() {
        for total in 1..=40 {
            let mut previous = 0;
            for passed in 0..=total {
                let current = compliance_percent(passed, total);
                assert!(current >= previous, "{passed}/{total} dropped");
                previous = current;
            }
            assert_eq!(previous, 100);
        }
    }
}
