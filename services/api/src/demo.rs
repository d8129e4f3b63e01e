use crate::infra::{parse_date, InspectionStore, Services};
use chrono::NaiveDate;
use clap::Args;
use farmcert::error::AppError;
use farmcert::workflows::certificate::{CertificatePolicy, IssueCertificate};
use farmcert::workflows::concurrency::Version;
use farmcert::workflows::inspection::{
    AuditorId, EvaluationConfig, EvaluationMethod, EvaluationResult, FarmId, InspectionId,
    InspectionResultCalculator, Requirement, RequirementClass, RequirementId, ResumptionTable,
    ScheduleInspection, SessionId, StepwiseEvaluationSession, VerdictBreakdown,
    DEFAULT_SECONDARY_PASS_THRESHOLD,
};
use farmcert::workflows::records::{AdvisoryFields, RecordServiceError};
use std::sync::Arc;

type DemoSession = StepwiseEvaluationSession<InspectionStore, ResumptionTable>;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Inspection date (YYYY-MM-DD); later steps are dated relative to it
    #[arg(long, value_parser = parse_date, default_value = "2025-03-03")]
    pub(crate) date: NaiveDate,
    /// Answer the first main requirement with NO so the inspection fails
    #[arg(long)]
    pub(crate) fail_main: bool,
    /// Minimum secondary compliance percentage
    #[arg(
        long,
        value_parser = clap::value_parser!(u8).range(0..=100),
        default_value_t = DEFAULT_SECONDARY_PASS_THRESHOLD
    )]
    pub(crate) threshold: u8,
}

#[derive(Args, Debug)]
pub(crate) struct VerdictArgs {
    /// Number of main requirements
    #[arg(long, default_value_t = 0)]
    pub(crate) main_total: usize,
    /// Main requirements not answered YES
    #[arg(long, default_value_t = 0)]
    pub(crate) main_failed: usize,
    /// Number of secondary requirements
    #[arg(long, default_value_t = 0)]
    pub(crate) secondary_total: usize,
    /// Secondary requirements answered YES
    #[arg(long, default_value_t = 0)]
    pub(crate) secondary_passed: usize,
    /// Minimum secondary compliance percentage
    #[arg(
        long,
        value_parser = clap::value_parser!(u8).range(0..=100),
        default_value_t = DEFAULT_SECONDARY_PASS_THRESHOLD
    )]
    pub(crate) threshold: u8,
}

impl VerdictArgs {
    pub(crate) fn check_counts(&self) -> Result<(), String> {
        if self.main_failed > self.main_total {
            return Err(format!(
                "--main-failed ({}) cannot exceed --main-total ({})",
                self.main_failed, self.main_total
            ));
        }
        if self.secondary_passed > self.secondary_total {
            return Err(format!(
                "--secondary-passed ({}) cannot exceed --secondary-total ({})",
                self.secondary_passed, self.secondary_total
            ));
        }
        Ok(())
    }

    fn requirements(&self) -> Vec<Requirement> {
        let main = (0..self.main_total).map(|index| {
            let result = if index < self.main_failed {
                EvaluationResult::No
            } else {
                EvaluationResult::Yes
            };
            (RequirementClass::Main, result)
        });
        let secondary = (0..self.secondary_total).map(|index| {
            let result = if index < self.secondary_passed {
                EvaluationResult::Yes
            } else {
                EvaluationResult::No
            };
            (RequirementClass::Secondary, result)
        });

        main.chain(secondary)
            .enumerate()
            .map(|(index, (class, result))| Requirement {
                id: RequirementId(format!("req-{}", index + 1)),
                sequence: (index + 1) as u16,
                class,
                description: String::new(),
                result,
                method: EvaluationMethod::Observation,
                note: None,
            })
            .collect()
    }
}

pub(crate) fn run_verdict(args: VerdictArgs) {
    let calculator = InspectionResultCalculator::new(EvaluationConfig {
        secondary_pass_threshold: args.threshold,
    });
    let breakdown = calculator.evaluate(args.requirements().iter());
    render_breakdown(&breakdown);
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let evaluation = EvaluationConfig {
        secondary_pass_threshold: args.threshold,
    };
    let services = Services::in_memory(evaluation, CertificatePolicy::default());
    let inspections = &services.inspections;

    println!("== Farm certification demo ==");
    let inspection = inspections.schedule(ScheduleInspection {
        farm_id: FarmId::from("farm-0042"),
        auditor_id: AuditorId::from("auditor-ana"),
        scheduled_on: args.date,
    })?;
    println!(
        "Scheduled {} for {} on {} ({} items, version {})",
        inspection.id,
        inspection.farm_id,
        inspection.scheduled_on,
        inspection.items.len(),
        inspection.version
    );

    // Two browser tabs open the same inspection at the same version.
    let resumption = Arc::new(ResumptionTable::default());
    let mut tablet = inspections.open_session(
        SessionId::from("tablet"),
        inspection.id.clone(),
        Arc::clone(&resumption),
    )?;
    let mut laptop = inspections.open_session(
        SessionId::from("laptop"),
        inspection.id.clone(),
        Arc::clone(&resumption),
    )?;

    answer_current_item(&mut tablet, args.fail_main);
    tablet.save_current_item()?;
    println!(
        "Tablet saved item 1; inspection is now at version {}",
        tablet.observed_version()
    );

    answer_current_item(&mut laptop, false);
    match laptop.save_current_item() {
        Err(err) if err.requires_reload() => {
            println!("Laptop save refused: {err}");
            laptop.reload()?;
            println!(
                "Laptop reloaded at version {} and keeps item {} open",
                laptop.observed_version(),
                laptop.cursor() + 1
            );
        }
        Err(err) => return Err(err.into()),
        Ok(()) => println!("Laptop save unexpectedly accepted"),
    }
    drop(laptop);

    if let Err(err) = tablet.complete() {
        println!("Completion refused before all items were answered: {err}");
    }

    for _ in 1..tablet.items().len() {
        tablet.go_next();
        answer_current_item(&mut tablet, false);
        tablet.save_current_item()?;
    }
    println!(
        "All items saved; live preview: {}",
        tablet.preview().summary()
    );

    tablet.complete()?;
    println!(
        "Evaluation submitted; status {} at version {}",
        tablet.status().label(),
        tablet.observed_version()
    );

    let finalized_on = args.date + chrono::Days::new(7);
    let (finalized, breakdown) = inspections.finalize(
        tablet.inspection_id(),
        tablet.observed_version(),
        finalized_on,
    )?;
    println!("\nCommittee decision on {finalized_on}:");
    render_breakdown(&breakdown);

    certificate_walkthrough(&services, &finalized.id, finalized_on)?;
    advisory_walkthrough(&services, finalized_on)?;
    Ok(())
}

fn answer_current_item(session: &mut DemoSession, fail_main: bool) {
    let Some(item) = session.current_item() else {
        return;
    };
    let secondary = item
        .requirements
        .iter()
        .filter(|requirement| requirement.class == RequirementClass::Secondary)
        .count();
    let answers: Vec<(RequirementId, EvaluationResult)> = item
        .requirements
        .iter()
        .enumerate()
        .map(|(index, requirement)| {
            let result = match requirement.class {
                RequirementClass::Main if fail_main && index == 0 => EvaluationResult::No,
                RequirementClass::Main => EvaluationResult::Yes,
                // One unmet line on the record-keeping item keeps compliance below 100%.
                RequirementClass::Secondary
                    if secondary > 2 && index == item.requirements.len() - 1 =>
                {
                    EvaluationResult::No
                }
                RequirementClass::Secondary => EvaluationResult::Yes,
            };
            (requirement.id.clone(), result)
        })
        .collect();

    for (requirement_id, result) in answers {
        session.set_result(&requirement_id, result);
        session.set_method(&requirement_id, EvaluationMethod::Observation);
    }
}

fn certificate_walkthrough(
    services: &Services,
    inspection_id: &InspectionId,
    finalized_on: NaiveDate,
) -> Result<(), AppError> {
    let certificates = &services.certificates;
    let certificate = match certificates.issue(IssueCertificate {
        inspection_id: inspection_id.clone(),
        effective_on: finalized_on,
    }) {
        Ok(certificate) => certificate,
        Err(err) => {
            println!("\nNo certificate issued: {err}");
            return Ok(());
        }
    };
    println!(
        "\nIssued {} valid {} to {} (version {})",
        certificate.id, certificate.effective_on, certificate.expires_on, certificate.version
    );

    let requested_on = finalized_on + chrono::Days::new(30);
    let requested = certificates.submit_cancellation_request(
        &certificate.id,
        certificate.version,
        "Farm sold; new owner will apply separately",
        requested_on,
    )?;
    println!(
        "Cancellation requested on {requested_on}: {} (version {})",
        requested.cancellation.label(),
        requested.version
    );

    if let Err(err) =
        certificates.apply_cancellation(&certificate.id, certificate.version, requested_on)
    {
        println!("Committee working from the issued copy was refused: {err}");
    }

    let cancelled =
        certificates.apply_cancellation(&requested.id, requested.version, requested_on)?;
    println!(
        "Cancellation applied: {} (active: {}, version {})",
        cancelled.cancellation.label(),
        cancelled.is_active(),
        cancelled.version
    );
    Ok(())
}

fn advisory_walkthrough(services: &Services, visited_on: NaiveDate) -> Result<(), AppError> {
    let advisories = &services.advisories;
    let fields = AdvisoryFields {
        farm_id: FarmId::from("farm-0042"),
        advisor: "District extension office".to_string(),
        topic: "Chemical storage".to_string(),
        recommendation: "Fit a lock to the pesticide shed".to_string(),
        follow_up_on: Some(visited_on + chrono::Days::new(14)),
    };
    let advisory = advisories.create(fields.clone())?;
    println!(
        "\nAdvisory {} recorded for {} (version {})",
        advisory.id, advisory.fields.farm_id, advisory.version
    );

    let edited = advisories.edit(
        &advisory.id,
        advisory.version,
        AdvisoryFields {
            recommendation: "Fit a lock and a vent to the pesticide shed".to_string(),
            ..fields.clone()
        },
    )?;
    println!("Advisory edited; now at version {}", edited.version);

    match advisories.edit(&advisory.id, Version::INITIAL, fields) {
        Err(RecordServiceError::Concurrency(err)) => {
            println!("Second editor working from version 0 was refused: {err}")
        }
        Err(err) => return Err(err.into()),
        Ok(_) => println!("Stale advisory edit unexpectedly accepted"),
    }
    Ok(())
}

fn render_breakdown(breakdown: &VerdictBreakdown) {
    println!("Verdict: {}", breakdown.verdict.label().to_uppercase());
    println!(
        "  Main requirements: {} total, {} not met",
        breakdown.main_total, breakdown.main_failed
    );
    println!(
        "  Secondary requirements: {}/{} met ({}%, threshold {}%)",
        breakdown.secondary_passed,
        breakdown.secondary_total,
        breakdown.secondary_compliance,
        breakdown.secondary_threshold
    );
    println!("  {}", breakdown.summary());
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmcert::workflows::inspection::Verdict;

    fn verdict_args(
        main_total: usize,
        main_failed: usize,
        secondary_total: usize,
        secondary_passed: usize,
    ) -> VerdictArgs {
        VerdictArgs {
            main_total,
            main_failed,
            secondary_total,
            secondary_passed,
            threshold: DEFAULT_SECONDARY_PASS_THRESHOLD,
        }
    }

    fn breakdown(args: &VerdictArgs) -> VerdictBreakdown {
        let calculator = InspectionResultCalculator::new(EvaluationConfig {
            secondary_pass_threshold: args.threshold,
        });
        calculator.evaluate(args.requirements().iter())
    }

    #[test]
    fn verdict_counts_build_matching_requirements() {
        let args = verdict_args(5, 0, 5, 3);
        let result = breakdown(&args);
        assert_eq!(result.verdict, Verdict::Pass);
        assert_eq!(result.secondary_compliance, 60);

        let result = breakdown(&verdict_args(5, 1, 5, 5));
        assert_eq!(result.verdict, Verdict::Fail);
        assert_eq!(result.main_failed, 1);
    }

    #[test]
    fn verdict_counts_are_checked() {
        assert!(verdict_args(2, 3, 0, 0).check_counts().is_err());
        assert!(verdict_args(2, 0, 1, 2).check_counts().is_err());
        assert!(verdict_args(0, 0, 0, 0).check_counts().is_ok());
    }

    #[test]
    fn demo_runs_end_to_end() {
        let args = DemoArgs {
            date: NaiveDate::from_ymd_opt(2025, 3, 3).expect("valid date"),
            fail_main: false,
            threshold: DEFAULT_SECONDARY_PASS_THRESHOLD,
        };
        run_demo(args).expect("demo completes");
    }

    #[test]
    fn failing_demo_skips_the_certificate() {
        let args = DemoArgs {
            date: NaiveDate::from_ymd_opt(2025, 3, 3).expect("valid date"),
            fail_main: true,
            threshold: DEFAULT_SECONDARY_PASS_THRESHOLD,
        };
        run_demo(args).expect("demo completes");
    }
}
