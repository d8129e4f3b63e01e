use std::sync::{Arc, Barrier};
use std::thread;

use super::common::*;
use crate::workflows::certificate::{
    CancellationState, CertificateId, CertificateServiceError, IssueCertificate,
    CANCELLATION_DETAIL_MAX,
};
use crate::workflows::concurrency::{
    ConcurrencyError, RepositoryError, Version, VersionedRepository,
};
use crate::workflows::inspection::{EvaluationResult, InspectionId};
use crate::workflows::ValidationError;

#[test]
fn issue_certifies_a_finalized_passing_inspection() {
    let fixture = fixture();
    let inspection = fixture.inspection(3, EvaluationResult::Yes);

    let certificate = fixture
        .certificates
        .issue(IssueCertificate {
            inspection_id: inspection.id.clone(),
            effective_on: date(2025, 4, 10),
        })
        .expect("certificate issues");

    assert_eq!(certificate.inspection_id, inspection.id);
    assert_eq!(certificate.farm_id, inspection.farm_id);
    assert_eq!(certificate.version, Version(0));
    assert_eq!(certificate.expires_on, date(2028, 4, 10));
    assert!(certificate.is_active());
    assert!(!certificate.cancellation_requested());
}

#[test]
fn issue_is_refused_before_finalization_or_after_a_fail() {
    let fixture = fixture();

    for stop_after in [0, 1, 2] {
        let inspection = fixture.inspection(stop_after, EvaluationResult::Yes);
        match fixture.certificates.issue(IssueCertificate {
            inspection_id: inspection.id.clone(),
            effective_on: date(2025, 4, 10),
        }) {
            Err(CertificateServiceError::Validation(
                ValidationError::InspectionNotFinalized { inspection_id },
            )) => assert_eq!(inspection_id, inspection.id.0),
            other => panic!("expected not finalized, got {other:?}"),
        }
    }

    let failed = fixture.inspection(3, EvaluationResult::No);
    assert!(matches!(
        fixture.certificates.issue(IssueCertificate {
            inspection_id: failed.id,
            effective_on: date(2025, 4, 10),
        }),
        Err(CertificateServiceError::Validation(
            ValidationError::InspectionNotPassed { .. }
        ))
    ));

    assert!(matches!(
        fixture.certificates.issue(IssueCertificate {
            inspection_id: InspectionId::from("insp-missing"),
            effective_on: date(2025, 4, 10),
        }),
        Err(CertificateServiceError::Concurrency(
            ConcurrencyError::NotFound { .. }
        ))
    ));
    assert_eq!(fixture.certificate_store.is_empty(), Ok(true));
}

#[test]
fn issuing_twice_for_one_inspection_is_a_duplicate() {
    let fixture = fixture();
    let certificate = fixture.issued();

    assert_eq!(
        fixture.certificates.issue(IssueCertificate {
            inspection_id: certificate.inspection_id,
            effective_on: date(2025, 5, 1),
        }),
        Err(CertificateServiceError::Repository(
            RepositoryError::AlreadyExists
        ))
    );
}

#[test]
fn detail_of_exactly_the_limit_is_accepted() {
    let fixture = fixture();
    let certificate = fixture.issued();
    let detail = "d".repeat(CANCELLATION_DETAIL_MAX);

    let updated = fixture
        .certificates
        .submit_cancellation_request(&certificate.id, Version(0), &detail, date(2025, 6, 1))
        .expect("request accepted");

    assert_eq!(updated.version, Version(1));
    assert!(updated.is_active());
    assert!(updated.cancellation_requested());
    assert_eq!(updated.cancellation_detail(), Some(detail.as_str()));
}

#[test]
fn over_long_or_blank_detail_is_rejected_before_the_store() {
    let fixture = fixture();
    let certificate = fixture.issued();

    for detail in ["x".repeat(300), "   ".to_string()] {
        match fixture.certificates.submit_cancellation_request(
            &certificate.id,
            Version(0),
            &detail,
            date(2025, 6, 1),
        ) {
            Err(CertificateServiceError::Validation(violation)) => {
                assert_eq!(violation.field(), Some("cancellation_detail"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    // Blank and over-long detail never reach the store, even with a stale version.
    assert!(matches!(
        fixture.certificates.submit_cancellation_request(
            &certificate.id,
            Version(9),
            "",
            date(2025, 6, 1)
        ),
        Err(CertificateServiceError::Validation(
            ValidationError::EmptyField { .. }
        ))
    ));

    let stored = fixture.certificates.get(&certificate.id).expect("stored");
    assert_eq!(stored.version, Version(0));
    assert_eq!(stored.cancellation, CancellationState::NotRequested);
}

#[test]
fn cancellation_runs_request_then_apply() {
    let fixture = fixture();
    let certificate = fixture.issued();

    let requested = fixture
        .certificates
        .submit_cancellation_request(
            &certificate.id,
            certificate.version,
            "  farm sold to a new owner  ",
            date(2025, 6, 1),
        )
        .expect("request accepted");
    assert_eq!(requested.cancellation_detail(), Some("farm sold to a new owner"));

    let cancelled = fixture
        .certificates
        .apply_cancellation(&requested.id, requested.version, date(2025, 6, 15))
        .expect("cancellation applied");

    assert_eq!(cancelled.version, Version(2));
    assert!(!cancelled.is_active());
    assert_eq!(
        cancelled.cancellation,
        CancellationState::Applied {
            detail: "farm sold to a new owner".to_string(),
            applied_on: date(2025, 6, 15),
        }
    );

    match fixture.certificates.submit_cancellation_request(
        &cancelled.id,
        cancelled.version,
        "again",
        date(2025, 7, 1),
    ) {
        Err(CertificateServiceError::Validation(ValidationError::InvalidTransition {
            state,
            ..
        })) => assert_eq!(state, "cancelled"),
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn cancellation_cannot_be_applied_without_a_request() {
    let fixture = fixture();
    let certificate = fixture.issued();

    assert!(matches!(
        fixture
            .certificates
            .apply_cancellation(&certificate.id, Version(0), date(2025, 6, 15)),
        Err(CertificateServiceError::Validation(
            ValidationError::InvalidTransition { .. }
        ))
    ));
    let stored = fixture.certificates.get(&certificate.id).expect("stored");
    assert_eq!(stored.version, Version(0));
    assert!(stored.is_active());
}

#[test]
fn pending_request_can_be_withdrawn() {
    let fixture = fixture();
    let certificate = fixture.issued();

    assert!(matches!(
        fixture
            .certificates
            .withdraw_cancellation_request(&certificate.id, Version(0)),
        Err(CertificateServiceError::Validation(
            ValidationError::InvalidTransition { .. }
        ))
    ));

    let requested = fixture
        .certificates
        .submit_cancellation_request(&certificate.id, Version(0), "duplicate", date(2025, 6, 1))
        .expect("request accepted");
    let withdrawn = fixture
        .certificates
        .withdraw_cancellation_request(&certificate.id, requested.version)
        .expect("request withdrawn");

    assert_eq!(withdrawn.version, Version(2));
    assert!(!withdrawn.cancellation_requested());
    assert_eq!(withdrawn.cancellation_detail(), None);
}

#[test]
fn stale_cancellation_request_conflicts_and_leaves_the_certificate() {
    let fixture = fixture();
    let certificate = fixture.issued();
    fixture
        .certificates
        .submit_cancellation_request(&certificate.id, Version(0), "first", date(2025, 6, 1))
        .expect("first request");
    fixture
        .certificates
        .withdraw_cancellation_request(&certificate.id, Version(1))
        .expect("withdrawn");
    fixture
        .certificates
        .submit_cancellation_request(&certificate.id, Version(2), "second", date(2025, 6, 2))
        .expect("second request");

    match fixture.certificates.submit_cancellation_request(
        &certificate.id,
        Version(2),
        "third",
        date(2025, 6, 3),
    ) {
        Err(CertificateServiceError::Concurrency(ConcurrencyError::Conflict {
            expected,
            current,
            ..
        })) => {
            assert_eq!(expected, Version(2));
            assert_eq!(current, Version(3));
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    let stored = fixture.certificates.get(&certificate.id).expect("stored");
    assert_eq!(stored.version, Version(3));
    assert_eq!(stored.cancellation_detail(), Some("second"));
}

#[test]
fn concurrent_committee_members_cannot_both_cancel() {
    const MEMBERS: usize = 8;
    let fixture = Arc::new(fixture());
    let certificate = fixture.issued();
    let barrier = Arc::new(Barrier::new(MEMBERS));

    let handles: Vec<_> = (0..MEMBERS)
        .map(|member| {
            let fixture = Arc::clone(&fixture);
            let barrier = Arc::clone(&barrier);
            let id = certificate.id.clone();
            thread::spawn(move || {
                barrier.wait();
                fixture.certificates.submit_cancellation_request(
                    &id,
                    Version(0),
                    &format!("member {member} requests cancellation"),
                    date(2025, 6, 1),
                )
            })
        })
        .collect();
    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("member thread"))
        .collect();

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|outcome| matches!(
                outcome,
                Err(CertificateServiceError::Concurrency(
                    ConcurrencyError::Conflict { .. }
                ))
            ))
            .count(),
        MEMBERS - 1
    );
    let stored = fixture
        .certificate_store
        .get(&CertificateId(format!("cert-{}", certificate.inspection_id)))
        .expect("store reachable")
        .expect("certificate stored");
    assert_eq!(stored.version, Version(1));
}
