use super::common::*;
use crate::workflows::conflicts::{
    ConflictDetector, ConflictError, ConflictService, ConflictStatus, ConflictType,
    DetectionConfig, ResolutionAction, ResolutionLog, ResolutionOutcome,
};
use crate::workflows::enrollment::{
    EnrollmentCommands, RepositoryError, SectionId, SectionRepository, StudentId,
};
use chrono::{Duration, Utc};

#[test]
fn detect_conflicts_reports_open_findings() {
    let store = store_with(vec![class("c1", "inst-1", 35, 30)]);
    enrollment_burst(&store, "stu-1", "c1", 12, Utc::now());
    let service = build_service(store);

    let conflicts = service
        .detect_conflicts(&institution())
        .expect("scan runs");

    assert_eq!(conflicts.len(), 2);
    assert_eq!(conflicts[0].conflict_type, ConflictType::CapacityExceeded);
    assert_eq!(conflicts[1].conflict_type, ConflictType::SuspiciousActivity);
    assert!(conflicts
        .iter()
        .all(|conflict| conflict.status == ConflictStatus::Open));
}

#[test]
fn dismissed_conflict_reports_its_status_on_rescan() {
    let store = store_with(vec![class("c1", "inst-1", 35, 30)]);
    let service = build_service(store.clone());

    let resolution = service
        .resolve_conflict(&capacity_conflict_id("c1"), request(ResolutionAction::Dismiss))
        .expect("dismissed");
    assert_eq!(resolution.resolved_by, "registrar@example.edu");

    let conflicts = service
        .detect_conflicts(&institution())
        .expect("scan runs");
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].status, ConflictStatus::Dismissed);
    assert_eq!(
        store
            .sections(&[SectionId::new("c1")])
            .expect("sections")[0]
            .capacity,
        30
    );
}

#[test]
fn capacity_increase_clears_the_conflict() {
    let store = store_with(vec![class("c1", "inst-1", 35, 30)]);
    let service = build_service(store.clone());

    service
        .resolve_conflict(
            &capacity_conflict_id("c1"),
            request(ResolutionAction::CapacityIncrease {
                class_id: SectionId::new("c1"),
                additional_seats: 5,
            }),
        )
        .expect("resolved");

    let section = store
        .section(&SectionId::new("c1"))
        .expect("lookup")
        .expect("section exists");
    assert_eq!(section.capacity, 35);
    assert!(service
        .detect_conflicts(&institution())
        .expect("scan runs")
        .is_empty());
}

#[test]
fn later_resolution_wins() {
    let store = store_with(vec![class("c1", "inst-1", 35, 30)]);
    let service = build_service(store.clone());
    let id = capacity_conflict_id("c1");

    service
        .resolve_conflict(&id, request(ResolutionAction::Dismiss))
        .expect("dismissed");
    service
        .resolve_conflict(
            &id,
            request(ResolutionAction::CapacityIncrease {
                class_id: SectionId::new("c1"),
                additional_seats: 1,
            }),
        )
        .expect("resolved");

    let conflicts = service
        .detect_conflicts(&institution())
        .expect("scan runs");
    assert_eq!(conflicts[0].status, ConflictStatus::Resolved);
    assert_eq!(store.for_conflict(&id).expect("log").len(), 2);
}

#[test]
fn manual_override_force_enrolls_beyond_capacity() {
    let store = store_with(vec![class("c1", "inst-1", 30, 30)]);
    let service = build_service(store.clone());

    service
        .resolve_conflict(
            &capacity_conflict_id("c1"),
            request(ResolutionAction::ManualOverride {
                student_id: StudentId::new("stu-9"),
                class_id: SectionId::new("c1"),
            }),
        )
        .expect("resolved");

    let record = store
        .enrollment(&StudentId::new("stu-9"), &SectionId::new("c1"))
        .expect("lookup")
        .expect("enrolled");
    assert!(record.flags.beyond_capacity);
    assert_eq!(
        store
            .section(&SectionId::new("c1"))
            .expect("lookup")
            .expect("section")
            .current_enrollment,
        31
    );
}

#[test]
fn student_transfer_moves_the_enrollment() {
    let store = store_with(vec![class("c1", "inst-1", 0, 30), class("c2", "inst-1", 0, 30)]);
    store
        .enroll(
            &StudentId::new("stu-1"),
            &SectionId::new("c1"),
            Utc::now() - Duration::days(3),
        )
        .expect("seed");
    let service = build_service(store.clone());

    service
        .resolve_conflict(
            &capacity_conflict_id("c1"),
            request(ResolutionAction::StudentTransfer {
                student_id: StudentId::new("stu-1"),
                from_class_id: SectionId::new("c1"),
                to_class_id: SectionId::new("c2"),
            }),
        )
        .expect("resolved");

    assert!(store
        .enrollment(&StudentId::new("stu-1"), &SectionId::new("c2"))
        .expect("lookup")
        .is_some());
    assert!(store
        .enrollment(&StudentId::new("stu-1"), &SectionId::new("c1"))
        .expect("lookup")
        .is_none());
}

#[test]
fn policy_exception_is_granted() {
    let store = store_with(vec![class("c1", "inst-1", 10, 30)]);
    let service = build_service(store.clone());

    service
        .resolve_conflict(
            &capacity_conflict_id("c1"),
            request(ResolutionAction::PolicyException {
                student_id: StudentId::new("stu-4"),
                class_id: SectionId::new("c1"),
                policy: "late_add".to_string(),
            }),
        )
        .expect("resolved");

    let exceptions = store.policy_exceptions().expect("exceptions");
    assert_eq!(exceptions.len(), 1);
    assert_eq!(exceptions[0].policy, "late_add");
}

#[test]
fn resolver_is_required() {
    let store = store_with(vec![class("c1", "inst-1", 35, 30)]);
    let service = build_service(store.clone());
    let mut blank = request(ResolutionAction::Dismiss);
    blank.resolved_by = "   ".to_string();

    match service.resolve_conflict(&capacity_conflict_id("c1"), blank) {
        Err(ConflictError::MissingResolver) => {}
        other => panic!("expected missing resolver, got {other:?}"),
    }
    assert!(store.resolutions().expect("log").is_empty());
}

#[test]
fn failed_action_keeps_the_audit_record() {
    let store = store_with(vec![class("c1", "inst-1", 0, 30), class("c2", "inst-1", 0, 30)]);
    let service = build_service(store.clone());

    let result = service.resolve_conflict(
        &capacity_conflict_id("c1"),
        request(ResolutionAction::StudentTransfer {
            student_id: StudentId::new("ghost"),
            from_class_id: SectionId::new("c1"),
            to_class_id: SectionId::new("c2"),
        }),
    );

    match result {
        Err(ConflictError::Execution {
            source: RepositoryError::NotFound { entity, .. },
            ..
        }) => assert_eq!(entity, "enrollment"),
        other => panic!("expected execution failure, got {other:?}"),
    }
    let log = store.resolutions().expect("log");
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].outcome, ResolutionOutcome::Recorded);
    assert_eq!(log[1].outcome, ResolutionOutcome::ExecutionFailed);
    assert_eq!(log[1].compensates.as_deref(), Some(log[0].id.as_str()));
    assert!(log[1].notes.is_some());
}

#[test]
fn conflict_stays_open_when_its_fix_fails() {
    let store = store_with(vec![class("c1", "inst-1", 35, 30)]);
    let service = build_service(store.clone());

    let result = service.resolve_conflict(
        &capacity_conflict_id("c1"),
        request(ResolutionAction::CapacityIncrease {
            class_id: SectionId::new("c1-typo"),
            additional_seats: 10,
        }),
    );
    assert!(matches!(result, Err(ConflictError::Execution { .. })));

    let conflicts = service.detect_conflicts(&institution()).expect("rescan");
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].id, capacity_conflict_id("c1"));
    assert_eq!(conflicts[0].status, ConflictStatus::Open);
}

#[test]
fn failed_fix_does_not_undo_an_earlier_dismissal() {
    let store = store_with(vec![class("c1", "inst-1", 35, 30)]);
    let service = build_service(store.clone());
    let conflict = capacity_conflict_id("c1");

    service
        .resolve_conflict(&conflict, request(ResolutionAction::Dismiss))
        .expect("dismissed");
    let result = service.resolve_conflict(
        &conflict,
        request(ResolutionAction::CapacityIncrease {
            class_id: SectionId::new("missing"),
            additional_seats: 5,
        }),
    );
    assert!(result.is_err());

    let conflicts = service.detect_conflicts(&institution()).expect("rescan");
    assert_eq!(conflicts[0].status, ConflictStatus::Dismissed);
}

#[test]
fn unreadable_log_reports_conflicts_as_open() {
    let store = store_with(vec![class("c1", "inst-1", 35, 30)]);
    let service = ConflictService::new(
        store,
        std::sync::Arc::new(UnavailableLog),
        DetectionConfig::default(),
    );

    let conflicts = service
        .detect_conflicts(&institution())
        .expect("scan still succeeds");
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].status, ConflictStatus::Open);
}

#[test]
fn unwritable_log_fails_before_acting() {
    let store = store_with(vec![class("c1", "inst-1", 35, 30)]);
    let service = ConflictService::new(
        store.clone(),
        std::sync::Arc::new(UnavailableLog),
        DetectionConfig::default(),
    );

    let result = service.resolve_conflict(
        &capacity_conflict_id("c1"),
        request(ResolutionAction::CapacityIncrease {
            class_id: SectionId::new("c1"),
            additional_seats: 10,
        }),
    );

    assert!(matches!(
        result,
        Err(ConflictError::Repository(RepositoryError::Unavailable(_)))
    ));
    assert_eq!(
        store
            .section(&SectionId::new("c1"))
            .expect("lookup")
            .expect("section")
            .capacity,
        30
    );
}

#[test]
fn custom_detector_replaces_the_standard_rules() {
    let store = store_with(vec![class("c1", "inst-1", 35, 30)]);
    let service = ConflictService::with_detector(
        store.clone(),
        store,
        ConflictDetector::empty().with_rule(BrokenRule),
        DetectionConfig::default(),
    );

    assert!(service
        .detect_conflicts(&institution())
        .expect("scan runs")
        .is_empty());
}

#[test]
fn increase_capacity_rejects_unknown_sections() {
    let store = store_with(vec![]);
    match store.increase_capacity(&SectionId::new("nope"), 3) {
        Err(RepositoryError::NotFound { entity, .. }) => assert_eq!(entity, "section"),
        other => panic!("expected not found, got {other:?}"),
    }
}
