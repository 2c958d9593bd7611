use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::workflows::conflicts::{
    ConflictId, ConflictResolution, ConflictRule, ConflictService, DetectionConfig,
    DetectionContext, EnrollmentConflict, ResolutionAction, ResolutionLog, ResolutionRequest,
    RuleError,
};
use crate::workflows::enrollment::{
    AuditAction, AuditEvent, DepartmentId, InMemoryEnrollmentStore, InstitutionId,
    RepositoryError, Section, SectionId, StudentId,
};

pub(super) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 18, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn institution() -> InstitutionId {
    InstitutionId::new("inst-1")
}

pub(super) fn class(id: &str, institution: &str, enrolled: u32, capacity: u32) -> Section {
    Section {
        id: SectionId::new(id),
        institution_id: InstitutionId::new(institution),
        department_id: DepartmentId::new("biology"),
        name: format!("Biology {}", id.to_uppercase()),
        capacity,
        current_enrollment: enrolled,
        schedule: None,
    }
}

/// `count` enrollment events for one student, one minute apart, ending just before `now`.
pub(super) fn enrollment_burst(
    store: &InMemoryEnrollmentStore,
    student: &str,
    section: &str,
    count: i64,
    now: DateTime<Utc>,
) {
    for minute in 1..=count {
        store
            .record_event(AuditEvent {
                student_id: StudentId::new(student),
                section_id: SectionId::new(section),
                action: AuditAction::Enrolled,
                timestamp: now - Duration::minutes(minute),
            })
            .expect("record event");
    }
}

pub(super) fn store_with(sections: Vec<Section>) -> Arc<InMemoryEnrollmentStore> {
    let store = Arc::new(InMemoryEnrollmentStore::new());
    for section in sections {
        store.add_section(section).expect("add section");
    }
    store
}

pub(super) fn context<'a>(
    store: &'a InMemoryEnrollmentStore,
    institution: &'a InstitutionId,
    config: &'a DetectionConfig,
    now: DateTime<Utc>,
) -> DetectionContext<'a> {
    DetectionContext {
        institution_id: institution,
        now,
        sections: store,
        audit: store,
        config,
    }
}

pub(super) fn build_service(
    store: Arc<InMemoryEnrollmentStore>,
) -> ConflictService<InMemoryEnrollmentStore, InMemoryEnrollmentStore> {
    ConflictService::new(store.clone(), store, DetectionConfig::default())
}

pub(super) fn request(action: ResolutionAction) -> ResolutionRequest {
    ResolutionRequest {
        action,
        resolved_by: "registrar@example.edu".to_string(),
        notes: Some("handled at the front desk".to_string()),
    }
}

pub(super) fn capacity_conflict_id(section: &str) -> ConflictId {
    ConflictId(format!("capacity-{section}"))
}

/// Rule whose store access always fails.
pub(super) struct BrokenRule;

impl ConflictRule for BrokenRule {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn evaluate(
        &self,
        _context: &DetectionContext<'_>,
    ) -> Result<Vec<EnrollmentConflict>, RuleError> {
        Err(RepositoryError::Unavailable("audit replica offline".to_string()).into())
    }
}

/// Resolution log that cannot be read or written.
pub(super) struct UnavailableLog;

impl ResolutionLog for UnavailableLog {
    fn append(&self, _resolution: ConflictResolution) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("log offline".to_string()))
    }

    fn for_conflict(&self, _id: &ConflictId) -> Result<Vec<ConflictResolution>, RepositoryError> {
        Err(RepositoryError::Unavailable("log offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
