use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::workflows::balancing::{BalancingOperation, BalancingOperationRepository, OperationId};
use crate::workflows::conflicts::{ConflictId, ConflictResolution, ResolutionLog};
use crate::workflows::overrides::{
    EnrollmentOverride, OverrideId, OverrideRepository, OverrideStatus,
};

use super::domain::{
    AuditAction, AuditEvent, DepartmentId, EnrollmentFlags, EnrollmentRecord, EnrollmentStatus,
    InstitutionId, ScheduledEnrollment, Section, SectionId, StudentId,
};
use super::repository::{AuditTrail, EnrollmentCommands, RepositoryError, SectionRepository};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyException {
    pub student_id: StudentId,
    pub section_id: SectionId,
    pub policy: String,
}

#[derive(Default)]
struct StoreState {
    sections: BTreeMap<SectionId, Section>,
    enrollments: Vec<EnrollmentRecord>,
    audit: Vec<AuditEvent>,
    operations: BTreeMap<OperationId, BalancingOperation>,
    overrides: BTreeMap<OverrideId, EnrollmentOverride>,
    resolutions: Vec<ConflictResolution>,
    exceptions: Vec<PolicyException>,
}

impl StoreState {
    fn section_mut(&mut self, id: &SectionId) -> Result<&mut Section, RepositoryError> {
        self.sections
            .get_mut(id)
            .ok_or_else(|| RepositoryError::not_found("section", id))
    }

    fn active_index(&self, student: &StudentId, section: &SectionId) -> Option<usize> {
        self.enrollments.iter().position(|record| {
            record.status == EnrollmentStatus::Enrolled
                && &record.student_id == student
                && &record.section_id == section
        })
    }

    fn institution_of(&self, section: &SectionId) -> Option<&InstitutionId> {
        self.sections.get(section).map(|s| &s.institution_id)
    }
}

/// Process-local store backing every repository trait. Cloning is not supported; share it
/// behind an `Arc`.
#[derive(Default)]
pub struct InMemoryEnrollmentStore {
    state: Mutex<StoreState>,
}

impl InMemoryEnrollmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    /// Insert or replace a section. `current_enrollment` is taken as given; later
    /// [`enroll`](Self::enroll) calls increment it.
    pub fn add_section(&self, section: Section) -> Result<(), RepositoryError> {
        self.lock()?.sections.insert(section.id.clone(), section);
        Ok(())
    }

    /// Seed an enrollment and its audit event.
    pub fn enroll(
        &self,
        student: &StudentId,
        section: &SectionId,
        enrolled_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state.section_mut(section)?.current_enrollment += 1;
        state.enrollments.push(EnrollmentRecord {
            student_id: student.clone(),
            section_id: section.clone(),
            status: EnrollmentStatus::Enrolled,
            enrolled_at,
            flags: EnrollmentFlags::default(),
        });
        state.audit.push(AuditEvent {
            student_id: student.clone(),
            section_id: section.clone(),
            action: AuditAction::Enrolled,
            timestamp: enrolled_at,
        });
        Ok(())
    }

    pub fn record_event(&self, event: AuditEvent) -> Result<(), RepositoryError> {
        self.lock()?.audit.push(event);
        Ok(())
    }

    pub fn enrollment(
        &self,
        student: &StudentId,
        section: &SectionId,
    ) -> Result<Option<EnrollmentRecord>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .active_index(student, section)
            .map(|index| state.enrollments[index].clone()))
    }

    pub fn policy_exceptions(&self) -> Result<Vec<PolicyException>, RepositoryError> {
        Ok(self.lock()?.exceptions.clone())
    }

    pub fn resolutions(&self) -> Result<Vec<ConflictResolution>, RepositoryError> {
        Ok(self.lock()?.resolutions.clone())
    }
}

impl SectionRepository for InMemoryEnrollmentStore {
    fn sections(&self, ids: &[SectionId]) -> Result<Vec<Section>, RepositoryError> {
        let state = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.sections.get(id).cloned())
            .collect())
    }

    fn section(&self, id: &SectionId) -> Result<Option<Section>, RepositoryError> {
        Ok(self.lock()?.sections.get(id).cloned())
    }

    fn institution_sections(
        &self,
        institution: &InstitutionId,
    ) -> Result<Vec<Section>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .sections
            .values()
            .filter(|section| &section.institution_id == institution)
            .cloned()
            .collect())
    }

    fn department_sections(
        &self,
        department: &DepartmentId,
    ) -> Result<Vec<Section>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .sections
            .values()
            .filter(|section| &section.department_id == department)
            .cloned()
            .collect())
    }

    fn recent_enrollments(
        &self,
        section: &SectionId,
        limit: usize,
    ) -> Result<Vec<EnrollmentRecord>, RepositoryError> {
        let state = self.lock()?;
        let mut records: Vec<EnrollmentRecord> = state
            .enrollments
            .iter()
            .filter(|record| {
                record.status == EnrollmentStatus::Enrolled && &record.section_id == section
            })
            .cloned()
            .collect();
        records.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));
        records.truncate(limit);
        Ok(records)
    }

    fn active_schedules(
        &self,
        student: &StudentId,
    ) -> Result<Vec<ScheduledEnrollment>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .enrollments
            .iter()
            .filter(|record| {
                record.status == EnrollmentStatus::Enrolled && &record.student_id == student
            })
            .map(|record| ScheduledEnrollment {
                section_id: record.section_id.clone(),
                schedule: state
                    .sections
                    .get(&record.section_id)
                    .and_then(|section| section.schedule.clone()),
            })
            .collect())
    }
}

impl AuditTrail for InMemoryEnrollmentStore {
    fn events_since(
        &self,
        institution: &InstitutionId,
        since: DateTime<Utc>,
    ) -> Result<Vec<AuditEvent>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .audit
            .iter()
            .filter(|event| {
                event.timestamp >= since
                    && state.institution_of(&event.section_id) == Some(institution)
            })
            .cloned()
            .collect())
    }
}

impl EnrollmentCommands for InMemoryEnrollmentStore {
    fn transfer(
        &self,
        student: &StudentId,
        from: &SectionId,
        to: &SectionId,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if !state.sections.contains_key(to) {
            return Err(RepositoryError::not_found("section", to));
        }
        let index = state
            .active_index(student, from)
            .ok_or_else(|| RepositoryError::not_found("enrollment", format!("{student}@{from}")))?;
        if state.active_index(student, to).is_some() {
            return Err(RepositoryError::Conflict);
        }

        let now = Utc::now();
        let record = &mut state.enrollments[index];
        record.section_id = to.clone();
        record.enrolled_at = now;

        let source = state.section_mut(from)?;
        source.current_enrollment = source.current_enrollment.saturating_sub(1);
        state.section_mut(to)?.current_enrollment += 1;
        state.audit.push(AuditEvent {
            student_id: student.clone(),
            section_id: to.clone(),
            action: AuditAction::Transferred,
            timestamp: now,
        });
        Ok(())
    }

    fn force_enroll(
        &self,
        student: &StudentId,
        section: &SectionId,
        flags: EnrollmentFlags,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state.section_mut(section)?;

        if let Some(index) = state.active_index(student, section) {
            let record = &mut state.enrollments[index];
            record.flags = record.flags.merge(flags);
            return Ok(());
        }

        let now = Utc::now();
        state.section_mut(section)?.current_enrollment += 1;
        state.enrollments.push(EnrollmentRecord {
            student_id: student.clone(),
            section_id: section.clone(),
            status: EnrollmentStatus::Enrolled,
            enrolled_at: now,
            flags,
        });
        state.audit.push(AuditEvent {
            student_id: student.clone(),
            section_id: section.clone(),
            action: AuditAction::Enrolled,
            timestamp: now,
        });
        Ok(())
    }

    fn increase_capacity(
        &self,
        section: &SectionId,
        additional: u32,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let section = state.section_mut(section)?;
        section.capacity = section.capacity.saturating_add(additional);
        Ok(())
    }

    fn grant_policy_exception(
        &self,
        student: &StudentId,
        section: &SectionId,
        policy: &str,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state.section_mut(section)?;
        state.exceptions.push(PolicyException {
            student_id: student.clone(),
            section_id: section.clone(),
            policy: policy.to_string(),
        });
        Ok(())
    }
}

impl BalancingOperationRepository for InMemoryEnrollmentStore {
    fn insert_all(&self, operations: &[BalancingOperation]) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let mut incoming = BTreeSet::new();
        for operation in operations {
            if state.operations.contains_key(&operation.id) || !incoming.insert(&operation.id) {
                return Err(RepositoryError::Conflict);
            }
        }
        for operation in operations {
            state.operations.insert(operation.id.clone(), operation.clone());
        }
        Ok(())
    }

    fn update(&self, operation: BalancingOperation) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        match state.operations.get_mut(&operation.id) {
            Some(existing) => {
                *existing = operation;
                Ok(())
            }
            None => Err(RepositoryError::not_found("balancing operation", &operation.id)),
        }
    }

    fn fetch(&self, id: &OperationId) -> Result<Option<BalancingOperation>, RepositoryError> {
        Ok(self.lock()?.operations.get(id).cloned())
    }

    fn for_sections(
        &self,
        sections: &[SectionId],
    ) -> Result<Vec<BalancingOperation>, RepositoryError> {
        let state = self.lock()?;
        let mut operations: Vec<BalancingOperation> = state
            .operations
            .values()
            .filter(|operation| {
                sections.contains(&operation.from_section_id)
                    || sections.contains(&operation.to_section_id)
            })
            .cloned()
            .collect();
        operations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(operations)
    }
}

impl ResolutionLog for InMemoryEnrollmentStore {
    fn append(&self, resolution: ConflictResolution) -> Result<(), RepositoryError> {
        self.lock()?.resolutions.push(resolution);
        Ok(())
    }

    fn for_conflict(&self, id: &ConflictId) -> Result<Vec<ConflictResolution>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .resolutions
            .iter()
            .filter(|resolution| &resolution.conflict_id == id)
            .cloned()
            .collect())
    }
}

impl OverrideRepository for InMemoryEnrollmentStore {
    fn insert(&self, record: EnrollmentOverride) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if state.overrides.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        state.overrides.insert(record.id.clone(), record);
        Ok(())
    }

    fn transition(
        &self,
        expected: OverrideStatus,
        record: EnrollmentOverride,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        match state.overrides.get_mut(&record.id) {
            Some(existing) if existing.status == expected => {
                *existing = record;
                Ok(())
            }
            Some(_) => Err(RepositoryError::Stale),
            None => Err(RepositoryError::not_found("override", &record.id)),
        }
    }

    fn fetch(&self, id: &OverrideId) -> Result<Option<EnrollmentOverride>, RepositoryError> {
        Ok(self.lock()?.overrides.get(id).cloned())
    }

    fn with_status(
        &self,
        status: OverrideStatus,
    ) -> Result<Vec<EnrollmentOverride>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .overrides
            .values()
            .filter(|record| record.status == status)
            .cloned()
            .collect())
    }
}
