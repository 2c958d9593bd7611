use chrono::{DateTime, Utc};

use super::domain::{
    AuditEvent, DepartmentId, EnrollmentFlags, EnrollmentRecord, InstitutionId,
    ScheduledEnrollment, Section, SectionId, StudentId,
};

/// Read access to sections and their rosters.
pub trait SectionRepository: Send + Sync {
    /// Sections matching `ids`; unknown ids are skipped rather than reported.
    fn sections(&self, ids: &[SectionId]) -> Result<Vec<Section>, RepositoryError>;
    fn section(&self, id: &SectionId) -> Result<Option<Section>, RepositoryError>;
    fn institution_sections(
        &self,
        institution: &InstitutionId,
    ) -> Result<Vec<Section>, RepositoryError>;
    fn department_sections(
        &self,
        department: &DepartmentId,
    ) -> Result<Vec<Section>, RepositoryError>;
    /// Enrolled students of a section, most recently enrolled first.
    fn recent_enrollments(
        &self,
        section: &SectionId,
        limit: usize,
    ) -> Result<Vec<EnrollmentRecord>, RepositoryError>;
    /// Every section the student is currently enrolled in.
    fn active_schedules(
        &self,
        student: &StudentId,
    ) -> Result<Vec<ScheduledEnrollment>, RepositoryError>;
}

/// Source of enrollment audit events.
pub trait AuditTrail: Send + Sync {
    fn events_since(
        &self,
        institution: &InstitutionId,
        since: DateTime<Utc>,
    ) -> Result<Vec<AuditEvent>, RepositoryError>;
}

/// Side-effecting enrollment mutations triggered by balancing, resolutions, and overrides.
pub trait EnrollmentCommands: Send + Sync {
    fn transfer(
        &self,
        student: &StudentId,
        from: &SectionId,
        to: &SectionId,
    ) -> Result<(), RepositoryError>;
    /// Enroll regardless of capacity or rule checks. An existing enrollment keeps its
    /// record and gains the given flags.
    fn force_enroll(
        &self,
        student: &StudentId,
        section: &SectionId,
        flags: EnrollmentFlags,
    ) -> Result<(), RepositoryError>;
    fn increase_capacity(&self, section: &SectionId, additional: u32)
        -> Result<(), RepositoryError>;
    fn grant_policy_exception(
        &self,
        student: &StudentId,
        section: &SectionId,
        policy: &str,
    ) -> Result<(), RepositoryError>;
}

/// Failure talking to the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    /// A conditional write found the record in a different state than expected.
    #[error("record changed since it was read")]
    Stale,
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
