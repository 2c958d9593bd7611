//! Section, roster, and audit-log shapes shared by the balancing, conflict, and override
//! workflows, plus the storage seams they consume.

pub mod domain;
pub mod memory;
pub mod repository;
pub mod schedule;

pub use domain::{
    AuditAction, AuditEvent, DepartmentId, EnrollmentFlags, EnrollmentRecord, EnrollmentStatus,
    InstitutionId, ScheduledEnrollment, Section, SectionId, StudentId,
};
pub use memory::InMemoryEnrollmentStore;
pub use repository::{AuditTrail, EnrollmentCommands, RepositoryError, SectionRepository};
