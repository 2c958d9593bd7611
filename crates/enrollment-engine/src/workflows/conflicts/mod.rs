//! Enrollment-integrity scanning and the conflict resolution log.

mod config;
pub mod detector;
pub mod domain;
pub mod repository;
pub mod router;
pub mod rules;
pub mod service;

#[cfg(test)]
mod tests;

pub use config::DetectionConfig;
pub use detector::ConflictDetector;
pub use domain::{
    status_from_history, AffectedStudents, ConflictId, ConflictResolution, ConflictStatus,
    ConflictType, EnrollmentConflict, ResolutionAction, ResolutionOutcome, ResolutionRequest,
    Severity,
};
pub use repository::ResolutionLog;
pub use router::conflict_router;
pub use rules::{ConflictRule, DetectionContext, RuleError};
pub use service::{ConflictError, ConflictService};
