mod activity;
mod capacity;
mod pending;

pub use activity::SuspiciousActivityRule;
pub use capacity::CapacityRule;
pub use pending::{PolicyRule, PrerequisiteRule, ScheduleRule};

use chrono::{DateTime, Utc};

use crate::workflows::enrollment::{AuditTrail, InstitutionId, RepositoryError, SectionRepository};

use super::config::DetectionConfig;
use super::domain::EnrollmentConflict;

/// Inputs shared by every rule during one detection pass.
pub struct DetectionContext<'a> {
    pub institution_id: &'a InstitutionId,
    pub now: DateTime<Utc>,
    pub sections: &'a dyn SectionRepository,
    pub audit: &'a dyn AuditTrail,
    pub config: &'a DetectionConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("a {hours}-hour lookback window cannot be applied")]
    InvalidWindow { hours: i64 },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One independent detection pass.
pub trait ConflictRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(
        &self,
        context: &DetectionContext<'_>,
    ) -> Result<Vec<EnrollmentConflict>, RuleError>;
}
