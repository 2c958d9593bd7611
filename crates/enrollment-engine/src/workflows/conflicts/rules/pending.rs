//! Registered passes that do not detect anything yet.

use super::super::domain::EnrollmentConflict;
use super::{ConflictRule, DetectionContext, RuleError};

/// Needs class prerequisite rules and completed-course history, neither of which the
/// store exposes yet.
pub struct PrerequisiteRule;

impl ConflictRule for PrerequisiteRule {
    fn name(&self) -> &'static str {
        "prerequisite"
    }

    fn evaluate(
        &self,
        _context: &DetectionContext<'_>,
    ) -> Result<Vec<EnrollmentConflict>, RuleError> {
        Ok(Vec::new())
    }
}

/// Needs structured time slots; free-text schedule descriptors are too coarse.
pub struct ScheduleRule;

impl ConflictRule for ScheduleRule {
    fn name(&self) -> &'static str {
        "schedule"
    }

    fn evaluate(
        &self,
        _context: &DetectionContext<'_>,
    ) -> Result<Vec<EnrollmentConflict>, RuleError> {
        Ok(Vec::new())
    }
}

pub struct PolicyRule;

impl ConflictRule for PolicyRule {
    fn name(&self) -> &'static str {
        "policy"
    }

    fn evaluate(
        &self,
        _context: &DetectionContext<'_>,
    ) -> Result<Vec<EnrollmentConflict>, RuleError> {
        Ok(Vec::new())
    }
}
