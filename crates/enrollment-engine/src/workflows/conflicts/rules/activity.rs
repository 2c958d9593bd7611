use std::collections::BTreeMap;

use chrono::Duration;

use crate::workflows::enrollment::{AuditAction, StudentId};

use super::super::domain::{
    AffectedStudents, ConflictId, ConflictStatus, ConflictType, EnrollmentConflict, Severity,
};
use super::{ConflictRule, DetectionContext, RuleError};

/// Flags students with a burst of enrollments inside the trailing window.
pub struct SuspiciousActivityRule;

impl ConflictRule for SuspiciousActivityRule {
    fn name(&self) -> &'static str {
        "suspicious_activity"
    }

    fn evaluate(
        &self,
        context: &DetectionContext<'_>,
    ) -> Result<Vec<EnrollmentConflict>, RuleError> {
        let hours = context.config.suspicious_window_hours;
        let since = Duration::try_hours(hours)
            .filter(|window| *window > Duration::zero())
            .and_then(|window| context.now.checked_sub_signed(window))
            .ok_or(RuleError::InvalidWindow { hours })?;
        let events = context.audit.events_since(context.institution_id, since)?;

        let mut counts: BTreeMap<StudentId, usize> = BTreeMap::new();
        for event in events
            .iter()
            .filter(|event| event.action == AuditAction::Enrolled && event.timestamp >= since)
        {
            *counts.entry(event.student_id.clone()).or_default() += 1;
        }

        let day = context.now.format("%Y%m%d");
        Ok(counts
            .into_iter()
            .filter(|(_, count)| *count > context.config.suspicious_event_threshold)
            .map(|(student, count)| EnrollmentConflict {
                id: ConflictId(format!("suspicious-{student}-{day}")),
                conflict_type: ConflictType::SuspiciousActivity,
                severity: Severity::Medium,
                description: format!(
                    "Student {student} recorded {count} enrollments in the last {} hours",
                    context.config.suspicious_window_hours
                ),
                affected_students: AffectedStudents::Students(vec![student.clone()]),
                class_id: None,
                class_name: None,
                student_id: Some(student),
                student_name: None,
                detected_at: context.now,
                status: ConflictStatus::Open,
            })
            .collect())
    }
}
