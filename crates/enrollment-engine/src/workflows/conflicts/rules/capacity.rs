use super::super::domain::{
    AffectedStudents, ConflictId, ConflictStatus, ConflictType, EnrollmentConflict, Severity,
};
use super::{ConflictRule, DetectionContext, RuleError};

/// Flags every section enrolled past its capacity.
pub struct CapacityRule;

impl ConflictRule for CapacityRule {
    fn name(&self) -> &'static str {
        "capacity"
    }

    fn evaluate(
        &self,
        context: &DetectionContext<'_>,
    ) -> Result<Vec<EnrollmentConflict>, RuleError> {
        let sections = context.sections.institution_sections(context.institution_id)?;

        Ok(sections
            .into_iter()
            .filter(|section| section.current_enrollment > section.capacity)
            .map(|section| {
                let overflow = section.current_enrollment - section.capacity;
                EnrollmentConflict {
                    id: ConflictId(format!("capacity-{}", section.id)),
                    conflict_type: ConflictType::CapacityExceeded,
                    severity: Severity::High,
                    description: format!(
                        "{} has {} students enrolled but capacity of {}",
                        section.name, section.current_enrollment, section.capacity
                    ),
                    affected_students: AffectedStudents::Count(overflow),
                    class_id: Some(section.id),
                    class_name: Some(section.name),
                    student_id: None,
                    student_name: None,
                    detected_at: context.now,
                    status: ConflictStatus::Open,
                }
            })
            .collect())
    }
}
