use crate::workflows::enrollment::{EnrollmentCommands, EnrollmentFlags, RepositoryError};

use super::domain::{EnrollmentOverride, OverrideType};

/// Flags the forced enrollment carries for each override type.
pub(crate) fn flags_for(override_type: OverrideType) -> EnrollmentFlags {
    match override_type {
        OverrideType::EnrollmentOverride => EnrollmentFlags::default(),
        OverrideType::PrerequisiteOverride => EnrollmentFlags {
            prerequisite_exempt: true,
            ..EnrollmentFlags::default()
        },
        OverrideType::CapacityOverride => EnrollmentFlags {
            beyond_capacity: true,
            ..EnrollmentFlags::default()
        },
        OverrideType::DeadlineOverride => EnrollmentFlags {
            deadline_waived: true,
            ..EnrollmentFlags::default()
        },
    }
}

/// Apply an approved override to the roster.
pub(crate) fn execute<C>(commands: &C, record: &EnrollmentOverride) -> Result<(), RepositoryError>
where
    C: EnrollmentCommands + ?Sized,
{
    commands.force_enroll(
        &record.student_id,
        &record.class_id,
        flags_for(record.override_type),
    )
}
