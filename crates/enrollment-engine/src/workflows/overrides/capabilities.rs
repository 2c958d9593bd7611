use crate::workflows::enrollment::InstitutionId;

use super::domain::{OverrideCapability, OverrideType, Role};

/// `(can_request, can_approve)` for a role and override type.
fn permissions(role: Role, override_type: OverrideType) -> (bool, bool) {
    use OverrideType::*;

    match role {
        Role::SuperAdmin | Role::InstitutionAdmin => (true, true),
        Role::Registrar => (
            true,
            matches!(override_type, DeadlineOverride | EnrollmentOverride),
        ),
        Role::DepartmentHead => (
            true,
            matches!(override_type, CapacityOverride | PrerequisiteOverride),
        ),
        Role::Instructor => (
            matches!(override_type, CapacityOverride | PrerequisiteOverride),
            false,
        ),
        Role::Student => (false, false),
    }
}

/// One entry per override type. Admin requests are self-approving; every other role's
/// requests wait for someone else.
pub fn capabilities_for(role: Role, institution: &InstitutionId) -> Vec<OverrideCapability> {
    OverrideType::ALL
        .iter()
        .map(|&override_type| {
            let (can_request, can_approve) = permissions(role, override_type);
            OverrideCapability {
                institution_id: institution.clone(),
                override_type,
                can_request,
                can_approve,
                requires_approval: can_request
                    && !matches!(role, Role::SuperAdmin | Role::InstitutionAdmin),
            }
        })
        .collect()
}
