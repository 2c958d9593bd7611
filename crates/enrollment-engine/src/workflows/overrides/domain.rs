use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::enrollment::{InstitutionId, SectionId, StudentId};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OverrideId(pub String);

impl fmt::Display for OverrideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which enrollment rule the override bypasses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideType {
    EnrollmentOverride,
    PrerequisiteOverride,
    CapacityOverride,
    DeadlineOverride,
}

impl OverrideType {
    pub const ALL: [OverrideType; 4] = [
        OverrideType::EnrollmentOverride,
        OverrideType::PrerequisiteOverride,
        OverrideType::CapacityOverride,
        OverrideType::DeadlineOverride,
    ];
}

/// Lifecycle of an override.
///
/// `Approved` means the decision is recorded and execution has not yet succeeded; it moves
/// on to `Executed` or `ExecutionFailed`, and a failed execution may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideStatus {
    Pending,
    Approved,
    Executed,
    ExecutionFailed,
    Denied,
    Expired,
}

impl OverrideStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OverrideStatus::Pending => "pending",
            OverrideStatus::Approved => "approved",
            OverrideStatus::Executed => "executed",
            OverrideStatus::ExecutionFailed => "execution_failed",
            OverrideStatus::Denied => "denied",
            OverrideStatus::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRequest {
    pub student_id: StudentId,
    pub class_id: SectionId,
    pub override_type: OverrideType,
    pub reason: String,
    pub requested_by: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Administrator-issued exception to a normal enrollment rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentOverride {
    pub id: OverrideId,
    pub student_id: StudentId,
    pub class_id: SectionId,
    pub override_type: OverrideType,
    pub reason: String,
    pub requested_by: String,
    pub status: OverrideStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub denied_by: Option<String>,
    pub denied_at: Option<DateTime<Utc>>,
    pub denial_reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub conditions: Vec<String>,
    pub executed_at: Option<DateTime<Utc>>,
    pub execution_error: Option<String>,
}

impl EnrollmentOverride {
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        self.status == OverrideStatus::Pending
            && self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    InstitutionAdmin,
    Registrar,
    DepartmentHead,
    Instructor,
    Student,
}

/// What a role may do with one override type within an institution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideCapability {
    pub institution_id: InstitutionId,
    pub override_type: OverrideType,
    pub can_request: bool,
    pub can_approve: bool,
    pub requires_approval: bool,
}
