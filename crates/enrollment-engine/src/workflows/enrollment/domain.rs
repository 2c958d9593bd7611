use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a schedulable class section.
    SectionId
);
string_id!(StudentId);
string_id!(
    /// Tenant boundary; every section belongs to exactly one institution.
    InstitutionId
);
string_id!(DepartmentId);

/// Read-only view of a class section as the store reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub institution_id: InstitutionId,
    pub department_id: DepartmentId,
    pub name: String,
    pub capacity: u32,
    pub current_enrollment: u32,
    /// Free-text meeting pattern such as `"Mon Wed 10:00-11:15"`.
    pub schedule: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Enrolled,
    Waitlisted,
    Dropped,
}

/// Exemptions attached to an enrollment that was forced through an override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentFlags {
    pub beyond_capacity: bool,
    pub prerequisite_exempt: bool,
    pub deadline_waived: bool,
}

impl EnrollmentFlags {
    pub fn merge(self, other: EnrollmentFlags) -> Self {
        Self {
            beyond_capacity: self.beyond_capacity || other.beyond_capacity,
            prerequisite_exempt: self.prerequisite_exempt || other.prerequisite_exempt,
            deadline_waived: self.deadline_waived || other.deadline_waived,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub student_id: StudentId,
    pub section_id: SectionId,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    #[serde(default)]
    pub flags: EnrollmentFlags,
}

/// A student's active enrollment paired with the section's meeting pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEnrollment {
    pub section_id: SectionId,
    pub schedule: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Enrolled,
    Dropped,
    Transferred,
    Waitlisted,
}

/// Entry from the enrollment audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub student_id: StudentId,
    pub section_id: SectionId,
    pub action: AuditAction,
    pub timestamp: DateTime<Utc>,
}
