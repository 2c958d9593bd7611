use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::enrollment::{SectionId, StudentId};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConflictId(pub String);

impl fmt::Display for ConflictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    CapacityExceeded,
    PrerequisiteViolation,
    ScheduleConflict,
    SuspiciousActivity,
    PolicyViolation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStatus {
    Open,
    Resolved,
    Dismissed,
}

/// Either a head count or the specific students involved, depending on the rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffectedStudents {
    Count(u32),
    Students(Vec<StudentId>),
}

impl AffectedStudents {
    pub fn len(&self) -> usize {
        match self {
            AffectedStudents::Count(count) => *count as usize,
            AffectedStudents::Students(students) => students.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An enrollment-integrity issue found by a detection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentConflict {
    pub id: ConflictId,
    pub conflict_type: ConflictType,
    pub severity: Severity,
    pub description: String,
    pub affected_students: AffectedStudents,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<SectionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<StudentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    pub detected_at: DateTime<Utc>,
    pub status: ConflictStatus,
}

/// What an administrator chose to do about a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ResolutionAction {
    CapacityIncrease {
        class_id: SectionId,
        additional_seats: u32,
    },
    StudentTransfer {
        student_id: StudentId,
        from_class_id: SectionId,
        to_class_id: SectionId,
    },
    ManualOverride {
        student_id: StudentId,
        class_id: SectionId,
    },
    PolicyException {
        student_id: StudentId,
        class_id: SectionId,
        policy: String,
    },
    Dismiss,
}

impl ResolutionAction {
    pub fn label(&self) -> &'static str {
        match self {
            ResolutionAction::CapacityIncrease { .. } => "capacity_increase",
            ResolutionAction::StudentTransfer { .. } => "student_transfer",
            ResolutionAction::ManualOverride { .. } => "manual_override",
            ResolutionAction::PolicyException { .. } => "policy_exception",
            ResolutionAction::Dismiss => "dismiss",
        }
    }

    /// Status a conflict takes once this action has been recorded against it.
    pub fn resulting_status(&self) -> ConflictStatus {
        match self {
            ResolutionAction::Dismiss => ConflictStatus::Dismissed,
            _ => ConflictStatus::Resolved,
        }
    }
}

/// Caller-supplied resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRequest {
    #[serde(flatten)]
    pub action: ResolutionAction,
    pub resolved_by: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Whether a log entry records a decision or reports that an earlier decision's action failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    #[default]
    Recorded,
    ExecutionFailed,
}

/// Append-only audit record of a resolution.
///
/// A failed action is never erased: a second `execution_failed` entry names the original
/// through `compensates`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictResolution {
    pub id: String,
    pub conflict_id: ConflictId,
    #[serde(flatten)]
    pub action: ResolutionAction,
    pub resolved_by: String,
    pub notes: Option<String>,
    pub resolved_at: DateTime<Utc>,
    #[serde(default)]
    pub outcome: ResolutionOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compensates: Option<String>,
}

/// Status carried by the most recent resolution whose action was not reported as failed.
/// `history` is oldest first; `None` means the conflict is still open.
pub fn status_from_history(history: &[ConflictResolution]) -> Option<ConflictStatus> {
    let failed: HashSet<&str> = history
        .iter()
        .filter_map(|entry| entry.compensates.as_deref())
        .collect();
    history
        .iter()
        .rev()
        .find(|entry| {
            entry.outcome == ResolutionOutcome::Recorded && !failed.contains(entry.id.as_str())
        })
        .map(|entry| entry.action.resulting_status())
}
