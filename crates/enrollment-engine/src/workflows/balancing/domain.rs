use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::enrollment::{Section, SectionId, StudentId};

/// Utilization every section is scored against.
pub const IDEAL_UTILIZATION: f64 = 85.0;

/// Enrolled / capacity as a percentage; zero when capacity is unknown.
pub fn utilization_rate(enrolled: u32, capacity: u32) -> f64 {
    if capacity == 0 {
        return 0.0;
    }
    enrolled as f64 / capacity as f64 * 100.0
}

/// 100 minus twice the distance from `reference`, floored at zero.
pub fn balance_score(utilization: f64, reference: f64) -> f64 {
    (100.0 - 2.0 * (utilization - reference).abs()).max(0.0)
}

/// Derived per-section figures; recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionBalance {
    pub section_id: SectionId,
    pub section_name: String,
    pub current_enrollment: u32,
    pub capacity: u32,
    pub utilization_rate: f64,
    pub target_enrollment: u32,
    pub balance_score: f64,
}

impl SectionBalance {
    pub fn from_section(section: &Section) -> Self {
        Self::with_enrollment(
            section.id.clone(),
            section.name.clone(),
            section.current_enrollment,
            section.capacity,
        )
    }

    pub fn with_enrollment(
        section_id: SectionId,
        section_name: String,
        current_enrollment: u32,
        capacity: u32,
    ) -> Self {
        let utilization = utilization_rate(current_enrollment, capacity);
        Self {
            section_id,
            section_name,
            current_enrollment,
            capacity,
            utilization_rate: utilization,
            target_enrollment: current_enrollment,
            balance_score: balance_score(utilization, IDEAL_UTILIZATION),
        }
    }

    pub fn surplus(&self) -> u32 {
        self.current_enrollment.saturating_sub(self.target_enrollment)
    }

    pub fn headroom(&self) -> u32 {
        self.target_enrollment.saturating_sub(self.current_enrollment)
    }

    /// Same section with a different head count, keeping target and score reference.
    pub(crate) fn projected(&self, enrollment: u32, reference: f64) -> Self {
        let utilization = utilization_rate(enrollment, self.capacity);
        Self {
            current_enrollment: enrollment,
            utilization_rate: utilization,
            balance_score: balance_score(utilization, reference),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperationId(pub String);

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Redistribute,
    Swap,
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Pending,
    Approved,
    Completed,
    Failed,
}

impl OperationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OperationStatus::Pending => "pending",
            OperationStatus::Approved => "approved",
            OperationStatus::Completed => "completed",
            OperationStatus::Failed => "failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, OperationStatus::Completed | OperationStatus::Failed)
    }
}

/// Proposed transfer of specific students from one section to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancingOperation {
    pub id: OperationId,
    pub operation_type: OperationType,
    pub from_section_id: SectionId,
    pub to_section_id: SectionId,
    pub student_ids: Vec<StudentId>,
    pub reason: String,
    pub estimated_impact: String,
    pub status: OperationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedOutcome {
    pub before: Vec<SectionBalance>,
    pub after: Vec<SectionBalance>,
    pub improvement_score: f64,
}

/// Snapshot returned to callers; re-request for fresh numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancingPlan {
    pub operations: Vec<BalancingOperation>,
    pub expected_outcome: ExpectedOutcome,
    pub feasibility_score: f64,
    pub estimated_minutes_to_complete: u32,
}

/// Persisted operation joined with its section names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancingHistoryEntry {
    #[serde(flatten)]
    pub operation: BalancingOperation,
    pub from_section_name: Option<String>,
    pub to_section_name: Option<String>,
}
