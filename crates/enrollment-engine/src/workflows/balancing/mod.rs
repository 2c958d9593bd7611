//! Section balancing: read current utilization, derive per-section targets, and propose
//! student transfers from over-target to under-target sections.

mod config;
pub mod distribution;
pub mod domain;
pub mod eligibility;
pub mod planner;
mod reader;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use config::BalancingConfig;
pub use distribution::optimal_distribution;
pub use domain::{
    balance_score, utilization_rate, BalancingHistoryEntry, BalancingOperation, BalancingPlan,
    ExpectedOutcome, OperationId, OperationStatus, OperationType, SectionBalance,
    IDEAL_UTILIZATION,
};
pub use eligibility::{CandidateSelector, TransferEligibilityFilter};
pub use planner::PlanGenerator;
pub use repository::BalancingOperationRepository;
pub use router::balancing_router;
pub use service::{BalancingError, BalancingService};
