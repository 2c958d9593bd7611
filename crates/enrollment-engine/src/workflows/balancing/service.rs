use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use crate::workflows::enrollment::{
    DepartmentId, EnrollmentCommands, RepositoryError, SectionId, SectionRepository,
};

use super::config::BalancingConfig;
use super::distribution::optimal_distribution;
use super::domain::{
    BalancingHistoryEntry, BalancingOperation, BalancingPlan, OperationId, OperationStatus,
};
use super::eligibility::TransferEligibilityFilter;
use super::planner::PlanGenerator;
use super::reader::read_balances;
use super::repository::BalancingOperationRepository;

/// Facade over plan generation, operation approval/execution, and history.
pub struct BalancingService<S, O> {
    sections: Arc<S>,
    operations: Arc<O>,
    eligibility: TransferEligibilityFilter<S>,
    config: BalancingConfig,
}

impl<S, O> BalancingService<S, O>
where
    S: SectionRepository + EnrollmentCommands + 'static,
    O: BalancingOperationRepository + 'static,
{
    pub fn new(sections: Arc<S>, operations: Arc<O>, config: BalancingConfig) -> Self {
        let eligibility =
            TransferEligibilityFilter::new(sections.clone(), config.candidate_multiplier);
        Self {
            sections,
            operations,
            eligibility,
            config,
        }
    }

    pub fn config(&self) -> &BalancingConfig {
        &self.config
    }

    /// Build a plan for `section_ids` and persist its operations as pending.
    pub fn generate_plan(
        &self,
        section_ids: &[SectionId],
        target_utilization: Option<f64>,
    ) -> Result<BalancingPlan, BalancingError> {
        if section_ids.is_empty() {
            return Err(BalancingError::EmptySelection);
        }
        let target = target_utilization.unwrap_or(self.config.target_utilization);
        if !(target > 0.0 && target <= 100.0) {
            return Err(BalancingError::InvalidTarget(target));
        }

        let balances = read_balances(self.sections.as_ref(), section_ids)?;
        let targeted = optimal_distribution(&balances, target);
        let plan = PlanGenerator::new(&self.eligibility, &self.config).generate(
            &targeted,
            target,
            Utc::now(),
        );

        self.operations.insert_all(&plan.operations)?;

        info!(
            sections = targeted.len(),
            operations = plan.operations.len(),
            feasibility = plan.feasibility_score,
            improvement = plan.expected_outcome.improvement_score,
            "generated balancing plan"
        );
        Ok(plan)
    }

    /// Mark a pending operation as approved for execution.
    pub fn approve_operation(
        &self,
        id: &OperationId,
    ) -> Result<BalancingOperation, BalancingError> {
        let mut operation = self.load(id)?;
        if operation.status != OperationStatus::Pending {
            return Err(BalancingError::InvalidTransition {
                id: id.clone(),
                status: operation.status,
            });
        }
        operation.status = OperationStatus::Approved;
        self.operations.update(operation.clone())?;
        info!(operation = %id, "balancing operation approved");
        Ok(operation)
    }

    /// Move every student of the operation. Returns `false` and marks the operation failed
    /// when any transfer is rejected by the store.
    pub fn execute_operation(&self, id: &OperationId) -> Result<bool, BalancingError> {
        let mut operation = self.load(id)?;
        if operation.status.is_terminal() {
            return Err(BalancingError::InvalidTransition {
                id: id.clone(),
                status: operation.status,
            });
        }

        let outcome = operation.student_ids.iter().try_for_each(|student| {
            self.sections
                .transfer(student, &operation.from_section_id, &operation.to_section_id)
        });

        let succeeded = match outcome {
            Ok(()) => {
                operation.status = OperationStatus::Completed;
                operation.completed_at = Some(Utc::now());
                info!(
                    operation = %id,
                    students = operation.student_ids.len(),
                    "balancing operation completed"
                );
                true
            }
            Err(cause) => {
                operation.status = OperationStatus::Failed;
                error!(operation = %id, error = %cause, "balancing operation failed");
                false
            }
        };

        self.operations.update(operation)?;
        Ok(succeeded)
    }

    /// Operations touching any section of the department, newest first.
    pub fn history(
        &self,
        department: &DepartmentId,
    ) -> Result<Vec<BalancingHistoryEntry>, BalancingError> {
        let sections = self.sections.department_sections(department)?;
        let ids: Vec<SectionId> = sections.iter().map(|s| s.id.clone()).collect();
        let mut names: HashMap<SectionId, String> = sections
            .into_iter()
            .map(|section| (section.id, section.name))
            .collect();

        let operations = self.operations.for_sections(&ids)?;
        let mut entries = Vec::with_capacity(operations.len());
        for operation in operations {
            let from_section_name = self.section_name(&mut names, &operation.from_section_id)?;
            let to_section_name = self.section_name(&mut names, &operation.to_section_id)?;
            entries.push(BalancingHistoryEntry {
                operation,
                from_section_name,
                to_section_name,
            });
        }
        Ok(entries)
    }

    fn section_name(
        &self,
        cache: &mut HashMap<SectionId, String>,
        id: &SectionId,
    ) -> Result<Option<String>, RepositoryError> {
        if let Some(name) = cache.get(id) {
            return Ok(Some(name.clone()));
        }
        let name = self.sections.section(id)?.map(|section| section.name);
        if let Some(name) = &name {
            cache.insert(id.clone(), name.clone());
        }
        Ok(name)
    }

    fn load(&self, id: &OperationId) -> Result<BalancingOperation, BalancingError> {
        self.operations
            .fetch(id)?
            .ok_or_else(|| RepositoryError::not_found("balancing operation", id).into())
    }
}

/// Error raised by the balancing service.
#[derive(Debug, thiserror::Error)]
pub enum BalancingError {
    #[error("at least one section id is required")]
    EmptySelection,
    #[error("target utilization must be within (0, 100], got {0}")]
    InvalidTarget(f64),
    #[error("operation {id} is {} and cannot transition", .status.label())]
    InvalidTransition {
        id: OperationId,
        status: OperationStatus,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
