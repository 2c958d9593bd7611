use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info};
use uuid::Uuid;

use crate::workflows::enrollment::{EnrollmentCommands, InstitutionId, RepositoryError};

use super::capabilities::capabilities_for;
use super::domain::{
    EnrollmentOverride, OverrideCapability, OverrideId, OverrideRequest, OverrideStatus, Role,
};
use super::executor;
use super::repository::OverrideRepository;

/// Request/approve/deny/execute workflow for enrollment overrides.
///
/// Expiry is evaluated lazily: any read of a pending override whose `expires_at` has passed
/// persists it as expired first.
///
/// Every status change is a conditional write against the status that was read, so two
/// callers racing on the same override cannot both win. `approved` doubles as the claim on
/// execution: only the caller that moved the record there runs the side effect.
pub struct OverrideService<R, C> {
    repository: Arc<R>,
    commands: Arc<C>,
}

impl<R, C> OverrideService<R, C>
where
    R: OverrideRepository + 'static,
    C: EnrollmentCommands + 'static,
{
    pub fn new(repository: Arc<R>, commands: Arc<C>) -> Self {
        Self {
            repository,
            commands,
        }
    }

    pub fn request(&self, request: OverrideRequest) -> Result<OverrideId, OverrideError> {
        if request.requested_by.trim().is_empty() {
            return Err(OverrideError::MissingActor("requested_by"));
        }

        let id = OverrideId(format!("ovr-{}", Uuid::new_v4()));
        let record = EnrollmentOverride {
            id: id.clone(),
            student_id: request.student_id,
            class_id: request.class_id,
            override_type: request.override_type,
            reason: request.reason,
            requested_by: request.requested_by,
            status: OverrideStatus::Pending,
            requested_at: Utc::now(),
            approved_by: None,
            approved_at: None,
            denied_by: None,
            denied_at: None,
            denial_reason: None,
            expires_at: request.expires_at,
            conditions: Vec::new(),
            executed_at: None,
            execution_error: None,
        };

        self.repository.insert(record)?;
        info!(override_id = %id, "override requested");
        Ok(id)
    }

    pub fn get(&self, id: &OverrideId) -> Result<EnrollmentOverride, OverrideError> {
        self.load(id, Utc::now())
    }

    /// Pending overrides that have not expired.
    pub fn pending(&self) -> Result<Vec<EnrollmentOverride>, OverrideError> {
        let now = Utc::now();
        let mut live = Vec::new();
        for record in self.repository.with_status(OverrideStatus::Pending)? {
            let record = self.expire_if_due(record, now)?;
            if record.status == OverrideStatus::Pending {
                live.push(record);
            }
        }
        Ok(live)
    }

    /// Record the approval, then execute it. Execution failure is captured on the record
    /// as `execution_failed` rather than returned as an error.
    pub fn approve(
        &self,
        id: &OverrideId,
        approver: &str,
        conditions: Vec<String>,
    ) -> Result<EnrollmentOverride, OverrideError> {
        if approver.trim().is_empty() {
            return Err(OverrideError::MissingActor("approver"));
        }

        let now = Utc::now();
        let mut record = self.load(id, now)?;
        ensure_pending(&record, "approve")?;

        record.status = OverrideStatus::Approved;
        record.approved_by = Some(approver.to_string());
        record.approved_at = Some(now);
        record.conditions = conditions;
        self.commit(OverrideStatus::Pending, &record, "approve")?;
        info!(override_id = %id, approver, "override approved");

        self.run_execution(record)
    }

    pub fn deny(
        &self,
        id: &OverrideId,
        denier: &str,
        reason: Option<String>,
    ) -> Result<EnrollmentOverride, OverrideError> {
        if denier.trim().is_empty() {
            return Err(OverrideError::MissingActor("denier"));
        }

        let now = Utc::now();
        let mut record = self.load(id, now)?;
        ensure_pending(&record, "deny")?;

        record.status = OverrideStatus::Denied;
        record.denied_by = Some(denier.to_string());
        record.denied_at = Some(now);
        record.denial_reason = reason;
        self.commit(OverrideStatus::Pending, &record, "deny")?;
        info!(override_id = %id, denier, "override denied");
        Ok(record)
    }

    /// Re-run a failed execution without repeating the approval decision.
    pub fn retry_execution(&self, id: &OverrideId) -> Result<EnrollmentOverride, OverrideError> {
        let mut record = self.load(id, Utc::now())?;
        if record.status != OverrideStatus::ExecutionFailed {
            return Err(OverrideError::InvalidTransition {
                id: id.clone(),
                from: record.status,
                action: "retry",
            });
        }

        record.status = OverrideStatus::Approved;
        self.commit(OverrideStatus::ExecutionFailed, &record, "retry")?;
        self.run_execution(record)
    }

    pub fn capabilities(
        &self,
        role: Role,
        institution: &InstitutionId,
    ) -> Vec<OverrideCapability> {
        capabilities_for(role, institution)
    }

    fn run_execution(
        &self,
        mut record: EnrollmentOverride,
    ) -> Result<EnrollmentOverride, OverrideError> {
        match executor::execute(self.commands.as_ref(), &record) {
            Ok(()) => {
                record.status = OverrideStatus::Executed;
                record.executed_at = Some(Utc::now());
                record.execution_error = None;
                info!(override_id = %record.id, "override executed");
            }
            Err(cause) => {
                record.status = OverrideStatus::ExecutionFailed;
                record.execution_error = Some(cause.to_string());
                error!(override_id = %record.id, error = %cause, "override execution failed");
            }
        }
        self.commit(OverrideStatus::Approved, &record, "execute")?;
        Ok(record)
    }

    /// Persist `record` if the stored copy is still `expected`.
    fn commit(
        &self,
        expected: OverrideStatus,
        record: &EnrollmentOverride,
        action: &'static str,
    ) -> Result<(), OverrideError> {
        match self.repository.transition(expected, record.clone()) {
            Ok(()) => Ok(()),
            Err(RepositoryError::Stale) => {
                let from = self
                    .repository
                    .fetch(&record.id)?
                    .map(|current| current.status)
                    .unwrap_or(expected);
                Err(OverrideError::InvalidTransition {
                    id: record.id.clone(),
                    from,
                    action,
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    fn load(
        &self,
        id: &OverrideId,
        now: DateTime<Utc>,
    ) -> Result<EnrollmentOverride, OverrideError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or_else(|| RepositoryError::not_found("override", id))?;
        self.expire_if_due(record, now)
    }

    fn expire_if_due(
        &self,
        mut record: EnrollmentOverride,
        now: DateTime<Utc>,
    ) -> Result<EnrollmentOverride, OverrideError> {
        if record.is_past_expiry(now) {
            record.status = OverrideStatus::Expired;
            match self.repository.transition(OverrideStatus::Pending, record.clone()) {
                Ok(()) => info!(override_id = %record.id, "override expired"),
                Err(RepositoryError::Stale) => {
                    return self
                        .repository
                        .fetch(&record.id)?
                        .ok_or_else(|| RepositoryError::not_found("override", &record.id).into());
                }
                Err(other) => return Err(other.into()),
            }
        }
        Ok(record)
    }
}

fn ensure_pending(record: &EnrollmentOverride, action: &'static str) -> Result<(), OverrideError> {
    if record.status == OverrideStatus::Pending {
        Ok(())
    } else {
        Err(OverrideError::InvalidTransition {
            id: record.id.clone(),
            from: record.status,
            action,
        })
    }
}

/// Error raised by the override service.
#[derive(Debug, thiserror::Error)]
pub enum OverrideError {
    #[error("{0} must not be empty")]
    MissingActor(&'static str),
    #[error("cannot {action} override {id} while it is {}", .from.label())]
    InvalidTransition {
        id: OverrideId,
        from: OverrideStatus,
        action: &'static str,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
