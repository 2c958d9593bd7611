use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::workflows::enrollment::{
    AuditTrail, EnrollmentCommands, EnrollmentFlags, InstitutionId, RepositoryError,
    SectionRepository,
};

use super::config::DetectionConfig;
use super::detector::ConflictDetector;
use super::domain::{
    status_from_history, ConflictId, ConflictResolution, EnrollmentConflict, ResolutionAction,
    ResolutionOutcome, ResolutionRequest,
};
use super::repository::ResolutionLog;
use super::rules::DetectionContext;

/// Service composing the detector with the resolution log and enrollment commands.
pub struct ConflictService<S, L> {
    store: Arc<S>,
    resolutions: Arc<L>,
    detector: ConflictDetector,
    config: DetectionConfig,
}

impl<S, L> ConflictService<S, L>
where
    S: SectionRepository + AuditTrail + EnrollmentCommands + 'static,
    L: ResolutionLog + 'static,
{
    pub fn new(store: Arc<S>, resolutions: Arc<L>, config: DetectionConfig) -> Self {
        Self::with_detector(store, resolutions, ConflictDetector::standard(), config)
    }

    pub fn with_detector(
        store: Arc<S>,
        resolutions: Arc<L>,
        detector: ConflictDetector,
        config: DetectionConfig,
    ) -> Self {
        Self {
            store,
            resolutions,
            detector,
            config,
        }
    }

    /// Scan an institution. Conflicts with a recorded resolution carry its status.
    pub fn detect_conflicts(
        &self,
        institution: &InstitutionId,
    ) -> Result<Vec<EnrollmentConflict>, ConflictError> {
        let context = DetectionContext {
            institution_id: institution,
            now: Utc::now(),
            sections: self.store.as_ref(),
            audit: self.store.as_ref(),
            config: &self.config,
        };

        let mut conflicts = self.detector.detect(&context);
        for conflict in &mut conflicts {
            match self.resolutions.for_conflict(&conflict.id) {
                Ok(history) => {
                    if let Some(status) = status_from_history(&history) {
                        conflict.status = status;
                    }
                }
                Err(error) => {
                    warn!(conflict = %conflict.id, %error, "resolution lookup failed; reporting as open");
                }
            }
        }

        info!(%institution, conflicts = conflicts.len(), "conflict scan finished");
        Ok(conflicts)
    }

    /// Record a resolution, then carry out its action. When the action fails a compensating
    /// `execution_failed` entry is appended so the conflict keeps its previous status.
    pub fn resolve_conflict(
        &self,
        conflict_id: &ConflictId,
        request: ResolutionRequest,
    ) -> Result<ConflictResolution, ConflictError> {
        if request.resolved_by.trim().is_empty() {
            return Err(ConflictError::MissingResolver);
        }

        let resolution = ConflictResolution {
            id: Uuid::new_v4().to_string(),
            conflict_id: conflict_id.clone(),
            action: request.action,
            resolved_by: request.resolved_by,
            notes: request.notes,
            resolved_at: Utc::now(),
            outcome: ResolutionOutcome::Recorded,
            compensates: None,
        };
        self.resolutions.append(resolution.clone())?;

        if let Err(source) = self.dispatch(&resolution.action) {
            error!(
                conflict = %conflict_id,
                action = resolution.action.label(),
                error = %source,
                "resolution recorded but its action failed"
            );
            let failure = ConflictResolution {
                id: Uuid::new_v4().to_string(),
                notes: Some(source.to_string()),
                resolved_at: Utc::now(),
                outcome: ResolutionOutcome::ExecutionFailed,
                compensates: Some(resolution.id.clone()),
                ..resolution.clone()
            };
            if let Err(log_error) = self.resolutions.append(failure) {
                error!(
                    conflict = %conflict_id,
                    resolution = %resolution.id,
                    error = %log_error,
                    "could not record the failed action; the conflict may read as resolved"
                );
            }
            return Err(ConflictError::Execution {
                conflict_id: conflict_id.clone(),
                source,
            });
        }

        info!(conflict = %conflict_id, action = resolution.action.label(), "conflict resolved");
        Ok(resolution)
    }

    fn dispatch(&self, action: &ResolutionAction) -> Result<(), RepositoryError> {
        match action {
            ResolutionAction::CapacityIncrease {
                class_id,
                additional_seats,
            } => self.store.increase_capacity(class_id, *additional_seats),
            ResolutionAction::StudentTransfer {
                student_id,
                from_class_id,
                to_class_id,
            } => self.store.transfer(student_id, from_class_id, to_class_id),
            ResolutionAction::ManualOverride {
                student_id,
                class_id,
            } => self.store.force_enroll(
                student_id,
                class_id,
                EnrollmentFlags {
                    beyond_capacity: true,
                    ..EnrollmentFlags::default()
                },
            ),
            ResolutionAction::PolicyException {
                student_id,
                class_id,
                policy,
            } => self.store.grant_policy_exception(student_id, class_id, policy),
            ResolutionAction::Dismiss => Ok(()),
        }
    }
}

/// Error raised by the conflict service.
#[derive(Debug, thiserror::Error)]
pub enum ConflictError {
    #[error("a resolution must name who resolved it")]
    MissingResolver,
    #[error("resolution for {conflict_id} was recorded but could not be applied: {source}")]
    Execution {
        conflict_id: ConflictId,
        #[source]
        source: RepositoryError,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
