use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::error::AppError;
use crate::workflows::enrollment::{
    AuditTrail, EnrollmentCommands, InstitutionId, SectionRepository,
};

use super::domain::{ConflictId, ConflictResolution, EnrollmentConflict, ResolutionRequest};
use super::repository::ResolutionLog;
use super::service::ConflictService;

/// Router exposing conflict scans and resolutions.
pub fn conflict_router<S, L>(service: Arc<ConflictService<S, L>>) -> Router
where
    S: SectionRepository + AuditTrail + EnrollmentCommands + 'static,
    L: ResolutionLog + 'static,
{
    Router::new()
        .route(
            "/api/v1/institutions/:institution_id/conflicts",
            get(detect_handler::<S, L>),
        )
        .route(
            "/api/v1/conflicts/:conflict_id/resolutions",
            post(resolve_handler::<S, L>),
        )
        .with_state(service)
}

pub(crate) async fn detect_handler<S, L>(
    State(service): State<Arc<ConflictService<S, L>>>,
    Path(institution_id): Path<String>,
) -> Result<Json<Vec<EnrollmentConflict>>, AppError>
where
    S: SectionRepository + AuditTrail + EnrollmentCommands + 'static,
    L: ResolutionLog + 'static,
{
    let conflicts = service.detect_conflicts(&InstitutionId(institution_id))?;
    Ok(Json(conflicts))
}

pub(crate) async fn resolve_handler<S, L>(
    State(service): State<Arc<ConflictService<S, L>>>,
    Path(conflict_id): Path<String>,
    Json(request): Json<ResolutionRequest>,
) -> Result<Json<ConflictResolution>, AppError>
where
    S: SectionRepository + AuditTrail + EnrollmentCommands + 'static,
    L: ResolutionLog + 'static,
{
    let resolution = service.resolve_conflict(&ConflictId(conflict_id), request)?;
    Ok(Json(resolution))
}
