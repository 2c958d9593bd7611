use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::workflows::enrollment::{EnrollmentCommands, InstitutionId};

use super::domain::{
    EnrollmentOverride, OverrideCapability, OverrideId, OverrideRequest, Role,
};
use super::repository::OverrideRepository;
use super::service::OverrideService;

#[derive(Debug, Serialize)]
pub struct RequestAccepted {
    pub override_id: OverrideId,
}

#[derive(Debug, Deserialize)]
pub struct ApprovalBody {
    pub approver: String,
    #[serde(default)]
    pub conditions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DenialBody {
    pub denier: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CapabilityQuery {
    pub role: Role,
    pub institution_id: String,
}

/// Router exposing the override request/approval workflow.
pub fn override_router<R, C>(service: Arc<OverrideService<R, C>>) -> Router
where
    R: OverrideRepository + 'static,
    C: EnrollmentCommands + 'static,
{
    Router::new()
        .route(
            "/api/v1/overrides",
            post(request_handler::<R, C>).get(pending_handler::<R, C>),
        )
        .route(
            "/api/v1/overrides/capabilities",
            get(capabilities_handler::<R, C>),
        )
        .route("/api/v1/overrides/:override_id", get(get_handler::<R, C>))
        .route(
            "/api/v1/overrides/:override_id/approve",
            post(approve_handler::<R, C>),
        )
        .route(
            "/api/v1/overrides/:override_id/deny",
            post(deny_handler::<R, C>),
        )
        .route(
            "/api/v1/overrides/:override_id/retry",
            post(retry_handler::<R, C>),
        )
        .with_state(service)
}

pub(crate) async fn request_handler<R, C>(
    State(service): State<Arc<OverrideService<R, C>>>,
    Json(request): Json<OverrideRequest>,
) -> Result<(StatusCode, Json<RequestAccepted>), AppError>
where
    R: OverrideRepository + 'static,
    C: EnrollmentCommands + 'static,
{
    let override_id = service.request(request)?;
    Ok((StatusCode::CREATED, Json(RequestAccepted { override_id })))
}

pub(crate) async fn pending_handler<R, C>(
    State(service): State<Arc<OverrideService<R, C>>>,
) -> Result<Json<Vec<EnrollmentOverride>>, AppError>
where
    R: OverrideRepository + 'static,
    C: EnrollmentCommands + 'static,
{
    Ok(Json(service.pending()?))
}

pub(crate) async fn get_handler<R, C>(
    State(service): State<Arc<OverrideService<R, C>>>,
    Path(override_id): Path<String>,
) -> Result<Json<EnrollmentOverride>, AppError>
where
    R: OverrideRepository + 'static,
    C: EnrollmentCommands + 'static,
{
    Ok(Json(service.get(&OverrideId(override_id))?))
}

pub(crate) async fn approve_handler<R, C>(
    State(service): State<Arc<OverrideService<R, C>>>,
    Path(override_id): Path<String>,
    Json(body): Json<ApprovalBody>,
) -> Result<Json<EnrollmentOverride>, AppError>
where
    R: OverrideRepository + 'static,
    C: EnrollmentCommands + 'static,
{
    let record = service.approve(&OverrideId(override_id), &body.approver, body.conditions)?;
    Ok(Json(record))
}

pub(crate) async fn deny_handler<R, C>(
    State(service): State<Arc<OverrideService<R, C>>>,
    Path(override_id): Path<String>,
    Json(body): Json<DenialBody>,
) -> Result<Json<EnrollmentOverride>, AppError>
where
    R: OverrideRepository + 'static,
    C: EnrollmentCommands + 'static,
{
    let record = service.deny(&OverrideId(override_id), &body.denier, body.reason)?;
    Ok(Json(record))
}

pub(crate) async fn retry_handler<R, C>(
    State(service): State<Arc<OverrideService<R, C>>>,
    Path(override_id): Path<String>,
) -> Result<Json<EnrollmentOverride>, AppError>
where
    R: OverrideRepository + 'static,
    C: EnrollmentCommands + 'static,
{
    Ok(Json(service.retry_execution(&OverrideId(override_id))?))
}

pub(crate) async fn capabilities_handler<R, C>(
    State(service): State<Arc<OverrideService<R, C>>>,
    Query(query): Query<CapabilityQuery>,
) -> Json<Vec<OverrideCapability>>
where
    R: OverrideRepository + 'static,
    C: EnrollmentCommands + 'static,
{
    Json(service.capabilities(query.role, &InstitutionId(query.institution_id)))
}
