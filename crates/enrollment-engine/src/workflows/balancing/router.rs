use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::workflows::enrollment::{DepartmentId, EnrollmentCommands, SectionId, SectionRepository};

use super::domain::{BalancingHistoryEntry, BalancingOperation, BalancingPlan, OperationId};
use super::repository::BalancingOperationRepository;
use super::service::BalancingService;

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub section_ids: Vec<SectionId>,
    #[serde(default)]
    pub target_utilization: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ExecutionResponse {
    pub operation_id: OperationId,
    pub executed: bool,
}

/// Router exposing plan generation, approval, execution, and history.
pub fn balancing_router<S, O>(service: Arc<BalancingService<S, O>>) -> Router
where
    S: SectionRepository + EnrollmentCommands + 'static,
    O: BalancingOperationRepository + 'static,
{
    Router::new()
        .route("/api/v1/balancing/plans", post(plan_handler::<S, O>))
        .route(
            "/api/v1/balancing/operations/:operation_id/approve",
            post(approve_handler::<S, O>),
        )
        .route(
            "/api/v1/balancing/operations/:operation_id/execute",
            post(execute_handler::<S, O>),
        )
        .route(
            "/api/v1/departments/:department_id/balancing/history",
            get(history_handler::<S, O>),
        )
        .with_state(service)
}

pub(crate) async fn plan_handler<S, O>(
    State(service): State<Arc<BalancingService<S, O>>>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<BalancingPlan>, AppError>
where
    S: SectionRepository + EnrollmentCommands + 'static,
    O: BalancingOperationRepository + 'static,
{
    let plan = service.generate_plan(&request.section_ids, request.target_utilization)?;
    Ok(Json(plan))
}

pub(crate) async fn approve_handler<S, O>(
    State(service): State<Arc<BalancingService<S, O>>>,
    Path(operation_id): Path<String>,
) -> Result<Json<BalancingOperation>, AppError>
where
    S: SectionRepository + EnrollmentCommands + 'static,
    O: BalancingOperationRepository + 'static,
{
    let operation = service.approve_operation(&OperationId(operation_id))?;
    Ok(Json(operation))
}

pub(crate) async fn execute_handler<S, O>(
    State(service): State<Arc<BalancingService<S, O>>>,
    Path(operation_id): Path<String>,
) -> Result<Json<ExecutionResponse>, AppError>
where
    S: SectionRepository + EnrollmentCommands + 'static,
    O: BalancingOperationRepository + 'static,
{
    let operation_id = OperationId(operation_id);
    let executed = service.execute_operation(&operation_id)?;
    Ok(Json(ExecutionResponse {
        operation_id,
        executed,
    }))
}

pub(crate) async fn history_handler<S, O>(
    State(service): State<Arc<BalancingService<S, O>>>,
    Path(department_id): Path<String>,
) -> Result<Json<Vec<BalancingHistoryEntry>>, AppError>
where
    S: SectionRepository + EnrollmentCommands + 'static,
    O: BalancingOperationRepository + 'static,
{
    let history = service.history(&DepartmentId(department_id))?;
    Ok(Json(history))
}
