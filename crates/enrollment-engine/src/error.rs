use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::balancing::BalancingError;
use crate::workflows::conflicts::ConflictError;
use crate::workflows::enrollment::RepositoryError;
use crate::workflows::overrides::OverrideError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Repository(RepositoryError),
    Balancing(BalancingError),
    Conflict(ConflictError),
    Override(OverrideError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Repository(err) => write!(f, "store error: {}", err),
            AppError::Balancing(err) => write!(f, "balancing error: {}", err),
            AppError::Conflict(err) => write!(f, "conflict error: {}", err),
            AppError::Override(err) => write!(f, "override error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Repository(err) => Some(err),
            AppError::Balancing(err) => Some(err),
            AppError::Conflict(err) => Some(err),
            AppError::Override(err) => Some(err),
        }
    }
}

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound { .. } => StatusCode::NOT_FOUND,
        RepositoryError::Conflict | RepositoryError::Stale => StatusCode::CONFLICT,
        RepositoryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Balancing(BalancingError::EmptySelection)
            | AppError::Balancing(BalancingError::InvalidTarget(_))
            | AppError::Conflict(ConflictError::MissingResolver)
            | AppError::Override(OverrideError::MissingActor(_)) => StatusCode::BAD_REQUEST,
            AppError::Balancing(BalancingError::InvalidTransition { .. })
            | AppError::Override(OverrideError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            AppError::Repository(err)
            | AppError::Balancing(BalancingError::Repository(err))
            | AppError::Conflict(ConflictError::Repository(err))
            | AppError::Override(OverrideError::Repository(err)) => repository_status(err),
            AppError::Conflict(ConflictError::Execution { .. }) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Repository(value)
    }
}

impl From<BalancingError> for AppError {
    fn from(value: BalancingError) -> Self {
        Self::Balancing(value)
    }
}

impl From<ConflictError> for AppError {
    fn from(value: ConflictError) -> Self {
        Self::Conflict(value)
    }
}

impl From<OverrideError> for AppError {
    fn from(value: OverrideError) -> Self {
        Self::Override(value)
    }
}
