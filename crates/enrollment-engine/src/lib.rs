//! Enrollment balancing, conflict detection, and administrator override workflows.
//!
//! Each workflow under [`workflows`] follows the same shape: serde domain types, storage
//! traits so the service can be exercised against any backend, a service facade, and a thin
//! axum router.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
