//! Administrator overrides: request, approve or deny, then force the enrollment through.

pub mod capabilities;
pub mod domain;
mod executor;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use capabilities::capabilities_for;
pub use domain::{
    EnrollmentOverride, OverrideCapability, OverrideId, OverrideRequest, OverrideStatus,
    OverrideType, Role,
};
pub use repository::OverrideRepository;
pub use router::override_router;
pub use service::{OverrideError, OverrideService};
