use crate::workflows::enrollment::RepositoryError;

use super::domain::{EnrollmentOverride, OverrideId, OverrideStatus};

/// Storage abstraction for override requests.
pub trait OverrideRepository: Send + Sync {
    fn insert(&self, record: EnrollmentOverride) -> Result<(), RepositoryError>;
    /// Replace the stored record only while its status is still `expected`, failing with
    /// [`RepositoryError::Stale`] otherwise. The check and the write are one atomic step.
    fn transition(
        &self,
        expected: OverrideStatus,
        record: EnrollmentOverride,
    ) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &OverrideId) -> Result<Option<EnrollmentOverride>, RepositoryError>;
    fn with_status(
        &self,
        status: OverrideStatus,
    ) -> Result<Vec<EnrollmentOverride>, RepositoryError>;
}
