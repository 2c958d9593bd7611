use crate::workflows::enrollment::RepositoryError;

use super::domain::{ConflictId, ConflictResolution};

/// Append-only log of conflict resolutions.
pub trait ResolutionLog: Send + Sync {
    fn append(&self, resolution: ConflictResolution) -> Result<(), RepositoryError>;
    /// Resolutions recorded for a conflict, oldest first.
    fn for_conflict(&self, id: &ConflictId) -> Result<Vec<ConflictResolution>, RepositoryError>;
}
