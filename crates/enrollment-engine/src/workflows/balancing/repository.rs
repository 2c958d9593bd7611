use crate::workflows::enrollment::{RepositoryError, SectionId};

use super::domain::{BalancingOperation, OperationId};

/// Storage for generated operations so they can be approved, executed, and audited.
pub trait BalancingOperationRepository: Send + Sync {
    /// Store every operation or none of them.
    fn insert_all(&self, operations: &[BalancingOperation]) -> Result<(), RepositoryError>;
    fn update(&self, operation: BalancingOperation) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &OperationId) -> Result<Option<BalancingOperation>, RepositoryError>;
    /// Operations touching any of `sections` as source or destination, newest first.
    fn for_sections(
        &self,
        sections: &[SectionId],
    ) -> Result<Vec<BalancingOperation>, RepositoryError>;
}
