use tracing::debug;

use crate::workflows::enrollment::{RepositoryError, SectionId, SectionRepository};

use super::domain::SectionBalance;

/// Load current balances for `ids`. Unknown sections are dropped; callers reconcile counts.
pub(crate) fn read_balances<S>(
    sections: &S,
    ids: &[SectionId],
) -> Result<Vec<SectionBalance>, RepositoryError>
where
    S: SectionRepository + ?Sized,
{
    let found = sections.sections(ids)?;
    if found.len() != ids.len() {
        debug!(
            requested = ids.len(),
            found = found.len(),
            "some sections were not found"
        );
    }

    Ok(found.iter().map(SectionBalance::from_section).collect())
}
