use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::workflows::enrollment::schedule::shares_meeting_day;
use crate::workflows::enrollment::{SectionRepository, StudentId};

use super::domain::SectionBalance;

/// Picks which students of `from` may move to `to`.
pub trait CandidateSelector {
    /// Up to `count` students in preference order. `claimed` students already belong to
    /// another operation of the same plan and must not be returned.
    fn select(
        &self,
        from: &SectionBalance,
        to: &SectionBalance,
        count: usize,
        claimed: &HashSet<StudentId>,
    ) -> Vec<StudentId>;
}

/// Store-backed selector preferring the most recently enrolled students and rejecting
/// anyone whose other enrollments meet on a day the destination meets.
///
/// Lookup failures never fail the plan: a failed roster fetch yields nobody, and a failed
/// schedule lookup counts as a conflict.
pub struct TransferEligibilityFilter<S> {
    sections: Arc<S>,
    candidate_multiplier: usize,
}

impl<S> TransferEligibilityFilter<S>
where
    S: SectionRepository,
{
    pub fn new(sections: Arc<S>, candidate_multiplier: usize) -> Self {
        Self {
            sections,
            candidate_multiplier: candidate_multiplier.max(1),
        }
    }

    fn has_conflict(
        &self,
        student: &StudentId,
        from: &SectionBalance,
        to: &SectionBalance,
        destination_schedule: Option<&str>,
    ) -> bool {
        let enrollments = match self.sections.active_schedules(student) {
            Ok(enrollments) => enrollments,
            Err(error) => {
                warn!(%student, %error, "schedule lookup failed; assuming conflict");
                return true;
            }
        };

        enrollments.iter().any(|enrollment| {
            if enrollment.section_id == to.section_id {
                return true;
            }
            if enrollment.section_id == from.section_id {
                return false;
            }
            match (destination_schedule, enrollment.schedule.as_deref()) {
                (Some(destination), Some(existing)) => shares_meeting_day(destination, existing),
                _ => false,
            }
        })
    }
}

impl<S> CandidateSelector for TransferEligibilityFilter<S>
where
    S: SectionRepository,
{
    fn select(
        &self,
        from: &SectionBalance,
        to: &SectionBalance,
        count: usize,
        claimed: &HashSet<StudentId>,
    ) -> Vec<StudentId> {
        if count == 0 {
            return Vec::new();
        }

        let limit = count * self.candidate_multiplier + claimed.len();
        let candidates = match self.sections.recent_enrollments(&from.section_id, limit) {
            Ok(candidates) => candidates,
            Err(error) => {
                warn!(section = %from.section_id, %error, "could not load transfer candidates");
                return Vec::new();
            }
        };

        let destination_schedule = match self.sections.section(&to.section_id) {
            Ok(section) => section.and_then(|section| section.schedule),
            Err(error) => {
                warn!(section = %to.section_id, %error, "destination schedule unavailable");
                return Vec::new();
            }
        };

        let mut accepted = Vec::with_capacity(count);
        for candidate in candidates
            .into_iter()
            .filter(|record| !claimed.contains(&record.student_id))
        {
            if accepted.len() == count {
                break;
            }
            if self.has_conflict(
                &candidate.student_id,
                from,
                to,
                destination_schedule.as_deref(),
            ) {
                continue;
            }
            accepted.push(candidate.student_id);
        }

        accepted
    }
}
