use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::workflows::balancing::{
    optimal_distribution, BalancingConfig, BalancingService, CandidateSelector, SectionBalance,
};
use crate::workflows::enrollment::{
    DepartmentId, EnrollmentCommands, EnrollmentFlags, EnrollmentRecord, InMemoryEnrollmentStore,
    InstitutionId, RepositoryError, ScheduledEnrollment, Section, SectionId, SectionRepository,
    StudentId,
};

pub(super) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 18, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn section(id: &str, capacity: u32, schedule: Option<&str>) -> Section {
    section_in(id, "math", capacity, schedule)
}

pub(super) fn section_in(
    id: &str,
    department: &str,
    capacity: u32,
    schedule: Option<&str>,
) -> Section {
    Section {
        id: SectionId::new(id),
        institution_id: InstitutionId::new("inst-1"),
        department_id: DepartmentId::new(department),
        name: format!("Section {}", id.to_uppercase()),
        capacity,
        current_enrollment: 0,
        schedule: schedule.map(str::to_string),
    }
}

pub(super) fn student(section: &str, index: u32) -> StudentId {
    StudentId(format!("{section}-s{index:03}"))
}

/// Enroll `count` students one minute apart; the highest index is the most recent.
pub(super) fn populate(store: &InMemoryEnrollmentStore, section: &str, count: u32) {
    let id = SectionId::new(section);
    for index in 0..count {
        store
            .enroll(
                &student(section, index),
                &id,
                epoch() + Duration::minutes(index as i64),
            )
            .expect("seed enrollment");
    }
}

/// Section A at 95/100 and section B at 40/100, meeting on different days.
pub(super) fn overloaded_pair() -> Arc<InMemoryEnrollmentStore> {
    let store = Arc::new(InMemoryEnrollmentStore::new());
    store
        .add_section(section("a", 100, Some("Mon Wed 09:00")))
        .expect("add a");
    store
        .add_section(section("b", 100, Some("Tue Thu 09:00")))
        .expect("add b");
    populate(&store, "a", 95);
    populate(&store, "b", 40);
    store
}

pub(super) fn ids(values: &[&str]) -> Vec<SectionId> {
    values.iter().map(|value| SectionId::new(*value)).collect()
}

pub(super) fn balance(id: &str, enrolled: u32, capacity: u32) -> SectionBalance {
    SectionBalance::with_enrollment(
        SectionId::new(id),
        format!("Section {}", id.to_uppercase()),
        enrolled,
        capacity,
    )
}

pub(super) fn targeted(balances: &[SectionBalance]) -> Vec<SectionBalance> {
    optimal_distribution(balances, 85.0)
}

pub(super) fn build_service(
    store: Arc<InMemoryEnrollmentStore>,
) -> (
    BalancingService<InMemoryEnrollmentStore, InMemoryEnrollmentStore>,
    Arc<InMemoryEnrollmentStore>,
) {
    let operations = Arc::new(InMemoryEnrollmentStore::new());
    let service = BalancingService::new(store, operations.clone(), BalancingConfig::default());
    (service, operations)
}

/// Selector backed by fixed rosters, listed most-recent first.
#[derive(Default)]
pub(super) struct RosterSelector {
    rosters: HashMap<SectionId, Vec<StudentId>>,
    blocked: HashSet<StudentId>,
}

impl RosterSelector {
    pub(super) fn with_roster(mut self, section: &str, size: u32) -> Self {
        let roster = (0..size).rev().map(|index| student(section, index)).collect();
        self.rosters.insert(SectionId::new(section), roster);
        self
    }

    pub(super) fn blocking(mut self, student: StudentId) -> Self {
        self.blocked.insert(student);
        self
    }
}

impl CandidateSelector for RosterSelector {
    fn select(
        &self,
        from: &SectionBalance,
        _to: &SectionBalance,
        count: usize,
        claimed: &HashSet<StudentId>,
    ) -> Vec<StudentId> {
        self.rosters
            .get(&from.section_id)
            .map(|roster| {
                roster
                    .iter()
                    .filter(|student| !claimed.contains(*student) && !self.blocked.contains(*student))
                    .take(count)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Wraps the in-memory store and fails chosen calls.
#[derive(Default)]
pub(super) struct FaultyStore {
    pub(super) inner: InMemoryEnrollmentStore,
    pub(super) fail_schedules_for: HashSet<StudentId>,
    pub(super) fail_roster: bool,
    pub(super) fail_section_lookup: bool,
    pub(super) fail_transfers: bool,
}

fn offline() -> RepositoryError {
    RepositoryError::Unavailable("database offline".to_string())
}

impl SectionRepository for FaultyStore {
    fn sections(&self, ids: &[SectionId]) -> Result<Vec<Section>, RepositoryError> {
        self.inner.sections(ids)
    }

    fn section(&self, id: &SectionId) -> Result<Option<Section>, RepositoryError> {
        if self.fail_section_lookup {
            return Err(offline());
        }
        self.inner.section(id)
    }

    fn institution_sections(
        &self,
        institution: &InstitutionId,
    ) -> Result<Vec<Section>, RepositoryError> {
        self.inner.institution_sections(institution)
    }

    fn department_sections(
        &self,
        department: &DepartmentId,
    ) -> Result<Vec<Section>, RepositoryError> {
        self.inner.department_sections(department)
    }

    fn recent_enrollments(
        &self,
        section: &SectionId,
        limit: usize,
    ) -> Result<Vec<EnrollmentRecord>, RepositoryError> {
        if self.fail_roster {
            return Err(offline());
        }
        self.inner.recent_enrollments(section, limit)
    }

    fn active_schedules(
        &self,
        student: &StudentId,
    ) -> Result<Vec<ScheduledEnrollment>, RepositoryError> {
        if self.fail_schedules_for.contains(student) {
            return Err(offline());
        }
        self.inner.active_schedules(student)
    }
}

impl EnrollmentCommands for FaultyStore {
    fn transfer(
        &self,
        student: &StudentId,
        from: &SectionId,
        to: &SectionId,
    ) -> Result<(), RepositoryError> {
        if self.fail_transfers {
            return Err(offline());
        }
        self.inner.transfer(student, from, to)
    }

    fn force_enroll(
        &self,
        student: &StudentId,
        section: &SectionId,
        flags: EnrollmentFlags,
    ) -> Result<(), RepositoryError> {
        self.inner.force_enroll(student, section, flags)
    }

    fn increase_capacity(
        &self,
        section: &SectionId,
        additional: u32,
    ) -> Result<(), RepositoryError> {
        self.inner.increase_capacity(section, additional)
    }

    fn grant_policy_exception(
        &self,
        student: &StudentId,
        section: &SectionId,
        policy: &str,
    ) -> Result<(), RepositoryError> {
        self.inner.grant_policy_exception(student, section, policy)
    }
}

/// Every call fails.
pub(super) struct UnavailableStore;

impl SectionRepository for UnavailableStore {
    fn sections(&self, _ids: &[SectionId]) -> Result<Vec<Section>, RepositoryError> {
        Err(offline())
    }

    fn section(&self, _id: &SectionId) -> Result<Option<Section>, RepositoryError> {
        Err(offline())
    }

    fn institution_sections(
        &self,
        _institution: &InstitutionId,
    ) -> Result<Vec<Section>, RepositoryError> {
        Err(offline())
    }

    fn department_sections(
        &self,
        _department: &DepartmentId,
    ) -> Result<Vec<Section>, RepositoryError> {
        Err(offline())
    }

    fn recent_enrollments(
        &self,
        _section: &SectionId,
        _limit: usize,
    ) -> Result<Vec<EnrollmentRecord>, RepositoryError> {
        Err(offline())
    }

    fn active_schedules(
        &self,
        _student: &StudentId,
    ) -> Result<Vec<ScheduledEnrollment>, RepositoryError> {
        Err(offline())
    }
}

impl EnrollmentCommands for UnavailableStore {
    fn transfer(
        &self,
        _student: &StudentId,
        _from: &SectionId,
        _to: &SectionId,
    ) -> Result<(), RepositoryError> {
        Err(offline())
    }

    fn force_enroll(
        &self,
        _student: &StudentId,
        _section: &SectionId,
        _flags: EnrollmentFlags,
    ) -> Result<(), RepositoryError> {
        Err(offline())
    }

    fn increase_capacity(
        &self,
        _section: &SectionId,
        _additional: u32,
    ) -> Result<(), RepositoryError> {
        Err(offline())
    }

    fn grant_policy_exception(
        &self,
        _student: &StudentId,
        _section: &SectionId,
        _policy: &str,
    ) -> Result<(), RepositoryError> {
        Err(offline())
    }
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
