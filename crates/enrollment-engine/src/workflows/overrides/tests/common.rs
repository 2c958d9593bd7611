use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::workflows::enrollment::{
    EnrollmentCommands, EnrollmentFlags, InMemoryEnrollmentStore, RepositoryError, SectionId,
    StudentId,
};
use crate::workflows::overrides::{
    EnrollmentOverride, OverrideId, OverrideRepository, OverrideRequest, OverrideService,
    OverrideStatus, OverrideType,
};

pub(super) fn override_request(override_type: OverrideType) -> OverrideRequest {
    OverrideRequest {
        student_id: StudentId::new("stu-7"),
        class_id: SectionId::new("chem-101"),
        override_type,
        reason: "needed for graduation".to_string(),
        requested_by: "advisor@example.edu".to_string(),
        expires_at: None,
    }
}

pub(super) fn expiring_request(expires_at: DateTime<Utc>) -> OverrideRequest {
    OverrideRequest {
        expires_at: Some(expires_at),
        ..override_request(OverrideType::CapacityOverride)
    }
}

/// Records each forced enrollment; fails while `offline` is set.
#[derive(Default)]
pub(super) struct RecordingCommands {
    calls: Mutex<Vec<(StudentId, SectionId, EnrollmentFlags)>>,
    offline: AtomicBool,
}

impl RecordingCommands {
    pub(super) fn failing() -> Self {
        let commands = Self::default();
        commands.set_offline(true);
        commands
    }

    pub(super) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(super) fn calls(&self) -> Vec<(StudentId, SectionId, EnrollmentFlags)> {
        self.calls.lock().expect("commands mutex poisoned").clone()
    }

    fn refuse_if_offline(&self) -> Result<(), RepositoryError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("registrar system offline".to_string()));
        }
        Ok(())
    }
}

impl EnrollmentCommands for RecordingCommands {
    fn transfer(
        &self,
        _student: &StudentId,
        _from: &SectionId,
        _to: &SectionId,
    ) -> Result<(), RepositoryError> {
        self.refuse_if_offline()
    }

    fn force_enroll(
        &self,
        student: &StudentId,
        section: &SectionId,
        flags: EnrollmentFlags,
    ) -> Result<(), RepositoryError> {
        self.refuse_if_offline()?;
        self.calls
            .lock()
            .expect("commands mutex poisoned")
            .push((student.clone(), section.clone(), flags));
        Ok(())
    }

    fn increase_capacity(
        &self,
        _section: &SectionId,
        _additional: u32,
    ) -> Result<(), RepositoryError> {
        self.refuse_if_offline()
    }

    fn grant_policy_exception(
        &self,
        _student: &StudentId,
        _section: &SectionId,
        _policy: &str,
    ) -> Result<(), RepositoryError> {
        self.refuse_if_offline()
    }
}

pub(super) type TestService = OverrideService<InMemoryEnrollmentStore, RecordingCommands>;

pub(super) fn build_service() -> (
    TestService,
    Arc<InMemoryEnrollmentStore>,
    Arc<RecordingCommands>,
) {
    build_service_with(RecordingCommands::default())
}

pub(super) fn build_service_with(
    commands: RecordingCommands,
) -> (
    TestService,
    Arc<InMemoryEnrollmentStore>,
    Arc<RecordingCommands>,
) {
    let repository = Arc::new(InMemoryEnrollmentStore::new());
    let commands = Arc::new(commands);
    let service = OverrideService::new(repository.clone(), commands.clone());
    (service, repository, commands)
}

pub(super) fn stored(
    repository: &InMemoryEnrollmentStore,
    id: &OverrideId,
) -> EnrollmentOverride {
    OverrideRepository::fetch(repository, id)
        .expect("fetch")
        .expect("override stored")
}

/// Shared store whose reads stall, widening the gap between a read and the write that follows.
pub(super) struct SlowReadRepository {
    pub(super) inner: Arc<InMemoryEnrollmentStore>,
    pub(super) delay: Duration,
}

impl OverrideRepository for SlowReadRepository {
    fn insert(&self, record: EnrollmentOverride) -> Result<(), RepositoryError> {
        OverrideRepository::insert(self.inner.as_ref(), record)
    }

    fn transition(
        &self,
        expected: OverrideStatus,
        record: EnrollmentOverride,
    ) -> Result<(), RepositoryError> {
        self.inner.transition(expected, record)
    }

    fn fetch(&self, id: &OverrideId) -> Result<Option<EnrollmentOverride>, RepositoryError> {
        std::thread::sleep(self.delay);
        OverrideRepository::fetch(self.inner.as_ref(), id)
    }

    fn with_status(
        &self,
        status: OverrideStatus,
    ) -> Result<Vec<EnrollmentOverride>, RepositoryError> {
        self.inner.with_status(status)
    }
}

/// Repository whose every call fails.
pub(super) struct UnavailableRepository;

impl OverrideRepository for UnavailableRepository {
    fn insert(&self, _record: EnrollmentOverride) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("overrides offline".to_string()))
    }

    fn transition(
        &self,
        _expected: OverrideStatus,
        _record: EnrollmentOverride,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("overrides offline".to_string()))
    }

    fn fetch(&self, _id: &OverrideId) -> Result<Option<EnrollmentOverride>, RepositoryError> {
        Err(RepositoryError::Unavailable("overrides offline".to_string()))
    }

    fn with_status(
        &self,
        _status: OverrideStatus,
    ) -> Result<Vec<EnrollmentOverride>, RepositoryError> {
        Err(RepositoryError::Unavailable("overrides offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
