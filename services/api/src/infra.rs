use chrono::{DateTime, Duration, Utc};
use enrollment_engine::config::AppConfig;
use enrollment_engine::workflows::balancing::{BalancingConfig, BalancingService};
use enrollment_engine::workflows::conflicts::{ConflictService, DetectionConfig};
use enrollment_engine::workflows::enrollment::{
    AuditAction, AuditEvent, DepartmentId, InMemoryEnrollmentStore, InstitutionId,
    RepositoryError, Section, SectionId, StudentId,
};
use enrollment_engine::workflows::overrides::OverrideService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) const DEMO_INSTITUTION: &str = "northfield";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type Store = InMemoryEnrollmentStore;

/// The three workflow services, all backed by one shared store.
#[derive(Clone)]
pub(crate) struct EngineServices {
    pub(crate) store: Arc<Store>,
    pub(crate) balancing: Arc<BalancingService<Store, Store>>,
    pub(crate) conflicts: Arc<ConflictService<Store, Store>>,
    pub(crate) overrides: Arc<OverrideService<Store, Store>>,
}

impl EngineServices {
    pub(crate) fn new(
        store: Arc<Store>,
        balancing: BalancingConfig,
        detection: DetectionConfig,
    ) -> Self {
        Self {
            balancing: Arc::new(BalancingService::new(
                store.clone(),
                store.clone(),
                balancing,
            )),
            conflicts: Arc::new(ConflictService::new(
                store.clone(),
                store.clone(),
                detection,
            )),
            overrides: Arc::new(OverrideService::new(store.clone(), store.clone())),
            store,
        }
    }

    pub(crate) fn from_config(store: Arc<Store>, config: &AppConfig) -> Self {
        Self::new(store, config.balancing.clone(), config.detection.clone())
    }
}

struct SeedSection {
    id: &'static str,
    department: &'static str,
    name: &'static str,
    capacity: u32,
    enrolled: u32,
    schedule: &'static str,
}

const SEED_SECTIONS: [SeedSection; 5] = [
    SeedSection {
        id: "math-101-a",
        department: "mathematics",
        name: "Calculus I (A)",
        capacity: 30,
        enrolled: 29,
        schedule: "Mon Wed 09:00-10:15",
    },
    SeedSection {
        id: "math-101-b",
        department: "mathematics",
        name: "Calculus I (B)",
        capacity: 30,
        enrolled: 12,
        schedule: "Tue Thu 09:00-10:15",
    },
    SeedSection {
        id: "math-101-c",
        department: "mathematics",
        name: "Calculus I (C)",
        capacity: 30,
        enrolled: 20,
        schedule: "Fri 13:00-15:30",
    },
    SeedSection {
        id: "bio-210",
        department: "biology",
        name: "Cell Biology",
        capacity: 24,
        enrolled: 27,
        schedule: "Mon Wed Fri 11:00-11:50",
    },
    SeedSection {
        id: "chem-150",
        department: "chemistry",
        name: "General Chemistry",
        capacity: 40,
        enrolled: 40,
        schedule: "Tue Thu 13:00-14:15",
    },
];

/// Populate the store with a small institution that has something for every workflow: an
/// unbalanced course, an over-capacity lab, a full class, and one enrollment burst.
pub(crate) fn seed_demo_store(store: &Store, now: DateTime<Utc>) -> Result<(), RepositoryError> {
    let institution = InstitutionId::new(DEMO_INSTITUTION);
    let mut next_student = 0u32;

    for seed in &SEED_SECTIONS {
        store.add_section(Section {
            id: SectionId::new(seed.id),
            institution_id: institution.clone(),
            department_id: DepartmentId::new(seed.department),
            name: seed.name.to_string(),
            capacity: seed.capacity,
            current_enrollment: 0,
            schedule: Some(seed.schedule.to_string()),
        })?;

        let section = SectionId::new(seed.id);
        for offset in 0..seed.enrolled {
            next_student += 1;
            let enrolled_at = now - Duration::days(21) + Duration::hours(offset as i64);
            store.enroll(
                &StudentId(format!("S{next_student:04}")),
                &section,
                enrolled_at,
            )?;
        }
    }

    let burst = StudentId::new("S9001");
    for minute in 0..12 {
        store.record_event(AuditEvent {
            student_id: burst.clone(),
            section_id: SectionId::new("chem-150"),
            action: AuditAction::Enrolled,
            timestamp: now - Duration::minutes(5 * minute + 1),
        })?;
    }

    Ok(())
}
