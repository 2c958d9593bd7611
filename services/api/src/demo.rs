use crate::infra::{seed_demo_store, EngineServices, Store, DEMO_INSTITUTION};
use chrono::{Duration, Utc};
use clap::Args;
use enrollment_engine::error::AppError;
use enrollment_engine::workflows::balancing::{BalancingConfig, BalancingPlan};
use enrollment_engine::workflows::conflicts::{
    ConflictType, DetectionConfig, EnrollmentConflict, ResolutionAction, ResolutionRequest,
};
use enrollment_engine::workflows::enrollment::{DepartmentId, InstitutionId, SectionId, StudentId};
use enrollment_engine::workflows::overrides::{OverrideRequest, OverrideType, Role};
use serde::Serialize;
use std::sync::Arc;

const DEMO_SECTIONS: [&str; 3] = ["math-101-a", "math-101-b", "math-101-c"];

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Target utilization percentage for the balancing plan (defaults to 85).
    #[arg(long)]
    pub(crate) target_utilization: Option<f64>,
    /// Skip executing the generated balancing operations.
    #[arg(long)]
    pub(crate) dry_run: bool,
    /// Print full JSON payloads alongside the summary.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        target_utilization,
        dry_run,
        json,
    } = args;

    let store = Arc::new(Store::new());
    seed_demo_store(&store, Utc::now())?;
    let services = EngineServices::new(
        store,
        BalancingConfig::default(),
        DetectionConfig::default(),
    );

    println!("Enrollment engine demo ({DEMO_INSTITUTION})");
    run_balancing(&services, target_utilization, dry_run, json)?;
    run_conflicts(&services, json)?;
    run_overrides(&services, json)?;
    Ok(())
}

fn run_balancing(
    services: &EngineServices,
    target_utilization: Option<f64>,
    dry_run: bool,
    json: bool,
) -> Result<(), AppError> {
    let section_ids: Vec<SectionId> = DEMO_SECTIONS.iter().map(|id| SectionId::new(*id)).collect();
    let plan = services
        .balancing
        .generate_plan(&section_ids, target_utilization)?;

    println!("\nBalancing plan for Calculus I");
    render_plan(&plan);
    if json {
        print_json("Plan payload", &plan);
    }

    if dry_run {
        println!("  Dry run: operations left pending");
        return Ok(());
    }

    for operation in &plan.operations {
        services.balancing.approve_operation(&operation.id)?;
        let executed = services.balancing.execute_operation(&operation.id)?;
        println!(
            "  Executed {} -> {}",
            operation.id,
            if executed { "completed" } else { "failed" }
        );
    }

    let history = services
        .balancing
        .history(&DepartmentId::new("mathematics"))?;
    println!("  Department history: {} operation(s)", history.len());
    Ok(())
}

fn render_plan(plan: &BalancingPlan) {
    for (before, after) in plan
        .expected_outcome
        .before
        .iter()
        .zip(&plan.expected_outcome.after)
    {
        println!(
            "  - {}: {}/{} ({:.1}%) target {} -> projected {} ({:.1}%)",
            before.section_name,
            before.current_enrollment,
            before.capacity,
            before.utilization_rate,
            before.target_enrollment,
            after.current_enrollment,
            after.utilization_rate
        );
    }
    if plan.operations.is_empty() {
        println!("  No transfers needed");
    }
    for operation in &plan.operations {
        println!(
            "  * move {} student(s) {} -> {}: {}",
            operation.student_ids.len(),
            operation.from_section_id,
            operation.to_section_id,
            operation.estimated_impact
        );
    }
    println!(
        "  Feasibility {:.0} | improvement {:.1} | ~{} min",
        plan.feasibility_score,
        plan.expected_outcome.improvement_score,
        plan.estimated_minutes_to_complete
    );
}

fn run_conflicts(services: &EngineServices, json: bool) -> Result<(), AppError> {
    let institution = InstitutionId::new(DEMO_INSTITUTION);
    let conflicts = services.conflicts.detect_conflicts(&institution)?;

    println!("\nConflict scan");
    render_conflicts(&conflicts);
    if json {
        print_json("Conflict payload", &conflicts);
    }

    for conflict in &conflicts {
        let action = match (conflict.conflict_type, &conflict.class_id) {
            (ConflictType::CapacityExceeded, Some(class_id)) => ResolutionAction::CapacityIncrease {
                class_id: class_id.clone(),
                additional_seats: conflict.affected_students.len() as u32,
            },
            _ => ResolutionAction::Dismiss,
        };
        let resolution = services.conflicts.resolve_conflict(
            &conflict.id,
            ResolutionRequest {
                action,
                resolved_by: "registrar@northfield.edu".to_string(),
                notes: Some("resolved during demo".to_string()),
            },
        )?;
        println!(
            "  Resolved {} via {}",
            resolution.conflict_id,
            resolution.action.label()
        );
    }

    let rescan = services.conflicts.detect_conflicts(&institution)?;
    println!("  Rescan:");
    render_conflicts(&rescan);
    Ok(())
}

fn render_conflicts(conflicts: &[EnrollmentConflict]) {
    if conflicts.is_empty() {
        println!("  - none");
    }
    for conflict in conflicts {
        println!(
            "  - [{:?}/{:?}] {} ({} affected, {:?})",
            conflict.severity,
            conflict.conflict_type,
            conflict.description,
            conflict.affected_students.len(),
            conflict.status
        );
    }
}

fn run_overrides(services: &EngineServices, json: bool) -> Result<(), AppError> {
    println!("\nOverride workflow");
    let capabilities = services
        .overrides
        .capabilities(Role::DepartmentHead, &InstitutionId::new(DEMO_INSTITUTION));
    for capability in &capabilities {
        println!(
            "  - department head / {:?}: request={} approve={}",
            capability.override_type, capability.can_request, capability.can_approve
        );
    }

    let approved_id = services.overrides.request(OverrideRequest {
        student_id: StudentId::new("S7001"),
        class_id: SectionId::new("chem-150"),
        override_type: OverrideType::CapacityOverride,
        reason: "Required for nursing program sequence".to_string(),
        requested_by: "advisor@northfield.edu".to_string(),
        expires_at: Some(Utc::now() + Duration::days(7)),
    })?;
    let denied_id = services.overrides.request(OverrideRequest {
        student_id: StudentId::new("S7002"),
        class_id: SectionId::new("bio-210"),
        override_type: OverrideType::DeadlineOverride,
        reason: "Missed add/drop".to_string(),
        requested_by: "advisor@northfield.edu".to_string(),
        expires_at: None,
    })?;
    println!(
        "  Pending requests: {}",
        services.overrides.pending()?.len()
    );

    let approved = services.overrides.approve(
        &approved_id,
        "dean@northfield.edu",
        vec!["Attend lab safety orientation".to_string()],
    )?;
    println!("  {} -> {}", approved.id, approved.status.label());
    let denied = services.overrides.deny(
        &denied_id,
        "registrar@northfield.edu",
        Some("Deadline exceptions closed for the term".to_string()),
    )?;
    println!("  {} -> {}", denied.id, denied.status.label());

    if let Some(enrollment) = services
        .store
        .enrollment(&approved.student_id, &approved.class_id)?
    {
        println!(
            "  {} now enrolled in {} (beyond capacity: {})",
            enrollment.student_id, enrollment.section_id, enrollment.flags.beyond_capacity
        );
    }
    if json {
        print_json("Override payload", &[approved, denied]);
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(label: &str, value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("  {label}:\n{json}"),
        Err(err) => println!("  {label} unavailable: {err}"),
    }
}
