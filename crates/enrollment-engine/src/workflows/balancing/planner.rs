use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::config::BalancingConfig;
use super::domain::{
    utilization_rate, BalancingOperation, BalancingPlan, ExpectedOutcome, OperationId,
    OperationStatus, OperationType, SectionBalance,
};
use super::eligibility::CandidateSelector;

/// Greedy single-pass planner pairing over-target sections with under-target ones.
pub struct PlanGenerator<'a, C: ?Sized> {
    selector: &'a C,
    config: &'a BalancingConfig,
}

impl<'a, C> PlanGenerator<'a, C>
where
    C: CandidateSelector + ?Sized,
{
    pub fn new(selector: &'a C, config: &'a BalancingConfig) -> Self {
        Self { selector, config }
    }

    /// `balances` must already carry targets from
    /// [`optimal_distribution`](super::distribution::optimal_distribution).
    pub fn generate(
        &self,
        balances: &[SectionBalance],
        target_utilization: f64,
        now: DateTime<Utc>,
    ) -> BalancingPlan {
        let over: Vec<usize> = (0..balances.len())
            .filter(|&i| balances[i].current_enrollment > balances[i].target_enrollment)
            .collect();
        let under: Vec<usize> = (0..balances.len())
            .filter(|&i| balances[i].current_enrollment < balances[i].target_enrollment)
            .collect();

        // Live head counts and headroom for this pass only.
        let mut enrollment: Vec<u32> = balances.iter().map(|b| b.current_enrollment).collect();
        let mut headroom: Vec<u32> = balances.iter().map(SectionBalance::headroom).collect();
        let mut claimed: HashSet<_> = HashSet::new();
        let mut operations = Vec::new();

        for &source in &over {
            let mut surplus = balances[source].surplus();

            for &destination in &under {
                if surplus == 0 {
                    break;
                }
                let to_move = surplus.min(headroom[destination]);
                if to_move == 0 {
                    continue;
                }

                let students = self.selector.select(
                    &balances[source],
                    &balances[destination],
                    to_move as usize,
                    &claimed,
                );
                if students.is_empty() {
                    continue;
                }

                let moved = students.len() as u32;
                let impact = variance_reduction(
                    &balances[source],
                    &balances[destination],
                    enrollment[source],
                    enrollment[destination],
                    moved,
                );

                claimed.extend(students.iter().cloned());
                operations.push(BalancingOperation {
                    id: operation_id(now),
                    operation_type: OperationType::Redistribute,
                    from_section_id: balances[source].section_id.clone(),
                    to_section_id: balances[destination].section_id.clone(),
                    student_ids: students,
                    reason: format!(
                        "{} is {} over its target of {}; {} has {} open seats below target",
                        balances[source].section_name,
                        surplus,
                        balances[source].target_enrollment,
                        balances[destination].section_name,
                        headroom[destination],
                    ),
                    estimated_impact: format!("{impact:.1}% reduction in utilization variance"),
                    status: OperationStatus::Pending,
                    created_at: now,
                    completed_at: None,
                });

                surplus -= moved;
                headroom[destination] -= moved;
                enrollment[source] -= moved;
                enrollment[destination] += moved;
            }
        }

        let after: Vec<SectionBalance> = balances
            .iter()
            .zip(&enrollment)
            .map(|(balance, &projected)| balance.projected(projected, target_utilization))
            .collect();

        BalancingPlan {
            feasibility_score: feasibility_score(&operations),
            estimated_minutes_to_complete: self.config.minutes_per_operation
                * operations.len() as u32,
            expected_outcome: ExpectedOutcome {
                improvement_score: improvement_score(balances, &after),
                before: balances.to_vec(),
                after,
            },
            operations,
        }
    }
}

fn operation_id(now: DateTime<Utc>) -> OperationId {
    let suffix = Uuid::new_v4().simple().to_string();
    OperationId(format!("balance_{}_{}", now.timestamp_millis(), &suffix[..9]))
}

/// Percent drop in the two-section utilization variance from moving `moved` students.
fn variance_reduction(
    from: &SectionBalance,
    to: &SectionBalance,
    from_enrolled: u32,
    to_enrolled: u32,
    moved: u32,
) -> f64 {
    let pair_variance = |a: f64, b: f64| ((a - b) / 2.0).powi(2);

    let before = pair_variance(
        utilization_rate(from_enrolled, from.capacity),
        utilization_rate(to_enrolled, to.capacity),
    );
    if before == 0.0 {
        return 0.0;
    }
    let after = pair_variance(
        utilization_rate(from_enrolled - moved, from.capacity),
        utilization_rate(to_enrolled + moved, to.capacity),
    );

    (before - after) / before * 100.0
}

/// Mean per-operation score; an empty plan is trivially feasible.
pub fn feasibility_score(operations: &[BalancingOperation]) -> f64 {
    if operations.is_empty() {
        return 100.0;
    }

    let total: f64 = operations
        .iter()
        .map(|operation| {
            let mut score = 70.0;
            let size = operation.student_ids.len();
            if size <= 3 {
                score += 20.0;
            } else if size <= 6 {
                score += 10.0;
            }
            if operation.operation_type == OperationType::Redistribute {
                score += 10.0;
            }
            f64::min(score, 100.0)
        })
        .sum();

    total / operations.len() as f64
}

fn utilization_std_dev(balances: &[SectionBalance]) -> f64 {
    if balances.is_empty() {
        return 0.0;
    }
    let count = balances.len() as f64;
    let mean = balances.iter().map(|b| b.utilization_rate).sum::<f64>() / count;
    let variance = balances
        .iter()
        .map(|b| (b.utilization_rate - mean).powi(2))
        .sum::<f64>()
        / count;
    variance.sqrt()
}

/// Relative drop in cross-section utilization standard deviation, floored at zero.
pub fn improvement_score(before: &[SectionBalance], after: &[SectionBalance]) -> f64 {
    let current = utilization_std_dev(before);
    if current == 0.0 {
        return 0.0;
    }
    let projected = utilization_std_dev(after);
    (100.0 * (current - projected) / current).max(0.0)
}
