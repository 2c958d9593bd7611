use super::domain::{balance_score, SectionBalance};

/// Assign per-section target enrollments for `target_utilization` percent.
///
/// When the group as a whole is already above the target, every section keeps its current
/// head count as its target so no plan ever pushes enrollment down across the board.
/// Otherwise each section independently aims for `round(capacity * target / 100)`, capped at
/// its capacity.
pub fn optimal_distribution(
    balances: &[SectionBalance],
    target_utilization: f64,
) -> Vec<SectionBalance> {
    let total_enrolled: u64 = balances.iter().map(|b| b.current_enrollment as u64).sum();
    let total_capacity: u64 = balances.iter().map(|b| b.capacity as u64).sum();
    let ratio = target_utilization / 100.0;
    let saturated = total_enrolled as f64 > total_capacity as f64 * ratio;

    balances
        .iter()
        .map(|balance| {
            let target_enrollment = if saturated {
                balance.current_enrollment
            } else {
                let ideal = (balance.capacity as f64 * ratio).round() as u32;
                ideal.min(balance.capacity)
            };

            SectionBalance {
                target_enrollment,
                balance_score: balance_score(balance.utilization_rate, target_utilization),
                ..balance.clone()
            }
        })
        .collect()
}
