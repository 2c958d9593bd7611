use tracing::{debug, warn};

use super::domain::EnrollmentConflict;
use super::rules::{
    CapacityRule, ConflictRule, DetectionContext, PolicyRule, PrerequisiteRule, ScheduleRule,
    SuspiciousActivityRule,
};

/// Runs registered rules in order and concatenates their findings.
///
/// Rules are independent; a rule whose store access fails is logged and contributes
/// nothing instead of failing the whole scan. Findings are not deduplicated across rules.
pub struct ConflictDetector {
    rules: Vec<Box<dyn ConflictRule>>,
}

impl ConflictDetector {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Capacity, prerequisite, schedule, suspicious-activity, and policy passes.
    pub fn standard() -> Self {
        Self::empty()
            .with_rule(CapacityRule)
            .with_rule(PrerequisiteRule)
            .with_rule(ScheduleRule)
            .with_rule(SuspiciousActivityRule)
            .with_rule(PolicyRule)
    }

    pub fn with_rule(mut self, rule: impl ConflictRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn detect(&self, context: &DetectionContext<'_>) -> Vec<EnrollmentConflict> {
        let mut conflicts = Vec::new();
        for rule in &self.rules {
            match rule.evaluate(context) {
                Ok(found) => {
                    debug!(rule = rule.name(), found = found.len(), "detection pass finished");
                    conflicts.extend(found);
                }
                Err(error) => {
                    warn!(
                        rule = rule.name(),
                        institution = %context.institution_id,
                        %error,
                        "detection pass failed; skipping"
                    );
                }
            }
        }
        conflicts
    }
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::standard()
    }
}
