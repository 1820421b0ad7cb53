//! Roster quality metrics (KPIs).
//!
//! Summarizes a finished [`GenerationResult`] against its context so that
//! runs under different weight profiles can be compared side by side.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Assignment count | Number of drafts |
//! | Coverage rate | Σ min(assigned, target) / Σ target headcount |
//! | Understaffed count | Shifts reported short |
//! | Hard violations | Hard-rule violations in the final roster |
//! | Soft penalty | Σ weight(category) × penalty over soft violations |
//! | Overtime / float shifts | Drafts carrying each flag |
//! | Staffing hours | Hours on shifts that count toward staffing |
//!
//! # Reference
//! Burke et al. (2004), "The State of the Art of Nurse Rostering", §4

use std::collections::HashMap;

use crate::context::SchedulerContext;
use crate::models::{GenerationResult, Severity};
use crate::rules::RuleRegistry;
use crate::scoring::WeightProfile;

/// Roster performance indicators.
#[derive(Debug, Clone)]
pub struct RosterKpi {
    pub assignment_count: usize,
    /// Fraction of target headcount filled (0.0..1.0).
    pub coverage_rate: f64,
    pub understaffed_count: usize,
    pub hard_violation_count: usize,
    /// Weighted soft penalty.
    pub soft_penalty: f64,
    pub overtime_shift_count: usize,
    pub float_shift_count: usize,
    /// Hours worked on shifts that count toward staffing.
    pub staffing_hours: f64,
}

impl RosterKpi {
    /// Computes KPIs for `result`.
    ///
    /// # Arguments
    /// * `registry` - Rules to evaluate; hard ones are counted, soft ones
    ///   are weighted.
    /// * `weights` - Category multipliers for the soft penalty.
    pub fn calculate(
        ctx: &SchedulerContext,
        result: &GenerationResult,
        registry: &RuleRegistry,
        weights: &WeightProfile,
    ) -> Self {
        let mut headcount: HashMap<&str, u32> = HashMap::new();
        let mut staffing_hours = 0.0;
        for a in &result.assignments {
            *headcount.entry(a.shift_id.as_str()).or_insert(0) += 1;
            if let Some(shift) = ctx.shift_by_id(&a.shift_id) {
                if shift.counts_toward_staffing {
                    staffing_hours += shift.duration_hours;
                }
            }
        }

        let (mut target, mut filled) = (0u64, 0u64);
        for shift in ctx.shifts() {
            let t = shift.target_headcount();
            target += u64::from(t);
            filled += u64::from(headcount.get(shift.id.as_str()).copied().unwrap_or(0).min(t));
        }
        let coverage_rate = if target == 0 {
            1.0
        } else {
            filled as f64 / target as f64
        };

        let violations = registry.check(ctx, &result.assignments);
        let hard_violation_count = violations.iter().filter(|v| v.is_hard()).count();
        let soft_penalty = violations
            .iter()
            .filter(|v| v.severity == Severity::Soft)
            .map(|v| weights.weight_for(v.category) * v.penalty_or_zero())
            .sum();

        Self {
            assignment_count: result.assignments.len(),
            coverage_rate,
            understaffed_count: result.understaffed.len(),
            hard_violation_count,
            soft_penalty,
            overtime_shift_count: result.assignments.iter().filter(|a| a.is_overtime).count(),
            float_shift_count: result.assignments.iter().filter(|a| a.is_float).count(),
            staffing_hours,
        }
    }

    /// Whether the roster meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_coverage: f64, max_soft_penalty: f64) -> bool {
        self.hard_violation_count == 0
            && self.coverage_rate >= min_coverage
            && self.soft_penalty <= max_soft_penalty
    }
}
