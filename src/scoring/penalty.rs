//! Soft-penalty scorer.
//!
//! [`PenaltyScorer::score`] estimates the soft cost of adding one pairing
//! to the current partial schedule, using the state's indexes only. It
//! ranks candidates during construction and repair.
//!
//! [`PenaltyScorer::total`] runs the soft evaluators over a complete
//! assignment set. Local search compares totals.

use std::collections::BTreeSet;

use crate::context::SchedulerContext;
use crate::models::calendar::weekend_id;
use crate::models::{AssignmentDraft, EmploymentType, RuleViolation, Severity, Shift, Staff};
use crate::rules::{
    float_penalty, overtime_split, preference_penalties, skill_mix_penalty, RuleRegistry,
    AGENCY_PENALTY, CHARGE_CLUSTER_PENALTY, CONSECUTIVE_WEEKEND_PENALTY, EXCESS_WEEKEND_PENALTY,
    EXTRA_HOURS_PENALTY_PER_HOUR, HOLIDAY_IMBALANCE_PENALTY, OVERTIME_PENALTY_PER_HOUR,
};
use crate::state::SchedulerState;

use super::WeightProfile;

/// Charge-qualified heads on one shift before clustering costs apply.
const CHARGE_CLUSTER_FLOOR: usize = 2;

/// Weight of the load-balancing tie-breaker.
const LOAD_BALANCE_WEIGHT: f64 = 0.01;

/// Weighted soft-penalty scorer.
#[derive(Debug, Clone)]
pub struct PenaltyScorer {
    weights: WeightProfile,
    soft_rules: RuleRegistry,
}

impl Default for PenaltyScorer {
    fn default() -> Self {
        Self::new(WeightProfile::default())
    }
}

impl PenaltyScorer {
    /// Creates a scorer over the built-in soft rules.
    pub fn new(weights: WeightProfile) -> Self {
        Self {
            weights,
            soft_rules: RuleRegistry::standard_of(Severity::Soft),
        }
    }

    /// Replaces the soft rules used by [`total`](Self::total).
    pub fn with_soft_rules(mut self, registry: RuleRegistry) -> Self {
        self.soft_rules = registry.only(Severity::Soft);
        self
    }

    /// Active weights.
    #[inline]
    pub fn weights(&self) -> &WeightProfile {
        &self.weights
    }

    /// Estimated weighted cost of adding `staff` to `shift`. Lower is
    /// better; the value can be negative when the pairing improves the
    /// shift's skill mix.
    pub fn score(
        &self,
        staff: &Staff,
        shift: &Shift,
        state: &SchedulerState,
        ctx: &SchedulerContext,
    ) -> f64 {
        let w = &self.weights;
        let params = ctx.params();
        let policy = ctx.policy();
        let mut cost = 0.0;

        // Overtime tiers on the calendar week
        let before = state.week_hours(&staff.id, shift.date);
        let (extra, overtime) = overtime_split(
            before,
            shift.duration_hours,
            staff.standard_weekly_hours(),
            params.overtime_threshold_hours,
        );
        cost += w.overtime
            * (overtime * OVERTIME_PENALTY_PER_HOUR + extra * EXTRA_HOURS_PENALTY_PER_HOUR);

        // Preferences
        let mut preference: f64 = preference_penalties(staff, shift)
            .into_iter()
            .map(|(_, p)| p)
            .sum();
        if let Some(cap) = staff.preferences.as_ref().and_then(|p| p.max_hours_per_week) {
            let (_, above_cap) = overtime_split(before, shift.duration_hours, cap, cap);
            preference += above_cap * EXTRA_HOURS_PENALTY_PER_HOUR;
        }
        cost += w.preference * preference;

        // Weekends
        if let Some(weekend) = weekend_id(shift.date) {
            if !staff.weekend_exempt
                && state.weekend_shift_count(&staff.id) >= policy.weekend_shifts_required
            {
                cost += w.weekend_count * EXCESS_WEEKEND_PENALTY;
            }
            if !state.works_weekend(&staff.id, weekend)
                && state.consecutive_weekend_run_with(&staff.id, weekend)
                    > policy.max_consecutive_weekends
            {
                cost += w.consecutive_weekends * CONSECUTIVE_WEEKEND_PENALTY;
            }
        }

        // Holidays: the more already worked, the costlier another one
        if let Some(holiday) = ctx.holiday_on(shift.date) {
            let worked: BTreeSet<_> = state
                .worked_dates(&staff.id)
                .filter_map(|d| ctx.holiday_on(d))
                .map(|h| h.group_key())
                .collect();
            if !worked.contains(&holiday.group_key()) {
                let count = ctx.prior_holiday_count(&staff.id) as f64 + worked.len() as f64;
                cost += w.holiday_fairness * HOLIDAY_IMBALANCE_PENALTY * count;
            }
        }

        // Shift composition
        let occupants: Vec<&Staff> = state
            .occupants(&shift.id)
            .iter()
            .filter_map(|id| ctx.staff_by_id(id))
            .collect();
        let levels = || occupants.iter().map(|s| s.competency_level);
        let mix_before = skill_mix_penalty(levels());
        let mix_after = skill_mix_penalty(levels().chain([staff.competency_level]));
        cost += w.skill_mix * (mix_after - mix_before);

        if staff.charge_qualified {
            let qualified = occupants.iter().filter(|s| s.charge_qualified).count() + 1;
            if qualified > CHARGE_CLUSTER_FLOOR {
                cost += w.charge_clustering * CHARGE_CLUSTER_PENALTY;
            }
        }

        // Cost of labour source
        cost += w.float * float_penalty(staff, shift);
        if staff.employment_type == EmploymentType::Agency {
            cost += w.agency * AGENCY_PENALTY;
        }

        // Spread load: prefer whoever is furthest below their target
        let target = staff.standard_weekly_hours().max(1.0);
        cost + LOAD_BALANCE_WEIGHT * state.total_hours(&staff.id) / target
    }

    /// Weighted soft penalty of a complete assignment set.
    pub fn total(&self, ctx: &SchedulerContext, assignments: &[AssignmentDraft]) -> f64 {
        self.weighted(&self.soft_rules.check(ctx, assignments))
    }

    /// Weighted sum of violation penalties.
    pub fn weighted(&self, violations: &[RuleViolation]) -> f64 {
        violations
            .iter()
            .map(|v| self.weights.weight_for(v.category) * v.penalty_or_zero())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PublicHoliday, ShiftType, StaffPreferences};
    use chrono::{NaiveDate, NaiveTime};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn shift(id: &str, day: u32, unit: &str) -> Shift {
        Shift::new(
            id,
            d(day),
            ShiftType::Day,
            NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            12.0,
            unit,
        )
    }

    fn ctx() -> SchedulerContext {
        SchedulerContext::new(vec![], vec![])
    }

    #[test]
    fn test_fresh_home_unit_staff_scores_zero() {
        let scorer = PenaltyScorer::default();
        let s = scorer.score(
            &Staff::new("N1", "U"),
            &shift("S1", 4, "U"),
            &SchedulerState::new(),
            &ctx(),
        );
        assert!(s.abs() < 1e-10);
    }

    #[test]
    fn test_overtime_raises_score() {
        let scorer = PenaltyScorer::new(WeightProfile::uniform());
        let mut state = SchedulerState::new();
        for day in 4..=6 {
            state.add("N1", &shift(&format!("S{day}"), day, "U"));
        }
        let n = Staff::new("N1", "U");
        // 36h + 12h = 48h: 8h overtime
        let s = scorer.score(&n, &shift("S7", 7, "U"), &state, &ctx());
        let expected = 8.0 * OVERTIME_PENALTY_PER_HOUR + LOAD_BALANCE_WEIGHT * 36.0 / 40.0;
        assert!((s - expected).abs() < 1e-9);
    }

    #[test]
    fn test_load_balancing_prefers_less_loaded() {
        let scorer = PenaltyScorer::default();
        let mut state = SchedulerState::new();
        state.add("N1", &shift("S1", 4, "U"));
        let target = shift("S2", 6, "U");
        let busy = scorer.score(&Staff::new("N1", "U"), &target, &state, &ctx());
        let idle = scorer.score(&Staff::new("N2", "U"), &target, &state, &ctx());
        assert!(idle < busy);
    }

    #[test]
    fn test_profiles_rank_float_against_preference() {
        let prefs = StaffPreferences {
            preferred_shift_type: Some(ShiftType::Night),
            ..Default::default()
        };
        let home_but_unhappy = Staff::new("N1", "U").with_preferences(prefs);
        let floater = Staff::new("F1", "ER");
        let target = shift("S1", 4, "U");
        let state = SchedulerState::new();

        let fair = PenaltyScorer::new(WeightProfile::fair());
        let cost = PenaltyScorer::new(WeightProfile::cost_optimized());
        // Fair: preference 2.0×5=10 vs float 0.5×10=5 → floater wins
        assert!(
            fair.score(&floater, &target, &state, &ctx())
                < fair.score(&home_but_unhappy, &target, &state, &ctx())
        );
        // Cost: preference 0.5×5=2.5 vs float 2.0×10=20 → home nurse wins
        assert!(
            cost.score(&home_but_unhappy, &target, &state, &ctx())
                < cost.score(&floater, &target, &state, &ctx())
        );
    }

    #[test]
    fn test_holiday_cost_grows_with_count() {
        let c = ctx()
            .with_holiday(PublicHoliday::new(d(4), "Spring Day"))
            .with_prior_holidays("N1", 2);
        let scorer = PenaltyScorer::new(WeightProfile::uniform());
        let state = SchedulerState::new();
        let target = shift("H", 4, "U");
        let veteran = scorer.score(&Staff::new("N1", "U"), &target, &state, &c);
        let fresh = scorer.score(&Staff::new("N2", "U"), &target, &state, &c);
        assert!((veteran - fresh - 2.0 * HOLIDAY_IMBALANCE_PENALTY).abs() < 1e-9);
    }

    #[test]
    fn test_skill_mix_delta() {
        let c = SchedulerContext::new(
            vec![],
            vec![Staff::new("A", "U").with_level(3)],
        );
        let mut state = SchedulerState::new();
        let target = shift("S1", 4, "U");
        state.add("A", &target);
        let scorer = PenaltyScorer::new(WeightProfile::uniform());
        let same = scorer.score(&Staff::new("B", "U").with_level(3), &target, &state, &c);
        let diverse = scorer.score(&Staff::new("C", "U").with_level(5), &target, &state, &c);
        assert!(diverse < same);
    }

    #[test]
    fn test_total_weights_by_category() {
        let s = shift("S1", 4, "U");
        let c = SchedulerContext::new(
            vec![s.clone()],
            vec![Staff::new("A1", "U").with_employment(EmploymentType::Agency)],
        );
        let drafts = vec![AssignmentDraft::new(&s, c.staff_by_id("A1").unwrap(), false)];
        let cost = PenaltyScorer::new(WeightProfile::cost_optimized()).total(&c, &drafts);
        assert!((cost - 2.5 * AGENCY_PENALTY).abs() < 1e-10);
    }
}
