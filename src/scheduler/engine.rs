//! Engine orchestration.
//!
//! One run: validate → construct → repair → local search → normalize
//! derived flags. Each run owns its roster and state; runs for different
//! weight profiles share only the read-only context and can proceed in
//! parallel.

use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::context::SchedulerContext;
use crate::error::RosterError;
use crate::models::{AssignmentDraft, GenerationResult};
use crate::scoring::{PenaltyScorer, ProfileKind, WeightProfile};
use crate::validation::validate_context;

use super::greedy::{GreedyConstructor, ShortfallExplainer};
use super::local_search::{LocalSearch, SearchStats};
use super::repair::Repairer;
use super::Roster;

/// Result of one run plus phase statistics.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Profile weights the run used.
    pub weights: WeightProfile,
    pub result: GenerationResult,
    /// Shifts left short by construction, before repair.
    pub constructed_understaffed: usize,
    pub repair_passes: usize,
    pub repair_fixes: usize,
    pub search: SearchStats,
}

/// Rostering engine.
///
/// # Example
/// ```
/// use chrono::{NaiveDate, NaiveTime};
/// use u_roster::config::EngineConfig;
/// use u_roster::context::SchedulerContext;
/// use u_roster::models::{Shift, ShiftType, Staff};
/// use u_roster::scheduler::RosterEngine;
///
/// let shifts = (4..=6)
///     .map(|day| {
///         Shift::new(
///             format!("D{day}"),
///             NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
///             ShiftType::Day,
///             NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
///             12.0,
///             "Med-Surg",
///         )
///     })
///     .collect();
/// let staff = vec![Staff::new("N1", "Med-Surg"), Staff::new("N2", "Med-Surg")];
/// let ctx = SchedulerContext::new(shifts, staff);
///
/// let engine = RosterEngine::new(EngineConfig::default().with_seed(42));
/// let result = engine.generate(&ctx).unwrap();
/// assert_eq!(result.assignment_count(), 3);
/// assert!(result.is_fully_staffed());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RosterEngine {
    config: EngineConfig,
}

impl RosterEngine {
    /// Creates an engine.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Engine configuration.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generates a roster with the configured profile.
    ///
    /// # Errors
    /// [`RosterError::Config`] for out-of-range settings and
    /// [`RosterError::InvalidContext`] for structurally malformed input.
    /// Unfillable shifts are not errors.
    pub fn generate(&self, ctx: &SchedulerContext) -> Result<GenerationResult, RosterError> {
        self.run(ctx, self.config.profile).map(|o| o.result)
    }

    /// Generates a roster with `profile`, returning phase statistics.
    pub fn run(
        &self,
        ctx: &SchedulerContext,
        profile: ProfileKind,
    ) -> Result<RunOutcome, RosterError> {
        let ctx = self.prepare(ctx)?;
        let mut rng = self.rng(self.config.random_seed);
        Ok(self.execute(&ctx, profile.weights(), &mut rng))
    }

    /// Generates a roster with explicit weights and randomness.
    pub fn run_with<R: Rng>(
        &self,
        ctx: &SchedulerContext,
        weights: WeightProfile,
        rng: &mut R,
    ) -> Result<RunOutcome, RosterError> {
        let ctx = self.prepare(ctx)?;
        Ok(self.execute(&ctx, weights, rng))
    }

    /// Runs every profile in parallel, results in [`ProfileKind::ALL`]
    /// order. With a configured seed, profile `i` uses `seed + i`.
    pub fn generate_all_profiles(
        &self,
        ctx: &SchedulerContext,
    ) -> Result<Vec<(ProfileKind, GenerationResult)>, RosterError> {
        let ctx = self.prepare(ctx)?;
        let ctx = &ctx;
        Ok(ProfileKind::ALL
            .par_iter()
            .enumerate()
            .map(|(i, &kind)| {
                let seed = self.config.random_seed.map(|s| s.wrapping_add(i as u64));
                let mut rng = self.rng(seed);
                (kind, self.execute(ctx, kind.weights(), &mut rng).result)
            })
            .collect())
    }

    /// Validates settings and input. Configured rule parameters, when
    /// present, replace the context's bag on a copy of the context.
    fn prepare(&self, ctx: &SchedulerContext) -> Result<SchedulerContext, RosterError> {
        self.config.validate()?;
        validate_context(ctx).map_err(RosterError::InvalidContext)?;
        let ctx = match &self.config.rules {
            Some(rules) => ctx.clone().with_rule_parameters(rules.clone()),
            None => ctx.clone(),
        };
        ctx.params().validate()?;
        Ok(ctx)
    }

    fn rng(&self, seed: Option<u64>) -> ChaCha8Rng {
        match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        }
    }

    fn execute<R: Rng>(
        &self,
        ctx: &SchedulerContext,
        weights: WeightProfile,
        rng: &mut R,
    ) -> RunOutcome {
        let started = Instant::now();
        info!(
            event = "solve_start",
            schedule_id = %ctx.schedule_id,
            shifts = ctx.shifts().len(),
            staff = ctx.staff().len(),
        );

        let scorer = PenaltyScorer::new(weights);
        let explainer =
            ShortfallExplainer::new(self.config.rejection_sample_size, self.config.max_rejection_reasons);

        let phase = Instant::now();
        info!(event = "phase_start", phase = "Construction", phase_index = 0);
        let built = GreedyConstructor::new(&scorer)
            .with_explainer(explainer)
            .construct(ctx);
        let mut roster = built.roster;
        info!(
            event = "phase_end",
            phase = "Construction",
            phase_index = 0,
            duration_ms = phase.elapsed().as_millis() as u64,
            assignments = roster.len(),
            understaffed = built.understaffed.len(),
        );

        let phase = Instant::now();
        info!(event = "phase_start", phase = "Repair", phase_index = 1);
        let repair = Repairer::new(self.config.repair_passes)
            .with_explainer(explainer)
            .repair(&mut roster, ctx);
        info!(
            event = "phase_end",
            phase = "Repair",
            phase_index = 1,
            duration_ms = phase.elapsed().as_millis() as u64,
            passes = repair.passes,
            fixes = repair.fixes,
            understaffed = repair.understaffed.len(),
        );

        let phase = Instant::now();
        info!(event = "phase_start", phase = "Local Search", phase_index = 2);
        let search = LocalSearch::new(&scorer)
            .with_iterations(self.config.local_search_iterations)
            .run(&mut roster, ctx, rng);
        info!(
            event = "phase_end",
            phase = "Local Search",
            phase_index = 2,
            duration_ms = phase.elapsed().as_millis() as u64,
            steps = search.iterations,
            accepted = search.accepted,
            score = search.final_penalty,
        );

        for u in &repair.understaffed {
            warn!(
                shift = %u.shift_id,
                date = %u.date,
                unit = %u.unit,
                required = u.required,
                assigned = u.assigned,
                shortage = ?u.shortage,
                "shift understaffed"
            );
        }

        let result = GenerationResult {
            assignments: normalize(&roster, ctx),
            understaffed: repair.understaffed,
        };
        info!(
            event = "solve_end",
            duration_ms = started.elapsed().as_millis() as u64,
            assignments = result.assignments.len(),
            understaffed = result.understaffed.len(),
            score = search.final_penalty,
        );

        RunOutcome {
            weights,
            result,
            constructed_understaffed: built.understaffed.len(),
            repair_passes: repair.passes,
            repair_fixes: repair.fixes,
            search,
        }
    }
}

/// Rebuilds every draft with flags derived from the final roster.
fn normalize(roster: &Roster, ctx: &SchedulerContext) -> Vec<AssignmentDraft> {
    let threshold = ctx.params().overtime_threshold_hours;
    roster
        .assignments()
        .iter()
        .filter_map(|d| {
            let shift = ctx.shift_by_id(&d.shift_id)?;
            let staff = ctx.staff_by_id(&d.staff_id)?;
            let prior = roster.state().week_hours_before(&staff.id, shift.start());
            Some(AssignmentDraft::derive(
                shift,
                staff,
                d.is_charge_nurse,
                prior,
                threshold,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleParameters;
    use crate::models::{Severity, Shift, ShiftType, Staff};
    use crate::rules::RuleRegistry;
    use crate::validation::ValidationErrorKind;
    use chrono::{Duration, NaiveDate, NaiveTime};
    use std::collections::HashSet;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    fn shift(id: String, date: NaiveDate, kind: ShiftType, hour: u32, hours: f64, unit: &str) -> Shift {
        Shift::new(
            id,
            date,
            kind,
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            hours,
            unit,
        )
    }

    /// 14 days, one 12h day and one 12h night shift per day, two staff each.
    fn two_week_ward() -> SchedulerContext {
        let mut shifts = Vec::new();
        for i in 0..14 {
            let date = start() + Duration::days(i);
            shifts.push(shift(format!("D{i}"), date, ShiftType::Day, 7, 12.0, "Med-Surg").with_required(2));
            shifts.push(shift(format!("N{i}"), date, ShiftType::Night, 19, 12.0, "Med-Surg").with_required(2));
        }
        let staff = (0..14)
            .map(|i| Staff::new(format!("RN{i:02}"), "Med-Surg").with_level(3))
            .collect();
        SchedulerContext::new(shifts, staff)
    }

    fn engine() -> RosterEngine {
        RosterEngine::new(EngineConfig::default().with_seed(42))
    }

    #[test]
    fn test_two_week_ward_fully_staffed() {
        let ctx = two_week_ward();
        let result = engine().generate(&ctx).unwrap();

        assert_eq!(result.assignment_count(), 56);
        assert!(result.understaffed.is_empty());

        let mut day_night: HashSet<(String, NaiveDate)> = HashSet::new();
        for a in &result.assignments {
            let shift = ctx.shift_by_id(&a.shift_id).unwrap();
            assert!(
                day_night.insert((a.staff_id.clone(), shift.date)),
                "{} works twice on {}",
                a.staff_id,
                shift.date
            );
        }

        let hard = RuleRegistry::standard_of(Severity::Hard).check(&ctx, &result.assignments);
        assert!(hard.is_empty(), "{hard:?}");
    }

    #[test]
    fn test_empty_inputs() {
        let ctx = SchedulerContext::new(vec![], vec![]);
        let result = engine().generate(&ctx).unwrap();
        assert_eq!(result.assignment_count(), 0);
        assert!(result.understaffed.is_empty());
    }

    #[test]
    fn test_no_staff_every_shift_understaffed() {
        let shifts = (0..5)
            .map(|i| {
                shift(format!("S{i}"), start() + Duration::days(i), ShiftType::Day, 7, 8.0, "Med")
                    .with_required(2)
            })
            .collect();
        let ctx = SchedulerContext::new(shifts, vec![]);
        let result = engine().generate(&ctx).unwrap();
        assert_eq!(result.assignment_count(), 0);
        assert_eq!(result.understaffed.len(), 5);
        assert!(result.understaffed.iter().all(|u| u.assigned == 0 && u.required == 2));
    }

    #[test]
    fn test_hard_invariants_on_mixed_units() {
        let mut shifts = Vec::new();
        for i in 0..14 {
            let date = start() + Duration::days(i);
            shifts.push(
                shift(format!("ICU-D{i}"), date, ShiftType::Day, 7, 12.0, "ICU")
                    .with_required(3)
                    .with_charge_required(),
            );
            shifts.push(shift(format!("ICU-N{i}"), date, ShiftType::Night, 19, 12.0, "ICU").with_required(2));
            shifts.push(
                shift(format!("MED-D{i}"), date, ShiftType::Day, 7, 8.0, "Med-Surg")
                    .with_required(2)
                    .with_charge_required(),
            );
            shifts.push(shift(format!("MED-OC{i}"), date, ShiftType::OnCall, 15, 8.0, "Med-Surg"));
        }
        let mut staff = Vec::new();
        for i in 0..24 {
            let unit = if i % 2 == 0 { "ICU" } else { "Med-Surg" };
            let level = [1, 2, 3, 3, 4, 5][i % 6];
            let mut s = Staff::new(format!("S{i:02}"), unit).with_level(level);
            if level >= 4 {
                s = s.with_charge_qualification();
            }
            staff.push(s);
        }
        let ctx = SchedulerContext::new(shifts, staff);
        let result = engine().generate(&ctx).unwrap();

        // Staffing rules may fail when candidates run out; pairing and
        // composition rules never may.
        let staffing = ["min-staff", "patient-ratio", "charge-nurse"];
        let hard: Vec<_> = RuleRegistry::standard_of(Severity::Hard)
            .check(&ctx, &result.assignments)
            .into_iter()
            .filter(|v| !staffing.contains(&v.rule_id.as_str()))
            .collect();
        assert!(hard.is_empty(), "{hard:?}");

        for sh in ctx.shifts() {
            let charges: Vec<_> = result
                .assignments_for_shift(&sh.id)
                .into_iter()
                .filter(|a| a.is_charge_nurse)
                .collect();
            assert!(charges.len() <= 1, "{} has {} charge nurses", sh.id, charges.len());
            for c in charges {
                assert!(ctx.staff_by_id(&c.staff_id).unwrap().can_take_charge());
            }
        }

        for u in &result.understaffed {
            let assigned = result
                .assignments
                .iter()
                .filter(|a| a.shift_id == u.shift_id)
                .count();
            assert_eq!(assigned as u32, u.assigned);
            assert!(u.assigned < u.required);
        }
    }

    #[test]
    fn test_flags_are_derived() {
        // Four 12h days in one week: the fourth crosses 40h
        let shifts = (0..4)
            .map(|i| shift(format!("D{i}"), start() + Duration::days(i), ShiftType::Day, 7, 12.0, "ICU"))
            .collect();
        let ctx = SchedulerContext::new(shifts, vec![Staff::new("F1", "Med").with_level(4)]);
        let result = engine().generate(&ctx).unwrap();
        assert_eq!(result.assignment_count(), 4);
        assert!(result.assignments.iter().all(|a| a.is_float));
        assert!(result
            .assignments
            .iter()
            .all(|a| a.float_from_unit.as_deref() == Some("Med")));
        let overtime: Vec<&str> = result
            .assignments
            .iter()
            .filter(|a| a.is_overtime)
            .map(|a| a.shift_id.as_str())
            .collect();
        assert_eq!(overtime, vec!["D3"]);
    }

    #[test]
    fn test_invalid_context_is_error() {
        let ctx = SchedulerContext::new(vec![], vec![Staff::new("A", "U"), Staff::new("A", "U")]);
        match engine().generate(&ctx) {
            Err(RosterError::InvalidContext(errors)) => {
                assert_eq!(errors[0].kind, ValidationErrorKind::DuplicateId);
            }
            other => panic!("expected InvalidContext, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_config_is_error() {
        let config = EngineConfig::default().with_rules(RuleParameters {
            max_consecutive_days: 0,
            ..Default::default()
        });
        let result = RosterEngine::new(config).generate(&two_week_ward());
        assert!(matches!(result, Err(RosterError::Config(_))));
    }

    #[test]
    fn test_configured_rules_apply() {
        // 16h minimum rest: a nurse can no longer work 12h days back to back
        let shifts = (0..2)
            .map(|i| shift(format!("D{i}"), start() + Duration::days(i), ShiftType::Day, 7, 12.0, "Med"))
            .collect();
        let ctx = SchedulerContext::new(shifts, vec![Staff::new("N1", "Med")]);
        let strict = EngineConfig::default().with_seed(1).with_rules(RuleParameters {
            min_rest_hours: 16.0,
            ..Default::default()
        });
        let result = RosterEngine::new(strict).generate(&ctx).unwrap();
        assert_eq!(result.assignment_count(), 1);
        assert_eq!(result.understaffed.len(), 1);
        assert_eq!(result.understaffed[0].reasons, vec!["less than 16h rest between shifts"]);
    }

    #[test]
    fn test_context_rule_parameters_apply() {
        let ctx: SchedulerContext = serde_json::from_str(
            r#"{
                "schedule_id": "strict-rest",
                "shifts": [
                    {"id": "D0", "date": "2024-03-04", "shift_type": "day",
                     "start_time": "07:00:00", "duration_hours": 12.0,
                     "unit": "Med", "required_staff_count": 1},
                    {"id": "D1", "date": "2024-03-05", "shift_type": "day",
                     "start_time": "07:00:00", "duration_hours": 12.0,
                     "unit": "Med", "required_staff_count": 1}
                ],
                "staff": [{
                    "id": "N1", "role": "RN", "employment_type": "full_time",
                    "competency_level": 3, "fte": 1.0, "home_unit": "Med"
                }],
                "rule_parameters": {"min_rest_hours": 16.0}
            }"#,
        )
        .unwrap();
        assert!((ctx.params().min_rest_hours - 16.0).abs() < 1e-10);

        let result = engine().generate(&ctx).unwrap();
        assert_eq!(result.assignment_count(), 1);
        assert_eq!(result.understaffed.len(), 1);
        assert_eq!(result.understaffed[0].reasons, vec!["less than 16h rest between shifts"]);

        // An explicit engine bag still wins
        let relaxed = EngineConfig::default()
            .with_seed(1)
            .with_rules(RuleParameters::default());
        let result = RosterEngine::new(relaxed).generate(&ctx).unwrap();
        assert_eq!(result.assignment_count(), 2);
    }

    #[test]
    fn test_context_consecutive_cap_applies_to_all_profiles() {
        let shifts = (0..4)
            .map(|i| shift(format!("D{i}"), start() + Duration::days(i), ShiftType::Day, 7, 8.0, "Med"))
            .collect();
        let ctx = SchedulerContext::new(shifts, vec![Staff::new("N1", "Med")]).with_rule_parameters(
            RuleParameters {
                max_consecutive_days: 3,
                ..Default::default()
            },
        );
        for (_, result) in engine().generate_all_profiles(&ctx).unwrap() {
            assert_eq!(result.assignment_count(), 3);
            assert_eq!(result.understaffed.len(), 1);
        }
    }

    #[test]
    fn test_context_unknown_rule_is_error() {
        let ctx = two_week_ward().with_rule_parameters(RuleParameters {
            enabled_rules: Some(vec!["rest_hours".into()]),
            ..Default::default()
        });
        assert!(matches!(engine().generate(&ctx), Err(RosterError::Config(_))));
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let ctx = two_week_ward();
        let a = engine().generate(&ctx).unwrap();
        let b = engine().generate(&ctx).unwrap();
        assert_eq!(a.assignments, b.assignments);
    }

    #[test]
    fn test_all_profiles_in_order() {
        let ctx = two_week_ward();
        let runs = engine().generate_all_profiles(&ctx).unwrap();
        let kinds: Vec<ProfileKind> = runs.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, ProfileKind::ALL.to_vec());
        for (_, result) in &runs {
            assert_eq!(result.assignment_count(), 56);
        }
    }

    #[test]
    fn test_run_reports_phases() {
        let ctx = two_week_ward();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let outcome = engine()
            .run_with(&ctx, WeightProfile::fair(), &mut rng)
            .unwrap();
        assert_eq!(outcome.constructed_understaffed, 0);
        assert_eq!(outcome.repair_fixes, 0);
        assert_eq!(outcome.search.iterations, 500);
        assert!(outcome.search.final_penalty <= outcome.search.initial_penalty);
        assert_eq!(outcome.weights, WeightProfile::fair());
    }
}
