//! Local search.
//!
//! Greedy hill climbing over pairwise swaps: pick two drafts on different
//! shifts at random, exchange their staff, keep the exchange only if the
//! weighted soft penalty strictly drops. A swap must be legal both ways:
//!
//! - each person passes the eligibility gate for their new shift, judged
//!   on a state where both have already left their old shifts;
//! - a charge slot passes only to someone who can hold charge;
//! - neither shift loses supervision.
//!
//! Swaps keep every shift's headcount, so the assignment count and the
//! understaffed list never change.

use rand::Rng;
use tracing::{debug, trace};

use crate::context::SchedulerContext;
use crate::eligibility;
use crate::scoring::PenaltyScorer;

use super::composition::can_exchange;
use super::Roster;

/// Smallest penalty drop that counts as an improvement.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Outcome of a search run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchStats {
    /// Swap attempts made.
    pub iterations: usize,
    /// Swaps kept.
    pub accepted: usize,
    /// Weighted soft penalty before the search.
    pub initial_penalty: f64,
    /// Weighted soft penalty after the search.
    pub final_penalty: f64,
}

/// Pairwise-swap hill climber.
#[derive(Debug, Clone)]
pub struct LocalSearch<'a> {
    scorer: &'a PenaltyScorer,
    iterations: usize,
}

impl<'a> LocalSearch<'a> {
    /// Creates a search with the default 500 iterations.
    pub fn new(scorer: &'a PenaltyScorer) -> Self {
        Self {
            scorer,
            iterations: 500,
        }
    }

    /// Sets the iteration budget.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Improves `roster` in place.
    pub fn run<R: Rng>(&self, roster: &mut Roster, ctx: &SchedulerContext, rng: &mut R) -> SearchStats {
        let mut current = self.scorer.total(ctx, roster.assignments());
        let mut stats = SearchStats {
            initial_penalty: current,
            final_penalty: current,
            ..Default::default()
        };
        if roster.len() < 2 {
            return stats;
        }

        for _ in 0..self.iterations {
            stats.iterations += 1;
            let i = rng.random_range(0..roster.len());
            let j = rng.random_range(0..roster.len());
            let Some(candidate) = self.try_swap(roster, ctx, i, j) else {
                continue;
            };
            let total = self.scorer.total(ctx, candidate.assignments());
            if total + IMPROVEMENT_EPSILON < current {
                debug!(event = "move_accepted", from = current, to = total);
                *roster = candidate;
                current = total;
                stats.accepted += 1;
            } else {
                trace!(event = "move_rejected", current, candidate = total);
            }
        }

        stats.final_penalty = current;
        stats
    }

    /// The roster with drafts `i` and `j` exchanging staff, if legal.
    fn try_swap(&self, roster: &Roster, ctx: &SchedulerContext, i: usize, j: usize) -> Option<Roster> {
        let (a, b) = (&roster.assignments()[i], &roster.assignments()[j]);
        if a.shift_id == b.shift_id || a.staff_id == b.staff_id {
            return None;
        }
        let shift_a = ctx.shift_by_id(&a.shift_id)?;
        let shift_b = ctx.shift_by_id(&b.shift_id)?;
        let x = ctx.staff_by_id(&a.staff_id)?;
        let y = ctx.staff_by_id(&b.staff_id)?;

        let state = roster.state();
        if state.is_assigned(&x.id, &shift_b.id) || state.is_assigned(&y.id, &shift_a.id) {
            return None;
        }
        if !can_exchange(&x.id, y, shift_a, roster, ctx)
            || !can_exchange(&y.id, x, shift_b, roster, ctx)
        {
            return None;
        }

        let mut probe = state.clone();
        probe.remove(&x.id, shift_a);
        probe.remove(&y.id, shift_b);
        if !eligibility::is_eligible(y, shift_a, &probe, ctx) {
            return None;
        }
        probe.add(&y.id, shift_a);
        if !eligibility::is_eligible(x, shift_b, &probe, ctx) {
            return None;
        }

        let mut candidate = roster.clone();
        candidate.replace(shift_a, &x.id, y);
        candidate.replace(shift_b, &y.id, x);
        Some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignmentDraft, Shift, ShiftType, Staff, StaffPreferences};
    use crate::scheduler::Repairer;
    use crate::scoring::WeightProfile;
    use chrono::{NaiveDate, NaiveTime};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn shift(id: &str, day: u32, kind: ShiftType, hour: u32, unit: &str) -> Shift {
        Shift::new(
            id,
            NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            kind,
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            12.0,
            unit,
        )
    }

    fn roster(ctx: &SchedulerContext, pairs: &[(&str, &str, bool)]) -> Roster {
        let drafts: Vec<AssignmentDraft> = pairs
            .iter()
            .map(|(sh, st, c)| {
                AssignmentDraft::new(ctx.shift_by_id(sh).unwrap(), ctx.staff_by_id(st).unwrap(), *c)
            })
            .collect();
        Roster::from_assignments(ctx, &drafts)
    }

    fn prefers(kind: ShiftType) -> StaffPreferences {
        StaffPreferences {
            preferred_shift_type: Some(kind),
            ..Default::default()
        }
    }

    #[test]
    fn test_swap_fixes_crossed_preferences() {
        let ctx = SchedulerContext::new(
            vec![
                shift("D", 4, ShiftType::Day, 7, "Med"),
                shift("N", 5, ShiftType::Night, 19, "Med"),
            ],
            vec![
                Staff::new("NIGHT_OWL", "Med").with_preferences(prefers(ShiftType::Night)),
                Staff::new("EARLY_BIRD", "Med").with_preferences(prefers(ShiftType::Day)),
            ],
        );
        let mut r = roster(&ctx, &[("D", "NIGHT_OWL", false), ("N", "EARLY_BIRD", false)]);
        let scorer = PenaltyScorer::new(WeightProfile::uniform());
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let stats = LocalSearch::new(&scorer).run(&mut r, &ctx, &mut rng);

        assert_eq!(stats.accepted, 1);
        assert!((stats.initial_penalty - 10.0).abs() < 1e-10);
        assert!(stats.final_penalty.abs() < 1e-10);
        assert!(r.state().is_assigned("NIGHT_OWL", "N"));
        assert!(r.state().is_assigned("EARLY_BIRD", "D"));
    }

    #[test]
    fn test_charge_slot_stays_with_qualified() {
        let ctx = SchedulerContext::new(
            vec![
                shift("D", 4, ShiftType::Day, 7, "Med").with_charge_required(),
                shift("N", 5, ShiftType::Night, 19, "Med"),
            ],
            vec![
                Staff::new("C", "Med")
                    .with_level(4)
                    .with_charge_qualification()
                    .with_preferences(prefers(ShiftType::Night)),
                Staff::new("R", "Med").with_preferences(prefers(ShiftType::Day)),
            ],
        );
        let mut r = roster(&ctx, &[("D", "C", true), ("N", "R", false)]);
        let before = r.assignments().to_vec();
        let scorer = PenaltyScorer::new(WeightProfile::uniform());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let stats = LocalSearch::new(&scorer).with_iterations(50).run(&mut r, &ctx, &mut rng);

        assert_eq!(stats.accepted, 0);
        assert_eq!(r.assignments(), before.as_slice());
    }

    #[test]
    fn test_never_worsens_and_keeps_shape() {
        let mut shifts = Vec::new();
        for day in 4..=10 {
            shifts.push(shift(&format!("D{day}"), day, ShiftType::Day, 7, "Med").with_required(2));
            shifts.push(shift(&format!("N{day}"), day, ShiftType::Night, 19, "Med").with_required(1));
        }
        let staff: Vec<Staff> = (0..8)
            .map(|i| {
                let kind = if i % 2 == 0 { ShiftType::Day } else { ShiftType::Night };
                Staff::new(format!("S{i}"), "Med")
                    .with_level(2 + (i % 4) as u8)
                    .with_preferences(prefers(kind))
            })
            .collect();
        let ctx = SchedulerContext::new(shifts, staff);
        let scorer = PenaltyScorer::default();

        let built = crate::scheduler::GreedyConstructor::new(&scorer).construct(&ctx);
        let mut r = built.roster;
        let repaired = Repairer::default().repair(&mut r, &ctx);
        let count = r.len();
        let before = scorer.total(&ctx, r.assignments());

        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let stats = LocalSearch::new(&scorer).run(&mut r, &ctx, &mut rng);

        assert_eq!(stats.iterations, 500);
        assert!(stats.final_penalty <= before + 1e-9);
        assert!((scorer.total(&ctx, r.assignments()) - stats.final_penalty).abs() < 1e-9);
        assert_eq!(r.len(), count);
        let after = Repairer::new(0).repair(&mut r, &ctx);
        let ids = |u: &[crate::models::UnderstaffedShift]| {
            u.iter().map(|s| s.shift_id.clone()).collect::<Vec<_>>()
        };
        assert_eq!(ids(&after.understaffed), ids(&repaired.understaffed));
    }

    #[test]
    fn test_same_seed_same_result() {
        let ctx = SchedulerContext::new(
            vec![
                shift("D", 4, ShiftType::Day, 7, "Med"),
                shift("N", 5, ShiftType::Night, 19, "Med"),
            ],
            vec![
                Staff::new("A", "Med").with_preferences(prefers(ShiftType::Night)),
                Staff::new("B", "Med").with_preferences(prefers(ShiftType::Day)),
            ],
        );
        let scorer = PenaltyScorer::default();
        let run = |seed| {
            let mut r = roster(&ctx, &[("D", "A", false), ("N", "B", false)]);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            LocalSearch::new(&scorer).with_iterations(20).run(&mut r, &ctx, &mut rng);
            r.into_assignments()
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn test_tiny_roster_is_noop() {
        let ctx = SchedulerContext::new(
            vec![shift("D", 4, ShiftType::Day, 7, "Med")],
            vec![Staff::new("A", "Med")],
        );
        let mut r = roster(&ctx, &[("D", "A", false)]);
        let scorer = PenaltyScorer::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let stats = LocalSearch::new(&scorer).run(&mut r, &ctx, &mut rng);
        assert_eq!(stats.iterations, 0);
        assert_eq!(r.len(), 1);
    }
}
