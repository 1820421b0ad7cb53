//! Repair phase.
//!
//! Re-scans the roster for three defects, most critical shift first:
//! missing charge nurse, missing level-4+ on a staffed ICU/ER shift, and
//! headcount below target. Each defect is attacked with, in order:
//!
//! 1. **Promotion**: an occupant who can hold charge takes it.
//! 2. **Direct assignment**: the least-loaded legal idle candidate joins.
//!    On a full shift a charge or senior candidate takes the place of
//!    the least senior occupant.
//! 3. **Donor swap**: a qualified occupant of a less critical shift moves
//!    over. Leaving their old shift shrinks their rolling windows, which
//!    can make them newly legal. The donor keeps at least one occupant
//!    and its charge nurse, and stays supervised; its freed slot is then
//!    backfilled when possible.
//!
//! A fix can unlock another (a new level-4+ lets a level-2 work
//! elsewhere), so the scan repeats up to a pass ceiling, stopping early
//! when nothing is left or a pass fixes nothing.

use std::cmp::Ordering;

use tracing::debug;

use crate::context::SchedulerContext;
use crate::eligibility;
use crate::models::{Shift, Staff, UnderstaffedShift};

use super::composition::{
    can_join, can_leave, needs_charge, needs_senior, SENIOR_LEVEL,
};
use super::greedy::ShortfallExplainer;
use super::priority::{self, criticality};
use super::Roster;

/// A composition or headcount defect on one shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Defect {
    MissingCharge,
    MissingSenior,
    Shortfall,
}

/// Who can fix a defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Need {
    Charge,
    Senior,
    Any,
}

impl Need {
    fn admits(self, staff: &Staff) -> bool {
        match self {
            Need::Charge => staff.can_take_charge(),
            Need::Senior => staff.competency_level >= SENIOR_LEVEL,
            Need::Any => true,
        }
    }
}

/// Outcome of a repair run.
#[derive(Debug, Clone, Default)]
pub struct RepairReport {
    /// Passes that found defects.
    pub passes: usize,
    /// Committed fixes across all passes.
    pub fixes: usize,
    /// Shifts still below target, in criticality order.
    pub understaffed: Vec<UnderstaffedShift>,
}

/// Bounded multi-pass repairer.
#[derive(Debug, Clone)]
pub struct Repairer {
    max_passes: usize,
    explainer: ShortfallExplainer,
}

impl Default for Repairer {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Repairer {
    /// Creates a repairer running at most `max_passes` passes.
    pub fn new(max_passes: usize) -> Self {
        Self {
            max_passes,
            explainer: ShortfallExplainer::default(),
        }
    }

    /// Sets how surviving shortfalls are explained.
    pub fn with_explainer(mut self, explainer: ShortfallExplainer) -> Self {
        self.explainer = explainer;
        self
    }

    /// Defects in criticality order.
    pub fn scan(roster: &Roster, ctx: &SchedulerContext) -> Vec<(usize, Defect)> {
        let mut out = Vec::new();
        for i in priority::sort_indices(ctx.shifts()) {
            let shift = &ctx.shifts()[i];
            if needs_charge(shift, roster) {
                out.push((i, Defect::MissingCharge));
            }
            if needs_senior(shift, roster, ctx) {
                out.push((i, Defect::MissingSenior));
            }
            if roster.headcount(&shift.id) < shift.target_headcount() as usize {
                out.push((i, Defect::Shortfall));
            }
        }
        out
    }

    /// Repairs `roster` in place.
    pub fn repair(&self, roster: &mut Roster, ctx: &SchedulerContext) -> RepairReport {
        let order = priority::sort_indices(ctx.shifts());
        let mut report = RepairReport::default();

        for pass in 1..=self.max_passes {
            let defects = Self::scan(roster, ctx);
            if defects.is_empty() {
                break;
            }
            report.passes = pass;
            let mut fixed = 0;
            for &(i, defect) in &defects {
                fixed += self.fix(&ctx.shifts()[i], defect, roster, ctx, &order);
            }
            report.fixes += fixed;
            debug!(event = "repair_pass", pass, defects = defects.len(), fixed);
            if fixed == 0 {
                break;
            }
        }

        report.understaffed = order
            .iter()
            .map(|&i| &ctx.shifts()[i])
            .filter(|s| roster.headcount(&s.id) < s.target_headcount() as usize)
            .map(|s| self.explainer.explain(s, roster, ctx))
            .collect();
        report
    }

    fn fix(
        &self,
        shift: &Shift,
        defect: Defect,
        roster: &mut Roster,
        ctx: &SchedulerContext,
        order: &[usize],
    ) -> usize {
        match defect {
            Defect::MissingCharge => {
                // An earlier fix in this pass may have covered it
                if !needs_charge(shift, roster) {
                    return 0;
                }
                let fixed = promote(shift, roster, ctx)
                    || direct(shift, Need::Charge, roster, ctx)
                    || donor_swap(shift, Need::Charge, roster, ctx, order);
                usize::from(fixed)
            }
            Defect::MissingSenior => {
                if !needs_senior(shift, roster, ctx) {
                    return 0;
                }
                let fixed = direct(shift, Need::Senior, roster, ctx)
                    || donor_swap(shift, Need::Senior, roster, ctx, order);
                usize::from(fixed)
            }
            Defect::Shortfall => {
                let target = shift.target_headcount() as usize;
                let mut fixed = 0;
                while roster.headcount(&shift.id) < target {
                    if !(direct(shift, Need::Any, roster, ctx)
                        || donor_swap(shift, Need::Any, roster, ctx, order))
                    {
                        break;
                    }
                    fixed += 1;
                }
                fixed
            }
        }
    }
}

fn promote(shift: &Shift, roster: &mut Roster, ctx: &SchedulerContext) -> bool {
    let best = roster
        .occupants(&shift.id)
        .iter()
        .filter_map(|id| ctx.staff_by_id(id))
        .filter(|s| s.can_take_charge())
        .max_by_key(|s| s.competency_level);
    match best {
        Some(staff) => {
            debug!(event = "repair_fix", strategy = "promote", shift = %shift.id, staff = %staff.id);
            roster.set_charge(shift, staff)
        }
        None => false,
    }
}

/// Legal idle candidates for `need`, least rolling-hour load first.
fn least_loaded<'c>(
    shift: &Shift,
    need: Need,
    roster: &Roster,
    ctx: &'c SchedulerContext,
) -> Option<&'c Staff> {
    let state = roster.state();
    ctx.active_staff()
        .filter(|&s| need.admits(s))
        .filter(|s| !state.is_assigned(&s.id, &shift.id))
        .filter(|s| eligibility::is_eligible(s, shift, state, ctx))
        .filter(|s| can_join(s, shift, roster, ctx))
        .map(|s| (s, state.max_rolling_hours_containing(&s.id, shift.date)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .map(|(s, _)| s)
}

fn takes_charge(staff: &Staff, shift: &Shift, roster: &Roster) -> bool {
    needs_charge(shift, roster) && staff.can_take_charge()
}

fn direct(shift: &Shift, need: Need, roster: &mut Roster, ctx: &SchedulerContext) -> bool {
    if roster.headcount(&shift.id) < shift.target_headcount() as usize {
        let Some(staff) = least_loaded(shift, need, roster, ctx) else {
            return false;
        };
        debug!(event = "repair_fix", strategy = "direct", shift = %shift.id, staff = %staff.id);
        let charge = takes_charge(staff, shift, roster);
        return roster.assign(staff, shift, charge);
    }
    if need == Need::Any {
        return false;
    }

    // Full shift: trade the least senior non-charge occupant
    let mut occupants: Vec<&Staff> = roster
        .occupants(&shift.id)
        .iter()
        .filter(|id| roster.charge_holder(&shift.id) != Some(id.as_str()))
        .filter_map(|id| ctx.staff_by_id(id))
        .filter(|s| !need.admits(s))
        .collect();
    occupants.sort_by_key(|s| s.competency_level);

    for outgoing in occupants {
        let mut trial = roster.clone();
        trial.unassign(&outgoing.id, shift);
        let Some(staff) = least_loaded(shift, need, &trial, ctx) else {
            continue;
        };
        debug!(
            event = "repair_fix",
            strategy = "displace",
            shift = %shift.id,
            staff = %staff.id,
            displaced = %outgoing.id
        );
        let charge = takes_charge(staff, shift, &trial);
        trial.assign(staff, shift, charge);
        *roster = trial;
        return true;
    }
    false
}

fn donor_swap(
    shift: &Shift,
    need: Need,
    roster: &mut Roster,
    ctx: &SchedulerContext,
    order: &[usize],
) -> bool {
    if roster.headcount(&shift.id) >= shift.target_headcount() as usize {
        return false;
    }
    let rank = criticality(shift);

    // Least critical donors first
    for &j in order.iter().rev() {
        let donor = &ctx.shifts()[j];
        if criticality(donor) >= rank || roster.headcount(&donor.id) < 2 {
            continue;
        }
        for staff_id in roster.occupants(&donor.id).to_vec() {
            let Some(staff) = ctx.staff_by_id(&staff_id) else {
                continue;
            };
            if !need.admits(staff)
                || roster.state().is_assigned(&staff.id, &shift.id)
                || roster.charge_holder(&donor.id) == Some(staff_id.as_str())
                || !can_leave(&staff_id, donor, roster, ctx)
            {
                continue;
            }
            let mut trial = roster.clone();
            trial.unassign(&staff_id, donor);
            if !eligibility::is_eligible(staff, shift, trial.state(), ctx)
                || !can_join(staff, shift, &trial, ctx)
            {
                continue;
            }
            let charge = takes_charge(staff, shift, &trial);
            trial.assign(staff, shift, charge);
            *roster = trial;
            debug!(
                event = "repair_fix",
                strategy = "donor_swap",
                shift = %shift.id,
                donor = %donor.id,
                staff = %staff.id
            );
            backfill(donor, roster, ctx);
            return true;
        }
    }
    false
}

fn backfill(donor: &Shift, roster: &mut Roster, ctx: &SchedulerContext) {
    if roster.headcount(&donor.id) >= donor.target_headcount() as usize {
        return;
    }
    if let Some(staff) = least_loaded(donor, Need::Any, roster, ctx) {
        debug!(event = "repair_fix", strategy = "backfill", shift = %donor.id, staff = %staff.id);
        let charge = takes_charge(staff, donor, roster);
        roster.assign(staff, donor, charge);
    }
}
