//! Hard-rule eligibility gate.
//!
//! Answers "can this staff member legally work this shift, given what
//! is already scheduled". Construction, repair, and local search all ask
//! this one gate, so a pairing legal in one phase is legal in every
//! phase.
//!
//! # Check order
//!
//! Checks run cheapest-first and [`check`] stops at the first failure:
//!
//! | # | Check | Kind |
//! |---|-------|------|
//! | 0 | Active | static |
//! | 1 | Approved leave | static |
//! | 2 | Per-diem availability | static |
//! | 3 | Critical-care competency floor | static |
//! | 4 | Time overlap | workload |
//! | 5 | Rest before and after | workload |
//! | 6 | Consecutive days | workload |
//! | 7 | Rolling 7-day hours | workload |
//! | 8 | On-call weekly / weekend caps | workload |
//!
//! Static failures hold no matter what else is scheduled; workload
//! failures depend on the current state and can clear when assignments
//! move.
//!
//! Shift composition (supervision, charge) is a property of the whole
//! shift rather than of one pairing and is checked by the scheduler.

use chrono::NaiveDate;
use thiserror::Error;

use crate::context::SchedulerContext;
use crate::models::calendar::{hours_between, weekend_id};
use crate::models::{Shift, ShiftType, Staff};
use crate::state::SchedulerState;

/// Why a pairing is illegal.
///
/// Display strings carry no staff or shift names so reasons aggregate
/// across candidates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("inactive")]
    Inactive,

    #[error("on approved leave")]
    OnLeave,

    #[error("not marked available (per diem)")]
    NotAvailable,

    #[error("competency below level {0} for critical care")]
    InsufficientCompetency(u8),

    #[error("overlaps an existing assignment")]
    Overlap,

    #[error("less than {0}h rest between shifts")]
    InsufficientRest(f64),

    #[error("would exceed {0} consecutive days")]
    ConsecutiveDays(u32),

    #[error("would exceed {0}h in a rolling 7-day window")]
    RollingHours(f64),

    #[error("on-call weekly limit reached")]
    OnCallWeekly,

    #[error("on-call weekend limit reached for the month")]
    OnCallWeekend,
}

impl Rejection {
    /// Whether the failure is independent of the current state.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            Rejection::Inactive
                | Rejection::OnLeave
                | Rejection::NotAvailable
                | Rejection::InsufficientCompetency(_)
        )
    }
}

struct Collector {
    found: Vec<Rejection>,
    exhaustive: bool,
}

impl Collector {
    /// Records a failure; returns `true` when checking should stop.
    fn push(&mut self, rejection: Rejection) -> bool {
        self.found.push(rejection);
        !self.exhaustive
    }
}

/// Checks a pairing, stopping at the first failure.
pub fn check(
    staff: &Staff,
    shift: &Shift,
    state: &SchedulerState,
    ctx: &SchedulerContext,
) -> Result<(), Rejection> {
    match run_checks(staff, shift, state, ctx, false).pop() {
        Some(rejection) => Err(rejection),
        None => Ok(()),
    }
}

/// Whether the pairing passes every hard check.
#[inline]
pub fn is_eligible(
    staff: &Staff,
    shift: &Shift,
    state: &SchedulerState,
    ctx: &SchedulerContext,
) -> bool {
    check(staff, shift, state, ctx).is_ok()
}

/// Every failing check, in check order.
pub fn rejections(
    staff: &Staff,
    shift: &Shift,
    state: &SchedulerState,
    ctx: &SchedulerContext,
) -> Vec<Rejection> {
    run_checks(staff, shift, state, ctx, true)
}

/// Every failing check as a human-readable reason.
pub fn rejection_reasons(
    staff: &Staff,
    shift: &Shift,
    state: &SchedulerState,
    ctx: &SchedulerContext,
) -> Vec<String> {
    rejections(staff, shift, state, ctx)
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Checks 0–3 only: whether the pairing could ever be legal.
pub fn static_check(staff: &Staff, shift: &Shift, ctx: &SchedulerContext) -> Result<(), Rejection> {
    let mut c = Collector {
        found: Vec::new(),
        exhaustive: false,
    };
    check_static(staff, shift, ctx, &mut c);
    match c.found.pop() {
        Some(rejection) => Err(rejection),
        None => Ok(()),
    }
}

fn run_checks(
    staff: &Staff,
    shift: &Shift,
    state: &SchedulerState,
    ctx: &SchedulerContext,
    exhaustive: bool,
) -> Vec<Rejection> {
    let mut c = Collector {
        found: Vec::new(),
        exhaustive,
    };
    if check_static(staff, shift, ctx, &mut c) {
        return c.found;
    }
    check_workload(staff, shift, state, ctx, &mut c);
    c.found
}

/// Returns `true` if the collector asked to stop.
fn check_static(staff: &Staff, shift: &Shift, ctx: &SchedulerContext, c: &mut Collector) -> bool {
    if !staff.active && c.push(Rejection::Inactive) {
        return true;
    }
    if ctx.is_on_leave(&staff.id, shift.date) && c.push(Rejection::OnLeave) {
        return true;
    }
    if staff.is_per_diem()
        && !ctx.is_available(&staff.id, shift.date)
        && c.push(Rejection::NotAvailable)
    {
        return true;
    }
    let floor = ctx.params().min_critical_care_level;
    if shift.is_critical_care()
        && staff.competency_level < floor
        && c.push(Rejection::InsufficientCompetency(floor))
    {
        return true;
    }
    false
}

fn check_workload(
    staff: &Staff,
    shift: &Shift,
    state: &SchedulerState,
    ctx: &SchedulerContext,
    c: &mut Collector,
) -> bool {
    let params = ctx.params();
    let (start, end) = (shift.start(), shift.end());

    if state.overlaps(&staff.id, start, end) && c.push(Rejection::Overlap) {
        return true;
    }

    let rest_before = state
        .last_shift_end_before(&staff.id, start)
        .is_some_and(|prev_end| hours_between(prev_end, start) < params.min_rest_hours);
    let rest_after = state
        .next_shift_start_at_or_after(&staff.id, end)
        .is_some_and(|next_start| hours_between(end, next_start) < params.min_rest_hours);
    if (rest_before || rest_after) && c.push(Rejection::InsufficientRest(params.min_rest_hours)) {
        return true;
    }

    let limit = consecutive_limit(staff, params.max_consecutive_days);
    if state.would_exceed_consecutive(&staff.id, shift.date, limit)
        && c.push(Rejection::ConsecutiveDays(limit))
    {
        return true;
    }

    let peak = state.max_rolling_hours_containing(&staff.id, shift.date);
    if peak + shift.duration_hours > params.max_rolling_hours
        && c.push(Rejection::RollingHours(params.max_rolling_hours))
    {
        return true;
    }

    if shift.shift_type == ShiftType::OnCall {
        return check_on_call(&staff.id, shift.date, state, ctx, c);
    }
    false
}

fn check_on_call(
    staff_id: &str,
    date: NaiveDate,
    state: &SchedulerState,
    ctx: &SchedulerContext,
    c: &mut Collector,
) -> bool {
    let policy = ctx.policy();
    if state.on_call_count_in_week(staff_id, date) >= policy.max_on_call_per_week
        && c.push(Rejection::OnCallWeekly)
    {
        return true;
    }
    if let Some(weekend) = weekend_id(date) {
        let new_weekend = !state.has_on_call_weekend(staff_id, weekend);
        if new_weekend
            && state.on_call_weekends_in_month(staff_id, date)
                >= policy.max_on_call_weekends_per_month
            && c.push(Rejection::OnCallWeekend)
        {
            return true;
        }
    }
    false
}

/// Personal consecutive-day cap, never above the hard cap.
pub fn consecutive_limit(staff: &Staff, hard_cap: u32) -> u32 {
    staff
        .preferred_max_consecutive_days()
        .map_or(hard_cap, |pref| pref.min(hard_cap))
}
