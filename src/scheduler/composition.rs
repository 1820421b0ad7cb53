//! Shift composition checks.
//!
//! Supervision and charge coverage are properties of a whole shift, so
//! the per-pairing gate cannot see them. The scheduler asks these checks
//! before every add, removal, or exchange:
//!
//! - a level-1 on any shift needs a level-5 present;
//! - a level-2 on an ICU/ER shift needs a level-4+ present.

use crate::context::SchedulerContext;
use crate::models::{Shift, Staff, CHARGE_MIN_LEVEL, MAX_COMPETENCY_LEVEL};

use super::Roster;

/// Level a critical-care level-2 needs alongside.
pub const SENIOR_LEVEL: u8 = CHARGE_MIN_LEVEL;

/// Whether a set of levels is adequately supervised.
pub fn is_supervised(levels: impl IntoIterator<Item = u8>, critical_care: bool) -> bool {
    let (mut novice, mut junior, mut top) = (false, false, 0u8);
    for level in levels {
        novice |= level == 1;
        junior |= level == 2;
        top = top.max(level);
    }
    (!novice || top >= MAX_COMPETENCY_LEVEL) && (!critical_care || !junior || top >= SENIOR_LEVEL)
}

/// Whether the shift would be supervised after `leaving` goes and
/// `joining` arrives. Unknown occupants are ignored.
pub fn supervised_after(
    shift: &Shift,
    roster: &Roster,
    ctx: &SchedulerContext,
    leaving: Option<&str>,
    joining: Option<&Staff>,
) -> bool {
    let levels = roster
        .occupants(&shift.id)
        .iter()
        .filter(|id| Some(id.as_str()) != leaving)
        .filter_map(|id| ctx.staff_by_id(id))
        .map(|s| s.competency_level)
        .chain(joining.map(|s| s.competency_level));
    is_supervised(levels, shift.is_critical_care())
}

/// Whether `staff` can join without breaking supervision.
#[inline]
pub fn can_join(staff: &Staff, shift: &Shift, roster: &Roster, ctx: &SchedulerContext) -> bool {
    supervised_after(shift, roster, ctx, None, Some(staff))
}

/// Whether `staff_id` can leave without stranding a junior.
#[inline]
pub fn can_leave(staff_id: &str, shift: &Shift, roster: &Roster, ctx: &SchedulerContext) -> bool {
    supervised_after(shift, roster, ctx, Some(staff_id), None)
}

/// Whether `joining` can take `leaving`'s place. A charge slot only
/// passes to someone who can hold charge.
pub fn can_exchange(
    leaving: &str,
    joining: &Staff,
    shift: &Shift,
    roster: &Roster,
    ctx: &SchedulerContext,
) -> bool {
    if roster.charge_holder(&shift.id) == Some(leaving) && !joining.can_take_charge() {
        return false;
    }
    supervised_after(shift, roster, ctx, Some(leaving), Some(joining))
}

/// Charge-required shift with staff target but no charge holder.
pub fn needs_charge(shift: &Shift, roster: &Roster) -> bool {
    shift.requires_charge_nurse && shift.target_headcount() > 0 && !roster.has_charge(&shift.id)
}

/// Whether any occupant is at least `level`.
pub fn has_level(shift: &Shift, roster: &Roster, ctx: &SchedulerContext, level: u8) -> bool {
    roster
        .occupants(&shift.id)
        .iter()
        .filter_map(|id| ctx.staff_by_id(id))
        .any(|s| s.competency_level >= level)
}

/// Non-empty ICU/ER shift without a level-4+.
pub fn needs_senior(shift: &Shift, roster: &Roster, ctx: &SchedulerContext) -> bool {
    shift.is_critical_care()
        && roster.headcount(&shift.id) > 0
        && !has_level(shift, roster, ctx, SENIOR_LEVEL)
}
