//! Working roster.
//!
//! Assignment drafts in output order, with the [`SchedulerState`] index
//! and the per-shift charge holder kept in step. Drafts are replaced
//! wholesale on every mutation so derived flags never drift from the
//! pairing they describe.

use std::collections::HashMap;

use crate::context::SchedulerContext;
use crate::models::{AssignmentDraft, Shift, Staff};
use crate::state::SchedulerState;

/// Drafts plus their indexes.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    state: SchedulerState,
    drafts: Vec<AssignmentDraft>,
    charge: HashMap<String, String>,
}

impl Roster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a roster from existing drafts. Drafts naming unknown
    /// shifts or staff, and repeated pairings, are skipped.
    pub fn from_assignments(ctx: &SchedulerContext, assignments: &[AssignmentDraft]) -> Self {
        let mut roster = Self::new();
        for a in assignments {
            let (Some(shift), Some(staff)) =
                (ctx.shift_by_id(&a.shift_id), ctx.staff_by_id(&a.staff_id))
            else {
                continue;
            };
            roster.assign(staff, shift, a.is_charge_nurse);
        }
        roster
    }

    /// The state index.
    #[inline]
    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    /// Drafts in assignment order.
    #[inline]
    pub fn assignments(&self) -> &[AssignmentDraft] {
        &self.drafts
    }

    /// Consumes the roster, returning its drafts.
    pub fn into_assignments(self) -> Vec<AssignmentDraft> {
        self.drafts
    }

    /// Number of drafts.
    #[inline]
    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    /// Whether the roster holds no drafts.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Staff on a shift.
    #[inline]
    pub fn occupants(&self, shift_id: &str) -> &[String] {
        self.state.occupants(shift_id)
    }

    /// Headcount on a shift.
    #[inline]
    pub fn headcount(&self, shift_id: &str) -> usize {
        self.state.occupancy(shift_id)
    }

    /// Charge holder of a shift.
    pub fn charge_holder(&self, shift_id: &str) -> Option<&str> {
        self.charge.get(shift_id).map(String::as_str)
    }

    /// Whether the shift has a charge holder.
    #[inline]
    pub fn has_charge(&self, shift_id: &str) -> bool {
        self.charge.contains_key(shift_id)
    }

    /// Adds a draft. A second charge holder on the same shift is
    /// recorded as a plain assignment. Returns `false` if the pairing
    /// already exists.
    pub fn assign(&mut self, staff: &Staff, shift: &Shift, is_charge: bool) -> bool {
        if !self.state.add(&staff.id, shift) {
            return false;
        }
        let is_charge = is_charge && !self.has_charge(&shift.id);
        if is_charge {
            self.charge.insert(shift.id.clone(), staff.id.clone());
        }
        self.drafts.push(AssignmentDraft::new(shift, staff, is_charge));
        true
    }

    /// Removes a draft, returning it.
    pub fn unassign(&mut self, staff_id: &str, shift: &Shift) -> Option<AssignmentDraft> {
        let pos = self.position(&shift.id, staff_id)?;
        self.state.remove(staff_id, shift);
        let draft = self.drafts.remove(pos);
        if draft.is_charge_nurse {
            self.charge.remove(&shift.id);
        }
        Some(draft)
    }

    /// Makes an existing occupant the shift's charge holder, demoting any
    /// previous holder. Returns `false` if `staff` is not on the shift.
    pub fn set_charge(&mut self, shift: &Shift, staff: &Staff) -> bool {
        let Some(pos) = self.position(&shift.id, &staff.id) else {
            return false;
        };
        if let Some(previous) = self.charge.remove(&shift.id) {
            if let Some(prev_pos) = self.position(&shift.id, &previous) {
                let draft = &self.drafts[prev_pos];
                self.drafts[prev_pos] = AssignmentDraft {
                    is_charge_nurse: false,
                    ..draft.clone()
                };
            }
        }
        self.drafts[pos] = AssignmentDraft::new(shift, staff, true);
        self.charge.insert(shift.id.clone(), staff.id.clone());
        true
    }

    /// Puts `incoming` in `outgoing`'s slot on `shift`, keeping the slot's
    /// position and charge role. Returns `false` if `outgoing` is not on
    /// the shift or `incoming` already is.
    pub fn replace(&mut self, shift: &Shift, outgoing: &str, incoming: &Staff) -> bool {
        if self.state.is_assigned(&incoming.id, &shift.id) {
            return false;
        }
        let Some(pos) = self.position(&shift.id, outgoing) else {
            return false;
        };
        let is_charge = self.drafts[pos].is_charge_nurse;
        self.state.remove(outgoing, shift);
        self.state.add(&incoming.id, shift);
        self.drafts[pos] = AssignmentDraft::new(shift, incoming, is_charge);
        if is_charge {
            self.charge.insert(shift.id.clone(), incoming.id.clone());
        }
        true
    }

    fn position(&self, shift_id: &str, staff_id: &str) -> Option<usize> {
        self.drafts.iter().position(|d| d.is(shift_id, staff_id))
    }
}
