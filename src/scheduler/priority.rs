//! Shift difficulty ordering.
//!
//! Shifts are filled least-substitutable first, while the candidate pool
//! is least depleted. Criteria apply in sequence; a later criterion only
//! breaks ties left by the earlier ones.
//!
//! | Rank | Shift |
//! |------|-------|
//! | 5 | ICU/ER requiring a charge nurse |
//! | 4 | ICU/ER |
//! | 3 | Night |
//! | 2 | Day, evening |
//! | 1 | On-call |
//!
//! Ties: date, then start time, then shift ID.
//!
//! # Reference
//! Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use std::cmp::Ordering;

use crate::models::{Shift, ShiftType};

/// Criticality rank of a shift; higher is harder to cover.
pub fn criticality(shift: &Shift) -> u8 {
    if shift.is_critical_care() {
        if shift.requires_charge_nurse {
            5
        } else {
            4
        }
    } else {
        match shift.shift_type {
            ShiftType::Night => 3,
            ShiftType::Day | ShiftType::Evening => 2,
            ShiftType::OnCall => 1,
        }
    }
}

/// Sequential comparison: most critical first, then earliest.
pub fn compare(a: &Shift, b: &Shift) -> Ordering {
    criticality(b)
        .cmp(&criticality(a))
        .then_with(|| a.date.cmp(&b.date))
        .then_with(|| a.start_time.cmp(&b.start_time))
        .then_with(|| a.id.cmp(&b.id))
}

/// Indices into `shifts` in fill order.
pub fn sort_indices(shifts: &[Shift]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..shifts.len()).collect();
    indices.sort_by(|&a, &b| compare(&shifts[a], &shifts[b]));
    indices
}
