//! Roster (solution) model.
//!
//! A roster is a list of shift–staff assignment drafts plus a report of
//! the shifts that could not be brought up to headcount. Drafts carry
//! derived flags (charge, overtime, float) and are always rebuilt as a
//! whole when their staff member changes, so the flags never drift from
//! the pairing they describe.
//!
//! # Reference
//! Burke et al. (2004), "The State of the Art of Nurse Rostering", §3

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Shift, Staff};

/// A shift–staff pairing with derived flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentDraft {
    /// Assigned shift ID.
    pub shift_id: String,
    /// Assigned staff ID.
    pub staff_id: String,
    /// Holds the shift's charge role.
    pub is_charge_nurse: bool,
    /// Pushes the staff member's calendar week past the overtime threshold.
    pub is_overtime: bool,
    /// Staff member works outside their home unit.
    pub is_float: bool,
    /// Home unit the staff member floated from.
    pub float_from_unit: Option<String>,
}

/// A shift that ended below its target headcount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderstaffedShift {
    /// Shift ID.
    pub shift_id: String,
    /// Shift date (denormalized for reporting).
    pub date: chrono::NaiveDate,
    /// Shift unit (denormalized for reporting).
    pub unit: String,
    /// Target headcount.
    pub required: u32,
    /// Headcount actually assigned.
    pub assigned: u32,
    /// Top rejection reasons, most frequent first, de-duplicated.
    pub reasons: Vec<String>,
    /// Why the shortfall could not be closed.
    pub shortage: ShortageKind,
}

/// Classification of an unfilled position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortageKind {
    /// Nobody on the roster could ever work this shift (leave,
    /// availability, competency, inactive).
    GenuineShortage,
    /// Qualified staff exist but are all blocked by workload rules
    /// (rest, hours, consecutive days, overlap, on-call caps) or shift
    /// composition.
    CandidateScarcity,
}

/// Output of one generation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Final assignment drafts.
    pub assignments: Vec<AssignmentDraft>,
    /// Shifts below target headcount after all phases.
    pub understaffed: Vec<UnderstaffedShift>,
}

impl AssignmentDraft {
    /// Builds a draft for `staff` on `shift`, deriving the float flags.
    pub fn new(shift: &Shift, staff: &Staff, is_charge_nurse: bool) -> Self {
        let is_float = staff.home_unit != shift.unit;
        Self {
            shift_id: shift.id.clone(),
            staff_id: staff.id.clone(),
            is_charge_nurse,
            is_overtime: false,
            is_float,
            float_from_unit: is_float.then(|| staff.home_unit.clone()),
        }
    }

    /// Builds a draft and derives the overtime flag from the hours the
    /// staff member already works earlier in the same calendar week.
    pub fn derive(
        shift: &Shift,
        staff: &Staff,
        is_charge_nurse: bool,
        prior_week_hours: f64,
        overtime_threshold: f64,
    ) -> Self {
        Self {
            is_overtime: prior_week_hours + shift.duration_hours > overtime_threshold,
            ..Self::new(shift, staff, is_charge_nurse)
        }
    }

    /// Whether the draft pairs `staff_id` with `shift_id`.
    #[inline]
    pub fn is(&self, shift_id: &str, staff_id: &str) -> bool {
        self.shift_id == shift_id && self.staff_id == staff_id
    }
}

impl UnderstaffedShift {
    /// Unfilled positions.
    #[inline]
    pub fn shortfall(&self) -> u32 {
        self.required.saturating_sub(self.assigned)
    }
}

impl GenerationResult {
    /// Creates an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// Whether every shift reached its target headcount.
    pub fn is_fully_staffed(&self) -> bool {
        self.understaffed.is_empty()
    }

    /// Returns all assignments for a given shift.
    pub fn assignments_for_shift(&self, shift_id: &str) -> Vec<&AssignmentDraft> {
        self.assignments
            .iter()
            .filter(|a| a.shift_id == shift_id)
            .collect()
    }

    /// Returns all assignments for a given staff member.
    pub fn assignments_for_staff(&self, staff_id: &str) -> Vec<&AssignmentDraft> {
        self.assignments
            .iter()
            .filter(|a| a.staff_id == staff_id)
            .collect()
    }

    /// Assignment count per staff member.
    pub fn load_by_staff(&self) -> HashMap<String, usize> {
        let mut load: HashMap<String, usize> = HashMap::new();
        for a in &self.assignments {
            *load.entry(a.staff_id.clone()).or_insert(0) += 1;
        }
        load
    }

    /// Total unfilled positions across all understaffed shifts.
    pub fn total_shortfall(&self) -> u32 {
        self.understaffed.iter().map(|u| u.shortfall()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShiftType;
    use chrono::{NaiveDate, NaiveTime};

    fn shift(id: &str, unit: &str) -> Shift {
        Shift::new(
            id,
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            ShiftType::Day,
            NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            12.0,
            unit,
        )
    }

    #[test]
    fn test_float_flags_derived() {
        let s = Staff::new("N1", "MedSurg");
        let home = AssignmentDraft::new(&shift("S1", "MedSurg"), &s, false);
        assert!(!home.is_float);
        assert!(home.float_from_unit.is_none());

        let away = AssignmentDraft::new(&shift("S2", "ICU"), &s, true);
        assert!(away.is_float);
        assert_eq!(away.float_from_unit.as_deref(), Some("MedSurg"));
        assert!(away.is_charge_nurse);
    }

    #[test]
    fn test_overtime_flag() {
        let s = Staff::new("N1", "U");
        let sh = shift("S1", "U");
        assert!(!AssignmentDraft::derive(&sh, &s, false, 28.0, 40.0).is_overtime);
        assert!(AssignmentDraft::derive(&sh, &s, false, 36.0, 40.0).is_overtime);
    }

    #[test]
    fn test_result_queries() {
        let a = Staff::new("A", "U");
        let b = Staff::new("B", "U");
        let s1 = shift("S1", "U");
        let s2 = shift("S2", "U");
        let mut r = GenerationResult::new();
        r.assignments.push(AssignmentDraft::new(&s1, &a, false));
        r.assignments.push(AssignmentDraft::new(&s2, &a, false));
        r.assignments.push(AssignmentDraft::new(&s1, &b, false));

        assert_eq!(r.assignment_count(), 3);
        assert_eq!(r.assignments_for_shift("S1").len(), 2);
        assert_eq!(r.assignments_for_staff("A").len(), 2);
        assert_eq!(r.load_by_staff()["B"], 1);
        assert!(r.is_fully_staffed());
    }

    #[test]
    fn test_shortfall() {
        let u = UnderstaffedShift {
            shift_id: "S1".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            unit: "U".into(),
            required: 3,
            assigned: 1,
            reasons: vec![],
            shortage: ShortageKind::CandidateScarcity,
        };
        assert_eq!(u.shortfall(), 2);
    }
}
