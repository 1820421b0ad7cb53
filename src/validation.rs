//! Input validation for rostering problems.
//!
//! Checks structural integrity of the scheduler context before a run.
//! Detects:
//! - Duplicate staff or shift IDs
//! - Competency levels outside 1–5 and implausible FTEs
//! - Shifts with non-positive duration
//! - Leave and availability records for unknown staff
//! - Inverted date intervals
//!
//! Only these structural defects stop a run. Anything the engine can
//! route around (an unfillable shift, a missing lookup inside an
//! assignment list) is reported as data instead.

use std::collections::HashSet;

use crate::context::SchedulerContext;
use crate::models::{MAX_COMPETENCY_LEVEL, MIN_COMPETENCY_LEVEL};

/// Largest FTE accepted (allows 1.5× full time for agency contracts).
const MAX_FTE: f64 = 1.5;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A staff record has out-of-range attributes.
    InvalidStaff,
    /// A shift has a non-positive or non-finite duration.
    InvalidShift,
    /// A leave or availability record names an unknown staff member.
    UnknownStaffReference,
    /// An interval ends before it starts.
    InvertedInterval,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a scheduler context.
///
/// Checks:
/// 1. No duplicate staff IDs
/// 2. No duplicate shift IDs
/// 3. Competency levels within 1–5, FTE within (0, 1.5]
/// 4. Shift durations positive and finite
/// 5. Leave and availability reference existing staff
/// 6. Leave intervals and schedule bounds are not inverted
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_context(ctx: &SchedulerContext) -> ValidationResult {
    let mut errors = Vec::new();

    let mut staff_ids = HashSet::new();
    for s in ctx.staff() {
        if !staff_ids.insert(s.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate staff ID: {}", s.id),
            ));
        }
        if !(MIN_COMPETENCY_LEVEL..=MAX_COMPETENCY_LEVEL).contains(&s.competency_level) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidStaff,
                format!(
                    "Staff '{}' has competency level {} (expected 1-5)",
                    s.id, s.competency_level
                ),
            ));
        }
        if !(s.fte > 0.0 && s.fte <= MAX_FTE) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidStaff,
                format!("Staff '{}' has FTE {} (expected 0 < FTE <= {MAX_FTE})", s.id, s.fte),
            ));
        }
    }

    let mut shift_ids = HashSet::new();
    for sh in ctx.shifts() {
        if !shift_ids.insert(sh.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate shift ID: {}", sh.id),
            ));
        }
        if !(sh.duration_hours.is_finite() && sh.duration_hours > 0.0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidShift,
                format!("Shift '{}' has duration {}h", sh.id, sh.duration_hours),
            ));
        }
    }

    for leave in ctx.all_leaves() {
        if !staff_ids.contains(leave.staff_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownStaffReference,
                format!("Leave references unknown staff '{}'", leave.staff_id),
            ));
        }
        if leave.end_date < leave.start_date {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvertedInterval,
                format!(
                    "Leave for '{}' ends ({}) before it starts ({})",
                    leave.staff_id, leave.end_date, leave.start_date
                ),
            ));
        }
    }

    for staff_id in ctx.availability_staff_ids() {
        if !staff_ids.contains(staff_id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownStaffReference,
                format!("Availability references unknown staff '{staff_id}'"),
            ));
        }
    }

    if let (Some(start), Some(end)) = (ctx.start_date, ctx.end_date) {
        if end < start {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvertedInterval,
                format!("Schedule period ends ({end}) before it starts ({start})"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Shift, ShiftType, Staff, StaffLeave};
    use chrono::{NaiveDate, NaiveTime};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn shift(id: &str, hours: f64) -> Shift {
        Shift::new(
            id,
            d(4),
            ShiftType::Day,
            NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            hours,
            "MedSurg",
        )
    }

    fn sample_context() -> SchedulerContext {
        SchedulerContext::new(
            vec![shift("S1", 12.0), shift("S2", 8.0)],
            vec![Staff::new("N1", "MedSurg"), Staff::new("N2", "MedSurg")],
        )
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_context(&sample_context()).is_ok());
    }

    #[test]
    fn test_duplicate_staff_id() {
        let ctx = SchedulerContext::new(
            vec![],
            vec![Staff::new("N1", "U"), Staff::new("N1", "U")],
        );
        let errors = validate_context(&ctx).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("staff")));
    }

    #[test]
    fn test_duplicate_shift_id() {
        let ctx = SchedulerContext::new(vec![shift("S1", 8.0), shift("S1", 8.0)], vec![]);
        let errors = validate_context(&ctx).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("shift")));
    }

    #[test]
    fn test_invalid_staff_attributes() {
        let mut bad_level = Staff::new("N1", "U");
        bad_level.competency_level = 0;
        let bad_fte = Staff::new("N2", "U").with_fte(0.0);
        let ctx = SchedulerContext::new(vec![], vec![bad_level, bad_fte]);

        let errors = validate_context(&ctx).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::InvalidStaff)
                .count(),
            2
        );
    }

    #[test]
    fn test_zero_duration_shift() {
        let ctx = SchedulerContext::new(vec![shift("S1", 0.0)], vec![]);
        let errors = validate_context(&ctx).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidShift));
    }

    #[test]
    fn test_unknown_staff_reference() {
        let ctx = sample_context()
            .with_leave(StaffLeave::approved("GHOST", d(4), d(5)))
            .with_availability("NOBODY", [d(4)]);
        let errors = validate_context(&ctx).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::UnknownStaffReference)
                .count(),
            2
        );
    }

    #[test]
    fn test_inverted_intervals() {
        let ctx = sample_context()
            .with_leave(StaffLeave::approved("N1", d(9), d(4)))
            .with_period(d(20), d(1));
        let errors = validate_context(&ctx).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::InvertedInterval)
                .count(),
            2
        );
    }

    #[test]
    fn test_empty_context_is_valid() {
        let ctx = SchedulerContext::new(vec![], vec![]);
        assert!(validate_context(&ctx).is_ok());
    }
}
