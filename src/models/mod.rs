//! Rostering domain models.
//!
//! Provides the core data types for representing a nurse-rostering
//! problem and its solution: who can work (staff), what needs covering
//! (shifts), the policy inputs that shape legality and fairness, and
//! the drafts and reports the engine produces.
//!
//! # Domain Mappings
//!
//! | u-roster | Scheduling theory | Hospital |
//! |----------|-------------------|----------|
//! | Staff | Resource | Nurse / CNA |
//! | Shift | Activity with demand | Day / night block on a unit |
//! | AssignmentDraft | Assignment | Roster entry |
//! | RuleViolation | Violation | Compliance finding |

pub mod calendar;
mod assignment;
mod policy;
mod shift;
mod staff;
mod unit;
mod violation;

pub use assignment::{AssignmentDraft, GenerationResult, ShortageKind, UnderstaffedShift};
pub use policy::{
    CensusBand, LeaveStatus, PublicHoliday, StaffLeave, UnitPolicy, UnitPolicyRecord,
};
pub use shift::{Shift, ShiftType};
pub use staff::{
    EmploymentType, Staff, StaffPreferences, StaffRole, CHARGE_MIN_LEVEL,
    FULL_TIME_WEEKLY_HOURS, MAX_COMPETENCY_LEVEL, MIN_COMPETENCY_LEVEL,
};
pub use unit::is_critical_care_unit;
pub use violation::{RuleCategory, RuleViolation, Severity};
