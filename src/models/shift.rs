//! Shift model.
//!
//! A shift is a fixed block of work on one unit with a headcount
//! requirement. Shifts may span midnight; all interval arithmetic goes
//! through [`Shift::start`] and [`Shift::end`] so overnight spans are
//! handled in one place.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::calendar;
use super::unit::is_critical_care_unit;

/// A shift to be staffed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    /// Unique shift identifier.
    pub id: String,
    /// Calendar date the shift starts on.
    pub date: NaiveDate,
    /// Shift classification.
    pub shift_type: ShiftType,
    /// Local start time.
    pub start_time: NaiveTime,
    /// Length in hours (may cross midnight).
    pub duration_hours: f64,
    /// Unit name.
    pub unit: String,
    /// Base headcount requirement.
    pub required_staff_count: u32,
    /// Whether a charge nurse must be designated.
    #[serde(default)]
    pub requires_charge_nurse: bool,
    /// Additional headcount driven by patient acuity.
    #[serde(default)]
    pub acuity_extra_staff: u32,
    /// Whether the shift counts toward staffing-hour totals.
    #[serde(default = "default_true")]
    pub counts_toward_staffing: bool,
    /// Actual patient census, when known.
    #[serde(default)]
    pub actual_census: Option<u32>,
}

/// Shift classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftType {
    Day,
    Night,
    Evening,
    OnCall,
}

fn default_true() -> bool {
    true
}

impl Shift {
    /// Creates a shift with a headcount of one and no charge requirement.
    pub fn new(
        id: impl Into<String>,
        date: NaiveDate,
        shift_type: ShiftType,
        start_time: NaiveTime,
        duration_hours: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            shift_type,
            start_time,
            duration_hours,
            unit: unit.into(),
            required_staff_count: 1,
            requires_charge_nurse: false,
            acuity_extra_staff: 0,
            counts_toward_staffing: true,
            actual_census: None,
        }
    }

    /// Sets the base headcount.
    pub fn with_required(mut self, count: u32) -> Self {
        self.required_staff_count = count;
        self
    }

    /// Requires a charge nurse.
    pub fn with_charge_required(mut self) -> Self {
        self.requires_charge_nurse = true;
        self
    }

    /// Sets the acuity-driven extra headcount.
    pub fn with_acuity_extra(mut self, extra: u32) -> Self {
        self.acuity_extra_staff = extra;
        self
    }

    /// Sets the actual patient census.
    pub fn with_census(mut self, census: u32) -> Self {
        self.actual_census = Some(census);
        self
    }

    /// Excludes the shift from staffing-hour totals.
    pub fn not_counting_toward_staffing(mut self) -> Self {
        self.counts_toward_staffing = false;
        self
    }

    /// Start instant.
    #[inline]
    pub fn start(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    /// End instant; on the following day for overnight shifts.
    pub fn end(&self) -> NaiveDateTime {
        self.start() + self.duration()
    }

    /// Duration as a time delta, rounded to whole minutes.
    pub fn duration(&self) -> Duration {
        Duration::minutes((self.duration_hours * 60.0).round() as i64)
    }

    /// Headcount the constructor fills to: required + acuity extra.
    #[inline]
    pub fn target_headcount(&self) -> u32 {
        self.required_staff_count + self.acuity_extra_staff
    }

    /// Whether the unit is ICU/ER-class.
    #[inline]
    pub fn is_critical_care(&self) -> bool {
        is_critical_care_unit(&self.unit)
    }

    /// Whether the shift starts on a Saturday or Sunday.
    #[inline]
    pub fn is_weekend(&self) -> bool {
        calendar::is_weekend(self.date)
    }

    /// Whether two shifts overlap in time.
    pub fn overlaps(&self, other: &Shift) -> bool {
        self.start() < other.end() && other.start() < self.end()
    }
}
