//! Scheduler context: the read-only input to one generation run.
//!
//! An external collaborator assembles shifts, the staff roster, leave,
//! per-diem availability, unit policy, and holidays. The context builds
//! its lookup indexes and resolves the unit policy once, at build time,
//! so every component reads the same fully-resolved values.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::RuleParameters;
use crate::models::{
    CensusBand, PublicHoliday, Shift, Staff, StaffLeave, UnitPolicy, UnitPolicyRecord,
};

/// Read-only input to the engine.
///
/// Construct with [`SchedulerContext::new`] and the `with_*` builders;
/// indexes are kept in sync by the builders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ContextInput", into = "ContextInput")]
pub struct SchedulerContext {
    /// Schedule identifier (reporting only).
    pub schedule_id: String,
    /// First date of the schedule period (inclusive).
    pub start_date: Option<NaiveDate>,
    /// Last date of the schedule period (inclusive).
    pub end_date: Option<NaiveDate>,
    shifts: Vec<Shift>,
    staff: Vec<Staff>,
    staff_index: HashMap<String, usize>,
    shift_index: HashMap<String, usize>,
    availability: HashMap<String, HashSet<NaiveDate>>,
    leaves: HashMap<String, Vec<StaffLeave>>,
    policy_record: Option<UnitPolicyRecord>,
    policy: UnitPolicy,
    census_bands: Vec<CensusBand>,
    holidays: BTreeMap<NaiveDate, PublicHoliday>,
    prior_holiday_counts: HashMap<String, u32>,
    params: RuleParameters,
}

/// Serialized shape of a context, as supplied by upstream collaborators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextInput {
    pub schedule_id: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub shifts: Vec<Shift>,
    pub staff: Vec<Staff>,
    /// Per-diem availability: staff ID → available dates.
    pub availability: HashMap<String, Vec<NaiveDate>>,
    pub leaves: Vec<StaffLeave>,
    pub unit_policy: Option<UnitPolicyRecord>,
    pub census_bands: Vec<CensusBand>,
    pub holidays: Vec<PublicHoliday>,
    /// Holidays already worked this year before the schedule period.
    pub prior_holiday_counts: HashMap<String, u32>,
    pub rule_parameters: RuleParameters,
}

impl SchedulerContext {
    /// Creates a context over shifts and staff with default policy.
    pub fn new(shifts: Vec<Shift>, staff: Vec<Staff>) -> Self {
        let mut ctx = Self {
            schedule_id: String::new(),
            start_date: None,
            end_date: None,
            shifts,
            staff,
            staff_index: HashMap::new(),
            shift_index: HashMap::new(),
            availability: HashMap::new(),
            leaves: HashMap::new(),
            policy_record: None,
            policy: UnitPolicy::default(),
            census_bands: Vec::new(),
            holidays: BTreeMap::new(),
            prior_holiday_counts: HashMap::new(),
            params: RuleParameters::default(),
        };
        ctx.reindex();
        ctx
    }

    /// Sets the schedule identifier.
    pub fn with_schedule_id(mut self, id: impl Into<String>) -> Self {
        self.schedule_id = id.into();
        self
    }

    /// Sets the reporting date bounds.
    pub fn with_period(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    /// Records per-diem availability for one staff member.
    pub fn with_availability(
        mut self,
        staff_id: impl Into<String>,
        dates: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        self.availability
            .entry(staff_id.into())
            .or_default()
            .extend(dates);
        self
    }

    /// Adds a leave interval.
    pub fn with_leave(mut self, leave: StaffLeave) -> Self {
        self.leaves
            .entry(leave.staff_id.clone())
            .or_default()
            .push(leave);
        self
    }

    /// Sets the unit policy record; missing fields fall back to defaults.
    pub fn with_unit_policy(mut self, record: UnitPolicyRecord) -> Self {
        self.policy = UnitPolicy::resolve(Some(&record));
        self.policy_record = Some(record);
        self
    }

    /// Adds a census band.
    pub fn with_census_band(mut self, band: CensusBand) -> Self {
        self.census_bands.push(band);
        self
    }

    /// Adds a public holiday.
    pub fn with_holiday(mut self, holiday: PublicHoliday) -> Self {
        self.holidays.insert(holiday.date, holiday);
        self
    }

    /// Sets a staff member's holiday count earlier in the year.
    pub fn with_prior_holidays(mut self, staff_id: impl Into<String>, count: u32) -> Self {
        self.prior_holiday_counts.insert(staff_id.into(), count);
        self
    }

    /// Merges the rule parameter bag.
    pub fn with_rule_parameters(mut self, params: RuleParameters) -> Self {
        self.params = params;
        self
    }

    fn reindex(&mut self) {
        // First occurrence wins; duplicates are reported by validation.
        self.staff_index.clear();
        for (i, s) in self.staff.iter().enumerate() {
            self.staff_index.entry(s.id.clone()).or_insert(i);
        }
        self.shift_index.clear();
        for (i, s) in self.shifts.iter().enumerate() {
            self.shift_index.entry(s.id.clone()).or_insert(i);
        }
    }

    /// All shifts, in input order.
    #[inline]
    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }

    /// Full staff roster, in input order.
    #[inline]
    pub fn staff(&self) -> &[Staff] {
        &self.staff
    }

    /// Active staff only.
    pub fn active_staff(&self) -> impl Iterator<Item = &Staff> {
        self.staff.iter().filter(|s| s.active)
    }

    /// Staff lookup by ID.
    pub fn staff_by_id(&self, id: &str) -> Option<&Staff> {
        self.staff_index.get(id).map(|&i| &self.staff[i])
    }

    /// Shift lookup by ID.
    pub fn shift_by_id(&self, id: &str) -> Option<&Shift> {
        self.shift_index.get(id).map(|&i| &self.shifts[i])
    }

    /// Resolved unit policy.
    #[inline]
    pub fn policy(&self) -> &UnitPolicy {
        &self.policy
    }

    /// Rule parameter bag.
    #[inline]
    pub fn params(&self) -> &RuleParameters {
        &self.params
    }

    /// Census bands.
    #[inline]
    pub fn census_bands(&self) -> &[CensusBand] {
        &self.census_bands
    }

    /// Band covering a shift's actual census, if census is known.
    pub fn census_band_for(&self, shift: &Shift) -> Option<&CensusBand> {
        let census = shift.actual_census?;
        // Unit-specific bands take precedence over global ones.
        self.census_bands
            .iter()
            .filter(|b| b.matches(&shift.unit, census))
            .max_by_key(|b| b.unit.is_some())
    }

    /// Whether a per-diem staff member marked `date` available.
    pub fn is_available(&self, staff_id: &str, date: NaiveDate) -> bool {
        self.availability
            .get(staff_id)
            .is_some_and(|dates| dates.contains(&date))
    }

    /// Whether approved leave covers `date`.
    pub fn is_on_leave(&self, staff_id: &str, date: NaiveDate) -> bool {
        self.leaves
            .get(staff_id)
            .is_some_and(|ls| ls.iter().any(|l| l.blocks(date)))
    }

    /// Leave records for a staff member.
    pub fn leaves_for(&self, staff_id: &str) -> &[StaffLeave] {
        self.leaves.get(staff_id).map_or(&[], Vec::as_slice)
    }

    /// Staff IDs with availability records.
    pub fn availability_staff_ids(&self) -> impl Iterator<Item = &str> {
        self.availability.keys().map(String::as_str)
    }

    /// All leave records.
    pub fn all_leaves(&self) -> impl Iterator<Item = &StaffLeave> {
        self.leaves.values().flatten()
    }

    /// Holiday on `date`, if any.
    pub fn holiday_on(&self, date: NaiveDate) -> Option<&PublicHoliday> {
        self.holidays.get(&date)
    }

    /// All holidays in date order.
    pub fn holidays(&self) -> impl Iterator<Item = &PublicHoliday> {
        self.holidays.values()
    }

    /// Holidays worked earlier in the year.
    pub fn prior_holiday_count(&self, staff_id: &str) -> u32 {
        self.prior_holiday_counts.get(staff_id).copied().unwrap_or(0)
    }
}

impl From<ContextInput> for SchedulerContext {
    fn from(input: ContextInput) -> Self {
        let mut ctx = SchedulerContext::new(input.shifts, input.staff)
            .with_schedule_id(input.schedule_id)
            .with_rule_parameters(input.rule_parameters);
        ctx.start_date = input.start_date;
        ctx.end_date = input.end_date;
        if let Some(record) = input.unit_policy {
            ctx = ctx.with_unit_policy(record);
        }
        for (staff_id, dates) in input.availability {
            ctx = ctx.with_availability(staff_id, dates);
        }
        for leave in input.leaves {
            ctx = ctx.with_leave(leave);
        }
        for band in input.census_bands {
            ctx = ctx.with_census_band(band);
        }
        for holiday in input.holidays {
            ctx = ctx.with_holiday(holiday);
        }
        ctx.prior_holiday_counts = input.prior_holiday_counts;
        ctx
    }
}

impl From<SchedulerContext> for ContextInput {
    fn from(ctx: SchedulerContext) -> Self {
        Self {
            schedule_id: ctx.schedule_id,
            start_date: ctx.start_date,
            end_date: ctx.end_date,
            shifts: ctx.shifts,
            staff: ctx.staff,
            availability: ctx
                .availability
                .into_iter()
                .map(|(id, dates)| {
                    let mut dates: Vec<_> = dates.into_iter().collect();
                    dates.sort();
                    (id, dates)
                })
                .collect(),
            leaves: ctx.leaves.into_values().flatten().collect(),
            unit_policy: ctx.policy_record,
            census_bands: ctx.census_bands,
            holidays: ctx.holidays.into_values().collect(),
            prior_holiday_counts: ctx.prior_holiday_counts,
            rule_parameters: ctx.params,
        }
    }
}
