//! Incremental scheduling state.
//!
//! Tracks the assignments made so far and answers the workload questions
//! the eligibility gate and scorer ask ("hours in the last 7 days", "rest
//! since the previous shift", "consecutive days if this date is added")
//! without rescanning the whole roster.
//!
//! # Indexes
//!
//! | Index | Structure | Query cost |
//! |-------|-----------|------------|
//! | Bookings by start | sorted `Vec` | O(log k) neighbour lookup |
//! | Booking ends | sorted `Vec` | O(log k) last-end lookup |
//! | Worked dates | `BTreeMap<date, count>` | O(r) run scan |
//! | Daily hours | `BTreeMap<date, hours>` | O(log k) window sums |
//! | Week hours | `HashMap<monday, hours>` | O(1) |
//! | On-call per week / weekend | `HashMap` / `BTreeMap` | O(1) / O(log k) |
//!
//! `k` is the number of bookings of the staff member being asked about,
//! never the size of the whole roster. Construction order is not
//! chronological, so every neighbour query works in both directions.
//!
//! A state is owned by exactly one run. What-if evaluation clones it.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::context::SchedulerContext;
use crate::models::calendar::{month_key, week_start, weekend_id};
use crate::models::{AssignmentDraft, Shift, ShiftType};

/// Days in a rolling window.
const WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone)]
struct Booking {
    shift_id: String,
    start: NaiveDateTime,
    end: NaiveDateTime,
    date: NaiveDate,
    hours: f64,
    on_call: bool,
}

#[derive(Debug, Clone, Default)]
struct StaffLedger {
    bookings: Vec<Booking>,
    ends: Vec<NaiveDateTime>,
    worked_dates: BTreeMap<NaiveDate, u32>,
    daily_hours: BTreeMap<NaiveDate, f64>,
    week_hours: HashMap<NaiveDate, f64>,
    weekends: BTreeMap<NaiveDate, u32>,
    weekend_shifts: u32,
    on_call_by_week: HashMap<NaiveDate, u32>,
    on_call_weekends: BTreeMap<NaiveDate, u32>,
    total_hours: f64,
}

/// Incrementally maintained index over the assignments of one run.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    ledgers: HashMap<String, StaffLedger>,
    occupants: HashMap<String, Vec<String>>,
    assignment_count: usize,
}

impl StaffLedger {
    fn insert(&mut self, booking: Booking) {
        let pos = self.bookings.partition_point(|b| b.start <= booking.start);
        let end_pos = self.ends.partition_point(|e| *e <= booking.end);
        self.ends.insert(end_pos, booking.end);

        *self.worked_dates.entry(booking.date).or_insert(0) += 1;
        *self.daily_hours.entry(booking.date).or_insert(0.0) += booking.hours;
        *self.week_hours.entry(week_start(booking.date)).or_insert(0.0) += booking.hours;
        self.total_hours += booking.hours;

        if let Some(weekend) = weekend_id(booking.date) {
            *self.weekends.entry(weekend).or_insert(0) += 1;
            self.weekend_shifts += 1;
            if booking.on_call {
                *self.on_call_weekends.entry(weekend).or_insert(0) += 1;
            }
        }
        if booking.on_call {
            *self.on_call_by_week.entry(week_start(booking.date)).or_insert(0) += 1;
        }

        self.bookings.insert(pos, booking);
    }

    fn remove(&mut self, shift_id: &str) -> Option<Booking> {
        let idx = self.bookings.iter().position(|b| b.shift_id == shift_id)?;
        let booking = self.bookings.remove(idx);

        if let Ok(end_pos) = self.ends.binary_search(&booking.end) {
            self.ends.remove(end_pos);
        }
        decrement(&mut self.worked_dates, booking.date);
        subtract(&mut self.daily_hours, booking.date, booking.hours);
        if let Some(h) = self.week_hours.get_mut(&week_start(booking.date)) {
            *h -= booking.hours;
        }
        self.total_hours -= booking.hours;

        if let Some(weekend) = weekend_id(booking.date) {
            decrement(&mut self.weekends, weekend);
            self.weekend_shifts = self.weekend_shifts.saturating_sub(1);
            if booking.on_call {
                decrement(&mut self.on_call_weekends, weekend);
            }
        }
        if booking.on_call {
            if let Some(c) = self.on_call_by_week.get_mut(&week_start(booking.date)) {
                *c = c.saturating_sub(1);
            }
        }
        Some(booking)
    }

    fn hours_between(&self, first: NaiveDate, last: NaiveDate) -> f64 {
        self.daily_hours.range(first..=last).map(|(_, h)| h).sum()
    }
}

fn decrement(map: &mut BTreeMap<NaiveDate, u32>, key: NaiveDate) {
    if let Some(c) = map.get_mut(&key) {
        *c -= 1;
        if *c == 0 {
            map.remove(&key);
        }
    }
}

fn subtract(map: &mut BTreeMap<NaiveDate, f64>, key: NaiveDate, hours: f64) {
    if let Some(h) = map.get_mut(&key) {
        *h -= hours;
        if *h <= 1e-9 {
            map.remove(&key);
        }
    }
}

impl SchedulerState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a state from existing drafts. Drafts that reference
    /// unknown shifts are skipped.
    pub fn from_assignments(ctx: &SchedulerContext, assignments: &[AssignmentDraft]) -> Self {
        let mut state = Self::new();
        for a in assignments {
            if let Some(shift) = ctx.shift_by_id(&a.shift_id) {
                state.add(&a.staff_id, shift);
            }
        }
        state
    }

    /// Records `staff_id` on `shift`. Returns `false` if already recorded.
    pub fn add(&mut self, staff_id: &str, shift: &Shift) -> bool {
        let occupants = self.occupants.entry(shift.id.clone()).or_default();
        if occupants.iter().any(|s| s == staff_id) {
            return false;
        }
        occupants.push(staff_id.to_string());

        self.ledgers
            .entry(staff_id.to_string())
            .or_default()
            .insert(Booking {
                shift_id: shift.id.clone(),
                start: shift.start(),
                end: shift.end(),
                date: shift.date,
                hours: shift.duration_hours,
                on_call: shift.shift_type == ShiftType::OnCall,
            });
        self.assignment_count += 1;
        true
    }

    /// Removes `staff_id` from `shift`. Returns `false` if not recorded.
    pub fn remove(&mut self, staff_id: &str, shift: &Shift) -> bool {
        let Some(occupants) = self.occupants.get_mut(&shift.id) else {
            return false;
        };
        let Some(pos) = occupants.iter().position(|s| s == staff_id) else {
            return false;
        };
        occupants.remove(pos);
        if let Some(ledger) = self.ledgers.get_mut(staff_id) {
            ledger.remove(&shift.id);
        }
        self.assignment_count -= 1;
        true
    }

    /// Total recorded assignments.
    #[inline]
    pub fn assignment_count(&self) -> usize {
        self.assignment_count
    }

    /// Staff currently on a shift, in insertion order.
    pub fn occupants(&self, shift_id: &str) -> &[String] {
        self.occupants.get(shift_id).map_or(&[], Vec::as_slice)
    }

    /// Headcount currently on a shift.
    #[inline]
    pub fn occupancy(&self, shift_id: &str) -> usize {
        self.occupants(shift_id).len()
    }

    /// Whether `staff_id` is on `shift_id`.
    pub fn is_assigned(&self, staff_id: &str, shift_id: &str) -> bool {
        self.occupants(shift_id).iter().any(|s| s == staff_id)
    }

    /// Latest shift end at or before `instant`.
    pub fn last_shift_end_before(
        &self,
        staff_id: &str,
        instant: NaiveDateTime,
    ) -> Option<NaiveDateTime> {
        let ledger = self.ledgers.get(staff_id)?;
        let idx = ledger.ends.partition_point(|e| *e <= instant);
        idx.checked_sub(1).map(|i| ledger.ends[i])
    }

    /// Earliest shift start at or after `instant`.
    pub fn next_shift_start_at_or_after(
        &self,
        staff_id: &str,
        instant: NaiveDateTime,
    ) -> Option<NaiveDateTime> {
        let ledger = self.ledgers.get(staff_id)?;
        let idx = ledger.bookings.partition_point(|b| b.start < instant);
        ledger.bookings.get(idx).map(|b| b.start)
    }

    /// Whether any booking intersects `[start, end)`.
    ///
    /// Bookings starting before `end` minus bookings ending by `start`
    /// leaves exactly the intersecting ones.
    pub fn overlaps(&self, staff_id: &str, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        let Some(ledger) = self.ledgers.get(staff_id) else {
            return false;
        };
        let started_before_end = ledger.bookings.partition_point(|b| b.start < end);
        let ended_by_start = ledger.ends.partition_point(|e| *e <= start);
        started_before_end > ended_by_start
    }

    /// Whether working `date` would create a consecutive-day run longer
    /// than `limit`. Scans backward and forward from `date`.
    pub fn would_exceed_consecutive(&self, staff_id: &str, date: NaiveDate, limit: u32) -> bool {
        let Some(ledger) = self.ledgers.get(staff_id) else {
            return limit == 0;
        };
        if ledger.worked_dates.contains_key(&date) {
            return false;
        }
        let worked = |d: NaiveDate| ledger.worked_dates.contains_key(&d);

        let mut run: u32 = 1;
        let mut d = date - Duration::days(1);
        while worked(d) {
            run += 1;
            if run > limit {
                return true;
            }
            d -= Duration::days(1);
        }
        let mut d = date + Duration::days(1);
        while worked(d) {
            run += 1;
            if run > limit {
                return true;
            }
            d += Duration::days(1);
        }
        run > limit
    }

    /// Hours in the Monday–Sunday week containing `date`.
    pub fn week_hours(&self, staff_id: &str, date: NaiveDate) -> f64 {
        self.ledgers
            .get(staff_id)
            .and_then(|l| l.week_hours.get(&week_start(date)))
            .copied()
            .unwrap_or(0.0)
    }

    /// Hours of shifts starting in the same calendar week strictly
    /// before `instant`.
    pub fn week_hours_before(&self, staff_id: &str, instant: NaiveDateTime) -> f64 {
        let Some(ledger) = self.ledgers.get(staff_id) else {
            return 0.0;
        };
        let week_begin = week_start(instant.date()).and_time(chrono::NaiveTime::MIN);
        let lo = ledger.bookings.partition_point(|b| b.start < week_begin);
        let hi = ledger.bookings.partition_point(|b| b.start < instant);
        ledger.bookings[lo..hi.max(lo)].iter().map(|b| b.hours).sum()
    }

    /// Hours in the 7-day window ending on `date`.
    pub fn rolling_hours_ending(&self, staff_id: &str, date: NaiveDate) -> f64 {
        self.ledgers.get(staff_id).map_or(0.0, |l| {
            l.hours_between(date - Duration::days(WINDOW_DAYS - 1), date)
        })
    }

    /// Largest hour total over the seven rolling windows that contain
    /// `date` (window start slides from `date - 6` to `date`).
    pub fn max_rolling_hours_containing(&self, staff_id: &str, date: NaiveDate) -> f64 {
        let Some(ledger) = self.ledgers.get(staff_id) else {
            return 0.0;
        };
        let first = date - Duration::days(WINDOW_DAYS - 1);
        let last = date + Duration::days(WINDOW_DAYS - 1);
        let mut daily = [0.0_f64; (2 * WINDOW_DAYS - 1) as usize];
        for (d, h) in ledger.daily_hours.range(first..=last) {
            daily[(*d - first).num_days() as usize] += h;
        }
        let w = WINDOW_DAYS as usize;
        let mut sum: f64 = daily[..w].iter().sum();
        let mut best = sum;
        for k in 1..w {
            sum += daily[k + w - 1] - daily[k - 1];
            best = best.max(sum);
        }
        best
    }

    /// Weekend (Saturday/Sunday) shifts worked.
    pub fn weekend_shift_count(&self, staff_id: &str) -> u32 {
        self.ledgers.get(staff_id).map_or(0, |l| l.weekend_shifts)
    }

    /// Whether any shift falls on `weekend` (a Saturday).
    pub fn works_weekend(&self, staff_id: &str, weekend: NaiveDate) -> bool {
        self.ledgers
            .get(staff_id)
            .is_some_and(|l| l.weekends.contains_key(&weekend))
    }

    /// Length of the consecutive-weekend run that would contain
    /// `weekend` (a Saturday) if it were worked.
    pub fn consecutive_weekend_run_with(&self, staff_id: &str, weekend: NaiveDate) -> u32 {
        let Some(ledger) = self.ledgers.get(staff_id) else {
            return 1;
        };
        let worked = |w: NaiveDate| ledger.weekends.contains_key(&w);
        let mut run = 1;
        let mut w = weekend - Duration::days(7);
        while worked(w) {
            run += 1;
            w -= Duration::days(7);
        }
        let mut w = weekend + Duration::days(7);
        while worked(w) {
            run += 1;
            w += Duration::days(7);
        }
        run
    }

    /// On-call shifts in the calendar week containing `date`.
    pub fn on_call_count_in_week(&self, staff_id: &str, date: NaiveDate) -> u32 {
        self.ledgers
            .get(staff_id)
            .and_then(|l| l.on_call_by_week.get(&week_start(date)))
            .copied()
            .unwrap_or(0)
    }

    /// Distinct on-call weekends in the calendar month of `date`. A
    /// weekend belongs to the month of its Saturday.
    pub fn on_call_weekends_in_month(&self, staff_id: &str, date: NaiveDate) -> u32 {
        let Some(ledger) = self.ledgers.get(staff_id) else {
            return 0;
        };
        let key = month_key(weekend_id(date).unwrap_or(date));
        ledger
            .on_call_weekends
            .keys()
            .filter(|w| month_key(**w) == key)
            .count() as u32
    }

    /// Whether the staff member already has on-call work on `weekend`.
    pub fn has_on_call_weekend(&self, staff_id: &str, weekend: NaiveDate) -> bool {
        self.ledgers
            .get(staff_id)
            .is_some_and(|l| l.on_call_weekends.contains_key(&weekend))
    }

    /// Total hours assigned.
    pub fn total_hours(&self, staff_id: &str) -> f64 {
        self.ledgers.get(staff_id).map_or(0.0, |l| l.total_hours)
    }

    /// Distinct worked dates in order.
    pub fn worked_dates(&self, staff_id: &str) -> impl Iterator<Item = NaiveDate> + '_ {
        self.ledgers
            .get(staff_id)
            .into_iter()
            .flat_map(|l| l.worked_dates.keys().copied())
    }

    /// Shift IDs for a staff member in chronological order.
    pub fn shifts_for(&self, staff_id: &str) -> impl Iterator<Item = &str> + '_ {
        self.ledgers
            .get(staff_id)
            .into_iter()
            .flat_map(|l| l.bookings.iter().map(|b| b.shift_id.as_str()))
    }
}
