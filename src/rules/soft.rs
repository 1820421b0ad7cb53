//! Soft rules.
//!
//! Each violation carries an unweighted penalty. Weight profiles scale
//! penalties by category; the evaluators themselves are profile-blind.
//!
//! Penalty magnitudes are shared with the incremental scorer so that a
//! candidate's construction-time score and its contribution to the
//! final total agree in scale.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate};

use super::{Placement, Rule, RuleContext, RuleId};
use crate::models::calendar::{week_start, weekend_id};
use crate::models::{EmploymentType, RuleCategory, RuleViolation, Shift, Staff};

/// Per hour above the weekly overtime threshold.
pub const OVERTIME_PENALTY_PER_HOUR: f64 = 10.0;
/// Per hour above FTE target but within the threshold.
pub const EXTRA_HOURS_PENALTY_PER_HOUR: f64 = 2.0;
/// Scheduled against preferred shift type.
pub const SHIFT_TYPE_MISMATCH_PENALTY: f64 = 5.0;
/// Scheduled on a preferred day off.
pub const DAY_OFF_PENALTY: f64 = 10.0;
/// Weekend shift for someone avoiding weekends.
pub const WEEKEND_AVOIDANCE_PENALTY: f64 = 8.0;
/// Each weekend shift beyond the period requirement.
pub const EXCESS_WEEKEND_PENALTY: f64 = 5.0;
/// Each weekend beyond the consecutive-weekend limit.
pub const CONSECUTIVE_WEEKEND_PENALTY: f64 = 10.0;
/// Per holiday of deviation from the staff average.
pub const HOLIDAY_IMBALANCE_PENALTY: f64 = 10.0;
/// Every staff member on the shift at one level.
pub const SKILL_MIX_UNIFORM_PENALTY: f64 = 10.0;
/// Levels on the shift span exactly one step.
pub const SKILL_MIX_NARROW_PENALTY: f64 = 3.0;
/// Per charge-qualified head above the clustering threshold.
pub const CHARGE_CLUSTER_PENALTY: f64 = 5.0;
/// Floating to a unit the staff member is cross-trained for.
pub const FLOAT_TRAINED_PENALTY: f64 = 3.0;
/// Floating to a unit without cross-training.
pub const FLOAT_UNTRAINED_PENALTY: f64 = 10.0;
/// Each agency assignment.
pub const AGENCY_PENALTY: f64 = 8.0;

/// Splits the hours one shift adds to a week into `(extra, overtime)`.
///
/// `before` is the week's hours ahead of the shift. Only the marginal
/// hours the shift itself contributes are counted, so hours already
/// above a tier are never counted twice.
pub fn overtime_split(before: f64, hours: f64, standard: f64, threshold: f64) -> (f64, f64) {
    let after = before + hours;
    let overtime = (after - threshold).max(0.0) - (before - threshold).max(0.0);
    let extra = if standard < threshold {
        after.clamp(standard, threshold) - before.clamp(standard, threshold)
    } else {
        0.0
    };
    (extra, overtime)
}

/// Preference mismatches for one pairing, as `(description, penalty)`.
pub fn preference_penalties(staff: &Staff, shift: &Shift) -> Vec<(String, f64)> {
    let Some(prefs) = &staff.preferences else {
        return Vec::new();
    };
    let mut out = Vec::new();
    if let Some(preferred) = prefs.preferred_shift_type {
        if preferred != shift.shift_type {
            out.push((
                format!("prefers {preferred:?} shifts, scheduled {:?}", shift.shift_type).to_lowercase(),
                SHIFT_TYPE_MISMATCH_PENALTY,
            ));
        }
    }
    if prefs.preferred_days_off.contains(&shift.date.weekday()) {
        out.push((
            format!("scheduled on preferred day off ({})", shift.date.weekday()),
            DAY_OFF_PENALTY,
        ));
    }
    if prefs.avoid_weekends && shift.is_weekend() {
        out.push(("scheduled on a weekend".to_string(), WEEKEND_AVOIDANCE_PENALTY));
    }
    out
}

/// Skill-mix penalty for the competency levels present on one shift.
pub fn skill_mix_penalty(levels: impl IntoIterator<Item = u8>) -> f64 {
    let mut count = 0usize;
    let (mut lo, mut hi) = (u8::MAX, u8::MIN);
    for level in levels {
        count += 1;
        lo = lo.min(level);
        hi = hi.max(level);
    }
    if count < 2 {
        return 0.0;
    }
    match hi - lo {
        0 => SKILL_MIX_UNIFORM_PENALTY,
        1 => SKILL_MIX_NARROW_PENALTY,
        _ => 0.0,
    }
}

/// Float penalty for one pairing, zero on the home unit.
pub fn float_penalty(staff: &Staff, shift: &Shift) -> f64 {
    if staff.home_unit == shift.unit {
        0.0
    } else if staff.is_trained_for(&shift.unit) {
        FLOAT_TRAINED_PENALTY
    } else {
        FLOAT_UNTRAINED_PENALTY
    }
}

/// Weekly hours above FTE target and above the overtime threshold.
#[derive(Debug, Clone, Copy)]
pub struct Overtime;

impl Rule for Overtime {
    fn id(&self) -> RuleId {
        RuleId::Overtime
    }

    fn name(&self) -> &'static str {
        "Overtime"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Overtime
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        let threshold = ctx.params().overtime_threshold_hours;
        let mut out = Vec::new();
        for (staff, placements) in ctx.rostered_staff() {
            let standard = staff.standard_weekly_hours();
            let mut week_hours: BTreeMap<NaiveDate, f64> = BTreeMap::new();
            for p in placements {
                let week = week_start(p.shift.date);
                let before = week_hours.entry(week).or_insert(0.0);
                let (extra, overtime) =
                    overtime_split(*before, p.shift.duration_hours, standard, threshold);
                *before += p.shift.duration_hours;

                let description = if overtime > 0.0 {
                    format!(
                        "Actual overtime: {} works {overtime:.1}h above {threshold}h in the week of {week}",
                        staff.id
                    )
                } else if extra > 0.0 {
                    format!(
                        "Extra hours: {} works {extra:.1}h above the {standard:.1}h standard in the week of {week}",
                        staff.id
                    )
                } else {
                    continue;
                };
                let penalty =
                    overtime * OVERTIME_PENALTY_PER_HOUR + extra * EXTRA_HOURS_PENALTY_PER_HOUR;
                out.push(
                    self.violation(description)
                        .on_shift(&p.shift.id)
                        .for_staff(&staff.id)
                        .with_penalty(penalty),
                );
            }
        }
        out
    }
}

/// Shift type, day off, and weekend preferences.
#[derive(Debug, Clone, Copy)]
pub struct PreferenceMismatch;

impl Rule for PreferenceMismatch {
    fn id(&self) -> RuleId {
        RuleId::PreferenceMismatch
    }

    fn name(&self) -> &'static str {
        "Preference mismatch"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Preference
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        let mut out = Vec::new();
        for (staff, placements) in ctx.rostered_staff() {
            let cap = staff.preferences.as_ref().and_then(|p| p.max_hours_per_week);
            let mut week_hours: BTreeMap<NaiveDate, f64> = BTreeMap::new();
            for p in placements {
                for (what, penalty) in preference_penalties(staff, p.shift) {
                    out.push(
                        self.violation(format!("{} on {}: {what}", staff.id, p.shift.id))
                            .on_shift(&p.shift.id)
                            .for_staff(&staff.id)
                            .with_penalty(penalty),
                    );
                }
                let Some(cap) = cap else { continue };
                let before = week_hours.entry(week_start(p.shift.date)).or_insert(0.0);
                let (_, above) = overtime_split(*before, p.shift.duration_hours, cap, cap);
                *before += p.shift.duration_hours;
                if above > 0.0 {
                    out.push(
                        self.violation(format!(
                            "{} on {}: {above:.1}h above the preferred {cap:.1}h week",
                            staff.id, p.shift.id
                        ))
                        .on_shift(&p.shift.id)
                        .for_staff(&staff.id)
                        .with_penalty(above * EXTRA_HOURS_PENALTY_PER_HOUR),
                    );
                }
            }
        }
        out
    }
}

/// Weekend shifts beyond the period requirement. The first `required`
/// weekend shifts in date order are the required ones; the rest are
/// flagged. Weekend-exempt staff are skipped.
#[derive(Debug, Clone, Copy)]
pub struct WeekendCount;

impl Rule for WeekendCount {
    fn id(&self) -> RuleId {
        RuleId::WeekendCount
    }

    fn name(&self) -> &'static str {
        "Weekend count"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::WeekendCount
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        let required = ctx.context.policy().weekend_shifts_required as usize;
        let mut out = Vec::new();
        for (staff, placements) in ctx.rostered_staff() {
            if staff.weekend_exempt {
                continue;
            }
            let weekend_shifts = placements.iter().filter(|p| p.shift.is_weekend());
            for (n, p) in weekend_shifts.enumerate().skip(required) {
                out.push(
                    self.violation(format!(
                        "{} weekend shift #{} on {} exceeds the {required} required",
                        staff.id,
                        n + 1,
                        p.shift.date
                    ))
                    .on_shift(&p.shift.id)
                    .for_staff(&staff.id)
                    .with_penalty(EXCESS_WEEKEND_PENALTY),
                );
            }
        }
        out
    }
}

/// Runs of consecutive weekends above the unit limit.
#[derive(Debug, Clone, Copy)]
pub struct ConsecutiveWeekends;

impl Rule for ConsecutiveWeekends {
    fn id(&self) -> RuleId {
        RuleId::ConsecutiveWeekends
    }

    fn name(&self) -> &'static str {
        "Consecutive weekends"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::ConsecutiveWeekends
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        let limit = ctx.context.policy().max_consecutive_weekends;
        let mut out = Vec::new();
        for (staff, placements) in ctx.rostered_staff() {
            // Saturday and Sunday share the Saturday's id
            let mut weekends: BTreeMap<NaiveDate, &Placement> = BTreeMap::new();
            for p in placements {
                if let Some(id) = weekend_id(p.shift.date) {
                    weekends.entry(id).or_insert(p);
                }
            }
            let mut run = 0u32;
            let mut prev: Option<NaiveDate> = None;
            for (&weekend, p) in &weekends {
                run = match prev {
                    Some(w) if weekend - w == Duration::days(7) => run + 1,
                    _ => 1,
                };
                prev = Some(weekend);
                if run > limit {
                    out.push(
                        self.violation(format!(
                            "{} works {run} consecutive weekends through {weekend} (limit {limit})",
                            staff.id
                        ))
                        .on_shift(&p.shift.id)
                        .for_staff(&staff.id)
                        .with_penalty(CONSECUTIVE_WEEKEND_PENALTY),
                    );
                }
            }
        }
        out
    }
}

/// Yearly holiday load against the active-staff average.
///
/// Grouped holidays (Christmas Eve and Day, New Year's Eve and Day)
/// count once. Counts include holidays worked earlier in the year.
#[derive(Debug, Clone, Copy)]
pub struct HolidayFairness;

impl Rule for HolidayFairness {
    fn id(&self) -> RuleId {
        RuleId::HolidayFairness
    }

    fn name(&self) -> &'static str {
        "Holiday fairness"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::HolidayFairness
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        let context = ctx.context;
        if context.holidays().next().is_none() {
            return Vec::new();
        }
        let tolerance = ctx.params().holiday_fairness_tolerance;
        let yearly_cap = context.policy().max_holidays_per_year;

        let counts: Vec<(&Staff, f64, Option<&Placement>)> = context
            .active_staff()
            .map(|staff| {
                let mut groups = BTreeSet::new();
                let mut last = None;
                for p in ctx.for_staff(&staff.id) {
                    if let Some(h) = context.holiday_on(p.shift.date) {
                        groups.insert(h.group_key());
                        last = Some(p);
                    }
                }
                let total = context.prior_holiday_count(&staff.id) as f64 + groups.len() as f64;
                (staff, total, last)
            })
            .collect();
        if counts.is_empty() {
            return Vec::new();
        }
        let average = counts.iter().map(|(_, c, _)| c).sum::<f64>() / counts.len() as f64;

        let mut out = Vec::new();
        for (staff, count, last) in counts {
            let over_average = count > average + tolerance;
            let over_cap = yearly_cap.filter(|&cap| count > cap as f64);
            if over_average || over_cap.is_some() {
                let description = match over_cap {
                    Some(cap) if !over_average => format!(
                        "{} has worked {count} holidays this year, above the cap of {cap}",
                        staff.id
                    ),
                    _ => format!(
                        "{} has worked {count} holidays this year, above the {average:.1} average",
                        staff.id
                    ),
                };
                let excess = over_cap
                    .map_or(0.0, |cap| count - cap as f64)
                    .max(count - average)
                    .max(1.0);
                let mut v = self
                    .violation(description)
                    .for_staff(&staff.id)
                    .with_penalty(HOLIDAY_IMBALANCE_PENALTY * excess);
                if let Some(p) = last {
                    v = v.on_shift(&p.shift.id);
                }
                out.push(v);
            } else if count < average - tolerance {
                out.push(
                    self.violation(format!(
                        "{} has worked {count} holidays this year, below the {average:.1} average",
                        staff.id
                    ))
                    .for_staff(&staff.id)
                    .with_penalty(HOLIDAY_IMBALANCE_PENALTY * (average - count)),
                );
            }
        }
        out
    }
}

/// Competency diversity on each shift.
#[derive(Debug, Clone, Copy)]
pub struct SkillMix;

impl Rule for SkillMix {
    fn id(&self) -> RuleId {
        RuleId::SkillMix
    }

    fn name(&self) -> &'static str {
        "Skill mix"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::SkillMix
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        ctx.shifts()
            .filter_map(|(shift, placements)| {
                let penalty = skill_mix_penalty(placements.iter().map(|p| p.staff.competency_level));
                (penalty > 0.0).then(|| {
                    let levels: BTreeSet<u8> =
                        placements.iter().map(|p| p.staff.competency_level).collect();
                    self.violation(format!(
                        "Shift {} has little skill diversity (levels {levels:?})",
                        shift.id
                    ))
                    .on_shift(&shift.id)
                    .with_penalty(penalty)
                })
            })
            .collect()
    }
}

/// Charge-qualified staff clustered on one shift.
#[derive(Debug, Clone, Copy)]
pub struct ChargeClustering;

impl Rule for ChargeClustering {
    fn id(&self) -> RuleId {
        RuleId::ChargeClustering
    }

    fn name(&self) -> &'static str {
        "Charge clustering"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::ChargeClustering
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        let counts: Vec<(&Shift, usize)> = ctx
            .shifts()
            .filter(|(_, p)| !p.is_empty())
            .map(|(shift, p)| (shift, p.iter().filter(|p| p.staff.charge_qualified).count()))
            .collect();
        if counts.is_empty() {
            return Vec::new();
        }
        let average = counts.iter().map(|(_, c)| *c as f64).sum::<f64>() / counts.len() as f64;
        let threshold = (average + 1.0).max(2.0);

        counts
            .into_iter()
            .filter(|&(_, c)| c as f64 > threshold)
            .map(|(shift, c)| {
                self.violation(format!(
                    "Shift {} has {c} charge-qualified staff (threshold {threshold:.1})",
                    shift.id
                ))
                .on_shift(&shift.id)
                .with_penalty(CHARGE_CLUSTER_PENALTY * (c as f64 - threshold))
            })
            .collect()
    }
}

/// Work outside the home unit.
#[derive(Debug, Clone, Copy)]
pub struct FloatAssignment;

impl Rule for FloatAssignment {
    fn id(&self) -> RuleId {
        RuleId::FloatAssignment
    }

    fn name(&self) -> &'static str {
        "Float assignment"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Float
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        let mut out = Vec::new();
        for (staff, placements) in ctx.rostered_staff() {
            for p in placements {
                let penalty = float_penalty(staff, p.shift);
                if penalty > 0.0 {
                    let trained = if staff.is_trained_for(&p.shift.unit) {
                        "cross-trained"
                    } else {
                        "not cross-trained"
                    };
                    out.push(
                        self.violation(format!(
                            "{} floats from {} to {} ({trained})",
                            staff.id, staff.home_unit, p.shift.unit
                        ))
                        .on_shift(&p.shift.id)
                        .for_staff(&staff.id)
                        .with_penalty(penalty),
                    );
                }
            }
        }
        out
    }
}

/// Agency staff usage.
#[derive(Debug, Clone, Copy)]
pub struct AgencyUsage;

impl Rule for AgencyUsage {
    fn id(&self) -> RuleId {
        RuleId::AgencyUsage
    }

    fn name(&self) -> &'static str {
        "Agency usage"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Agency
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        ctx.rostered_staff()
            .filter(|(staff, _)| staff.employment_type == EmploymentType::Agency)
            .flat_map(|(staff, placements)| {
                placements.iter().map(move |p| {
                    self.violation(format!("Agency {} on {}", staff.id, p.shift.id))
                        .on_shift(&p.shift.id)
                        .for_staff(&staff.id)
                        .with_penalty(AGENCY_PENALTY)
                })
            })
            .collect()
    }
}
