//! Hard rules.
//!
//! Each evaluator mirrors a check the eligibility gate or the scheduler
//! enforces during construction, so a roster built by the engine
//! normally reports none of these except shortfalls. They exist to audit
//! rosters from any source.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Duration, NaiveDate};

use super::{Placement, Rule, RuleContext, RuleId};
use crate::context::SchedulerContext;
use crate::models::calendar::{hours_between, month_key, week_start, weekend_id};
use crate::models::{RuleCategory, RuleViolation, Shift, ShiftType, MAX_COMPETENCY_LEVEL};

/// Headcount a shift must reach: the census band's required total when
/// the shift's census falls in a band, otherwise the base requirement.
pub fn required_headcount(ctx: &SchedulerContext, shift: &Shift) -> u32 {
    ctx.census_band_for(shift)
        .map(|b| b.required_total())
        .filter(|&n| n > 0)
        .unwrap_or(shift.required_staff_count)
}

/// Minimum headcount per shift.
#[derive(Debug, Clone, Copy)]
pub struct MinStaff;

impl Rule for MinStaff {
    fn id(&self) -> RuleId {
        RuleId::MinStaff
    }

    fn name(&self) -> &'static str {
        "Minimum staff"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Staffing
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        ctx.shifts()
            .filter_map(|(shift, placements)| {
                let required = required_headcount(ctx.context, shift);
                let assigned = placements.len() as u32;
                (assigned < required).then(|| {
                    self.violation(format!(
                        "Shift {} on {} has {assigned} of {required} required staff",
                        shift.id, shift.date
                    ))
                    .on_shift(&shift.id)
                })
            })
            .collect()
    }
}

/// Exactly one qualified charge nurse on shifts that require one.
#[derive(Debug, Clone, Copy)]
pub struct ChargeNurse;

impl Rule for ChargeNurse {
    fn id(&self) -> RuleId {
        RuleId::ChargeNurse
    }

    fn name(&self) -> &'static str {
        "Charge nurse"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Staffing
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        let mut out = Vec::new();
        for (shift, placements) in ctx.shifts() {
            if !shift.requires_charge_nurse {
                continue;
            }
            let charges: Vec<&Placement> =
                placements.iter().filter(|p| p.draft.is_charge_nurse).collect();
            match charges.len() {
                0 => out.push(
                    self.violation(format!("Shift {} has no charge nurse", shift.id))
                        .on_shift(&shift.id),
                ),
                1 => {}
                n => out.push(
                    self.violation(format!("Shift {} has {n} charge nurses", shift.id))
                        .on_shift(&shift.id),
                ),
            }
            for p in charges.iter().filter(|p| !p.staff.can_take_charge()) {
                out.push(
                    self.violation(format!(
                        "{} holds charge on {} without qualification (level {})",
                        p.staff.id, shift.id, p.staff.competency_level
                    ))
                    .on_shift(&shift.id)
                    .for_staff(&p.staff.id),
                );
            }
        }
        out
    }
}

/// Licensed staff (RN + LPN) against the census band's ratio.
#[derive(Debug, Clone, Copy)]
pub struct PatientRatio;

impl Rule for PatientRatio {
    fn id(&self) -> RuleId {
        RuleId::PatientRatio
    }

    fn name(&self) -> &'static str {
        "Patient ratio"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Staffing
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        let mut out = Vec::new();
        for (shift, placements) in ctx.shifts() {
            let (Some(band), Some(census)) = (ctx.context.census_band_for(shift), shift.actual_census)
            else {
                continue;
            };
            let by_ratio = if band.patients_per_nurse > 0.0 {
                (census as f64 / band.patients_per_nurse).ceil() as u32
            } else {
                0
            };
            let needed = by_ratio.max(band.required_rns + band.required_lpns);
            let licensed = placements.iter().filter(|p| p.staff.is_licensed()).count() as u32;
            if licensed < needed {
                out.push(
                    self.violation(format!(
                        "Shift {}: {census} patients need {needed} licensed staff, {licensed} assigned",
                        shift.id
                    ))
                    .on_shift(&shift.id),
                );
            }
        }
        out
    }
}

/// Minimum rest between chronologically adjacent shifts.
#[derive(Debug, Clone, Copy)]
pub struct RestHours;

impl Rule for RestHours {
    fn id(&self) -> RuleId {
        RuleId::RestHours
    }

    fn name(&self) -> &'static str {
        "Rest hours"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Rest
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        let min_rest = ctx.params().min_rest_hours;
        let mut out = Vec::new();
        for (staff, placements) in ctx.rostered_staff() {
            for pair in placements.windows(2) {
                let (a, b) = (pair[0].shift, pair[1].shift);
                let gap = hours_between(a.end(), b.start());
                if gap < min_rest {
                    out.push(
                        self.violation(format!(
                            "{} has {:.1}h rest between {} and {} (minimum {min_rest}h)",
                            staff.id,
                            gap.max(0.0),
                            a.id,
                            b.id
                        ))
                        .on_shift(&b.id)
                        .for_staff(&staff.id),
                    );
                }
            }
        }
        out
    }
}

/// Consecutive calendar days worked.
#[derive(Debug, Clone, Copy)]
pub struct MaxConsecutiveDays;

impl Rule for MaxConsecutiveDays {
    fn id(&self) -> RuleId {
        RuleId::MaxConsecutiveDays
    }

    fn name(&self) -> &'static str {
        "Maximum consecutive days"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Workload
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        let limit = ctx.params().max_consecutive_days;
        let mut out = Vec::new();
        for (staff, placements) in ctx.rostered_staff() {
            // First shift of each worked date
            let mut first_on: BTreeMap<NaiveDate, &Shift> = BTreeMap::new();
            for p in placements {
                first_on.entry(p.shift.date).or_insert(p.shift);
            }
            let mut run = 0u32;
            let mut prev: Option<NaiveDate> = None;
            for (&date, shift) in &first_on {
                run = match prev {
                    Some(p) if date - p == Duration::days(1) => run + 1,
                    _ => 1,
                };
                prev = Some(date);
                if run > limit {
                    out.push(
                        self.violation(format!(
                            "{} works {run} consecutive days through {date} (limit {limit})",
                            staff.id
                        ))
                        .on_shift(&shift.id)
                        .for_staff(&staff.id),
                    );
                }
            }
        }
        out
    }
}

/// Competency floor on ICU/ER-class units.
#[derive(Debug, Clone, Copy)]
pub struct IcuCompetency;

impl Rule for IcuCompetency {
    fn id(&self) -> RuleId {
        RuleId::IcuCompetency
    }

    fn name(&self) -> &'static str {
        "Critical care competency"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Competency
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        let floor = ctx.params().min_critical_care_level;
        ctx.shifts()
            .filter(|(shift, _)| shift.is_critical_care())
            .flat_map(|(shift, placements)| {
                placements
                    .iter()
                    .filter(move |p| p.staff.competency_level < floor)
                    .map(move |p| {
                        self.violation(format!(
                            "{} (level {}) on {} unit {} requires level {floor}",
                            p.staff.id, p.staff.competency_level, shift.id, shift.unit
                        ))
                        .on_shift(&shift.id)
                        .for_staff(&p.staff.id)
                    })
            })
            .collect()
    }
}

/// Novice supervision: level 1 needs a level 5 on the shift; on ICU/ER
/// units level 2 needs a level 4+.
#[derive(Debug, Clone, Copy)]
pub struct CompetencySupervision;

impl Rule for CompetencySupervision {
    fn id(&self) -> RuleId {
        RuleId::CompetencySupervision
    }

    fn name(&self) -> &'static str {
        "Competency supervision"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Competency
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        let mut out = Vec::new();
        for (shift, placements) in ctx.shifts() {
            let level_at_least =
                |min: u8| placements.iter().any(|p| p.staff.competency_level >= min);
            let first_at = |level: u8| placements.iter().find(|p| p.staff.competency_level == level);

            if let Some(novice) = first_at(1) {
                if !level_at_least(MAX_COMPETENCY_LEVEL) {
                    out.push(
                        self.violation(format!(
                            "Level-1 {} on {} has no level-5 preceptor",
                            novice.staff.id, shift.id
                        ))
                        .on_shift(&shift.id)
                        .for_staff(&novice.staff.id),
                    );
                }
            }
            if shift.is_critical_care() {
                if let Some(junior) = first_at(2) {
                    if !level_at_least(4) {
                        out.push(
                            self.violation(format!(
                                "Level-2 {} on {} unit {} has no level-4+ support",
                                junior.staff.id, shift.id, shift.unit
                            ))
                            .on_shift(&shift.id)
                            .for_staff(&junior.staff.id),
                        );
                    }
                }
            }
        }
        out
    }
}

/// No staff member on two overlapping shifts.
#[derive(Debug, Clone, Copy)]
pub struct NoOverlap;

impl Rule for NoOverlap {
    fn id(&self) -> RuleId {
        RuleId::NoOverlap
    }

    fn name(&self) -> &'static str {
        "No overlap"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Rest
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        let mut out = Vec::new();
        for (staff, placements) in ctx.rostered_staff() {
            for (i, a) in placements.iter().enumerate() {
                let a_end = a.shift.end();
                for b in placements[i + 1..]
                    .iter()
                    .take_while(|b| b.shift.start() < a_end)
                {
                    out.push(
                        self.violation(format!(
                            "{} is on overlapping shifts {} and {}",
                            staff.id, a.shift.id, b.shift.id
                        ))
                        .on_shift(&b.shift.id)
                        .for_staff(&staff.id),
                    );
                }
            }
        }
        out
    }
}

/// Per-diem staff only on dates they marked available.
#[derive(Debug, Clone, Copy)]
pub struct PrnAvailability;

impl Rule for PrnAvailability {
    fn id(&self) -> RuleId {
        RuleId::PrnAvailability
    }

    fn name(&self) -> &'static str {
        "Per-diem availability"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Availability
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        ctx.rostered_staff()
            .filter(|(staff, _)| staff.is_per_diem())
            .flat_map(|(staff, placements)| {
                placements
                    .iter()
                    .filter(move |p| !ctx.context.is_available(&staff.id, p.shift.date))
                    .map(move |p| {
                        self.violation(format!(
                            "Per-diem {} not available on {}",
                            staff.id, p.shift.date
                        ))
                        .on_shift(&p.shift.id)
                        .for_staff(&staff.id)
                    })
            })
            .collect()
    }
}

/// No assignments on approved leave.
#[derive(Debug, Clone, Copy)]
pub struct LeaveConflict;

impl Rule for LeaveConflict {
    fn id(&self) -> RuleId {
        RuleId::LeaveConflict
    }

    fn name(&self) -> &'static str {
        "Leave conflict"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Availability
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        ctx.rostered_staff()
            .flat_map(|(staff, placements)| {
                placements
                    .iter()
                    .filter(move |p| ctx.context.is_on_leave(&staff.id, p.shift.date))
                    .map(move |p| {
                        self.violation(format!(
                            "{} is on approved leave on {}",
                            staff.id, p.shift.date
                        ))
                        .on_shift(&p.shift.id)
                        .for_staff(&staff.id)
                    })
            })
            .collect()
    }
}

/// On-call caps per calendar week and per month of weekends.
#[derive(Debug, Clone, Copy)]
pub struct OnCallLimits;

impl Rule for OnCallLimits {
    fn id(&self) -> RuleId {
        RuleId::OnCallLimits
    }

    fn name(&self) -> &'static str {
        "On-call limits"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Workload
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        let policy = ctx.context.policy();
        let mut out = Vec::new();
        for (staff, placements) in ctx.rostered_staff() {
            let mut per_week: HashMap<NaiveDate, u32> = HashMap::new();
            let mut weekends_by_month: HashMap<(i32, u32), BTreeSet<NaiveDate>> = HashMap::new();

            for p in placements
                .iter()
                .filter(|p| p.shift.shift_type == ShiftType::OnCall)
            {
                let week = per_week.entry(week_start(p.shift.date)).or_insert(0);
                *week += 1;
                if *week > policy.max_on_call_per_week {
                    out.push(
                        self.violation(format!(
                            "{} has {} on-call shifts in the week of {} (limit {})",
                            staff.id,
                            week,
                            week_start(p.shift.date),
                            policy.max_on_call_per_week
                        ))
                        .on_shift(&p.shift.id)
                        .for_staff(&staff.id),
                    );
                }

                if let Some(weekend) = weekend_id(p.shift.date) {
                    let (year, month) = month_key(weekend);
                    let seen = weekends_by_month.entry((year, month)).or_default();
                    if seen.insert(weekend)
                        && seen.len() as u32 > policy.max_on_call_weekends_per_month
                    {
                        out.push(
                            self.violation(format!(
                                "{} has {} on-call weekends in {year}-{month:02} (limit {})",
                                staff.id,
                                seen.len(),
                                policy.max_on_call_weekends_per_month
                            ))
                            .on_shift(&p.shift.id)
                            .for_staff(&staff.id),
                        );
                    }
                }
            }
        }
        out
    }
}

/// Hours in every rolling 7-day window.
///
/// Consecutive breaching windows form one streak and are reported once,
/// at the heaviest window.
#[derive(Debug, Clone, Copy)]
pub struct MaxRollingHours;

impl Rule for MaxRollingHours {
    fn id(&self) -> RuleId {
        RuleId::MaxRollingHours
    }

    fn name(&self) -> &'static str {
        "Maximum rolling hours"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Workload
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        let limit = ctx.params().max_rolling_hours;
        let mut out = Vec::new();
        for (staff, placements) in ctx.rostered_staff() {
            let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
            for p in placements {
                *daily.entry(p.shift.date).or_insert(0.0) += p.shift.duration_hours;
            }
            let (Some(&first), Some(&last)) = (daily.keys().next(), daily.keys().next_back())
            else {
                continue;
            };

            let mut streak: Option<(NaiveDate, f64)> = None;
            let mut window_start = first - Duration::days(6);
            while window_start <= last + Duration::days(1) {
                let hours: f64 = daily
                    .range(window_start..=window_start + Duration::days(6))
                    .map(|(_, h)| h)
                    .sum();
                if hours > limit {
                    match &mut streak {
                        Some((start, peak)) if hours > *peak => {
                            *start = window_start;
                            *peak = hours;
                        }
                        Some(_) => {}
                        None => streak = Some((window_start, hours)),
                    }
                } else if let Some((start, peak)) = streak.take() {
                    out.push(self.breach(&staff.id, start, peak, limit, placements));
                }
                window_start += Duration::days(1);
            }
            if let Some((start, peak)) = streak {
                out.push(self.breach(&staff.id, start, peak, limit, placements));
            }
        }
        out
    }
}

impl MaxRollingHours {
    fn breach(
        &self,
        staff_id: &str,
        start: NaiveDate,
        hours: f64,
        limit: f64,
        placements: &[Placement<'_>],
    ) -> RuleViolation {
        let end = start + Duration::days(6);
        let v = self
            .violation(format!(
                "{staff_id} works {hours:.1}h in the 7 days {start} to {end} (limit {limit}h)"
            ))
            .for_staff(staff_id);
        // Attribute to the last shift inside the window
        match placements
            .iter()
            .rev()
            .find(|p| p.shift.date >= start && p.shift.date <= end)
        {
            Some(p) => v.on_shift(&p.shift.id),
            None => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignmentDraft, CensusBand, EmploymentType, StaffLeave, StaffRole, Staff};
    use chrono::NaiveTime;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn shift(id: &str, day: u32, hour: u32, hours: f64, unit: &str) -> Shift {
        Shift::new(
            id,
            d(day),
            ShiftType::Day,
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            hours,
            unit,
        )
    }

    fn draft(ctx: &SchedulerContext, shift_id: &str, staff_id: &str, charge: bool) -> AssignmentDraft {
        AssignmentDraft::new(
            ctx.shift_by_id(shift_id).unwrap(),
            ctx.staff_by_id(staff_id).unwrap(),
            charge,
        )
    }

    fn run<R: Rule>(rule: R, ctx: &SchedulerContext, drafts: &[AssignmentDraft]) -> Vec<RuleViolation> {
        rule.evaluate(&RuleContext::new(ctx, drafts))
    }

    #[test]
    fn test_min_staff_with_census_override() {
        let ctx = SchedulerContext::new(
            vec![
                shift("S1", 4, 7, 12.0, "U").with_required(1),
                shift("S2", 5, 7, 12.0, "U").with_required(1).with_census(12),
            ],
            vec![Staff::new("N1", "U"), Staff::new("N2", "U")],
        )
        .with_census_band(CensusBand::new(10, 20, 4.0).with_staffing(2, 0, 1));
        let drafts = vec![draft(&ctx, "S1", "N1", false), draft(&ctx, "S2", "N2", false)];
        let v = run(MinStaff, &ctx, &drafts);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].shift_id.as_deref(), Some("S2"));
        assert!(v[0].description.contains("1 of 3"));
    }

    #[test]
    fn test_charge_nurse_presence_and_qualification() {
        let ctx = SchedulerContext::new(
            vec![
                shift("S1", 4, 7, 12.0, "U").with_charge_required(),
                shift("S2", 5, 7, 12.0, "U").with_charge_required(),
            ],
            vec![
                Staff::new("N1", "U").with_level(3).with_charge_qualification(),
                Staff::new("N2", "U").with_level(5).with_charge_qualification(),
            ],
        );
        let drafts = vec![draft(&ctx, "S1", "N1", true), draft(&ctx, "S2", "N2", false)];
        let v = run(ChargeNurse, &ctx, &drafts);
        assert_eq!(v.len(), 2);
        assert!(v.iter().any(|x| x.description.contains("without qualification")));
        assert!(v.iter().any(|x| x.description.contains("no charge nurse")));
    }

    #[test]
    fn test_patient_ratio_counts_licensed_only() {
        let ctx = SchedulerContext::new(
            vec![shift("S1", 4, 7, 12.0, "U").with_census(10)],
            vec![
                Staff::new("N1", "U"),
                Staff::new("A1", "U").with_role(StaffRole::Cna),
            ],
        )
        .with_census_band(CensusBand::new(0, 20, 5.0));
        let drafts = vec![draft(&ctx, "S1", "N1", false), draft(&ctx, "S1", "A1", false)];
        let v = run(PatientRatio, &ctx, &drafts);
        assert_eq!(v.len(), 1);
        assert!(v[0].description.contains("need 2 licensed staff, 1 assigned"));
    }

    #[test]
    fn test_rest_hours_overnight() {
        // Night 19:00–07:00, then 05:00 the next morning
        let night = Shift::new(
            "N",
            d(4),
            ShiftType::Night,
            NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            12.0,
            "U",
        );
        let ctx = SchedulerContext::new(
            vec![night, shift("E", 5, 5, 8.0, "U")],
            vec![Staff::new("N1", "U")],
        );
        let drafts = vec![draft(&ctx, "E", "N1", false), draft(&ctx, "N", "N1", false)];
        let v = run(RestHours, &ctx, &drafts);
        assert_eq!(v.len(), 1);
        assert!(v[0].description.contains("0.0h rest"));
    }

    #[test]
    fn test_six_consecutive_days() {
        let shifts: Vec<Shift> = (4..=9)
            .map(|day| shift(&format!("S{day}"), day, 7, 12.0, "U"))
            .collect();
        let ctx = SchedulerContext::new(shifts, vec![Staff::new("N1", "U")]);
        let drafts: Vec<_> = (4..=9)
            .map(|day| draft(&ctx, &format!("S{day}"), "N1", false))
            .collect();
        let v = run(MaxConsecutiveDays, &ctx, &drafts);
        assert_eq!(v.len(), 1);
        assert!(v[0].description.contains("6 consecutive"));
        assert_eq!(v[0].shift_id.as_deref(), Some("S9"));
    }

    #[test]
    fn test_supervision() {
        let ctx = SchedulerContext::new(
            vec![shift("ICU1", 4, 7, 12.0, "ICU"), shift("MS1", 4, 7, 12.0, "MedSurg")],
            vec![
                Staff::new("L2", "ICU").with_level(2),
                Staff::new("L3", "ICU").with_level(3),
                Staff::new("L1", "MedSurg").with_level(1),
                Staff::new("L4", "MedSurg").with_level(4),
            ],
        );
        let drafts = vec![
            draft(&ctx, "ICU1", "L2", false),
            draft(&ctx, "ICU1", "L3", false),
            draft(&ctx, "MS1", "L1", false),
            draft(&ctx, "MS1", "L4", false),
        ];
        let v = run(CompetencySupervision, &ctx, &drafts);
        assert_eq!(v.len(), 2);
        assert!(v.iter().any(|x| x.staff_id.as_deref() == Some("L2")));
        assert!(v.iter().any(|x| x.staff_id.as_deref() == Some("L1")));
    }

    #[test]
    fn test_icu_competency_floor() {
        let ctx = SchedulerContext::new(
            vec![shift("S1", 4, 7, 12.0, "Main ICU")],
            vec![Staff::new("L1", "ICU").with_level(1)],
        );
        let drafts = vec![draft(&ctx, "S1", "L1", false)];
        assert_eq!(run(IcuCompetency, &ctx, &drafts).len(), 1);
    }

    #[test]
    fn test_overlap() {
        let ctx = SchedulerContext::new(
            vec![shift("A", 4, 7, 12.0, "U"), shift("B", 4, 15, 8.0, "U")],
            vec![Staff::new("N1", "U")],
        );
        let drafts = vec![draft(&ctx, "A", "N1", false), draft(&ctx, "B", "N1", false)];
        assert_eq!(run(NoOverlap, &ctx, &drafts).len(), 1);
    }

    #[test]
    fn test_availability_and_leave() {
        let ctx = SchedulerContext::new(
            vec![shift("S1", 4, 7, 12.0, "U")],
            vec![
                Staff::new("P1", "U").with_employment(EmploymentType::PerDiem),
                Staff::new("N1", "U"),
            ],
        )
        .with_leave(StaffLeave::approved("N1", d(4), d(4)));
        let drafts = vec![draft(&ctx, "S1", "P1", false), draft(&ctx, "S1", "N1", false)];
        assert_eq!(run(PrnAvailability, &ctx, &drafts).len(), 1);
        assert_eq!(run(LeaveConflict, &ctx, &drafts).len(), 1);
    }

    #[test]
    fn test_on_call_limits() {
        let oc = |id: &str, day: u32| {
            Shift::new(
                id,
                d(day),
                ShiftType::OnCall,
                NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                12.0,
                "U",
            )
        };
        // Sat 9th, Sat 16th: two weekends in March; Mon 11th same week as 16th
        let ctx = SchedulerContext::new(
            vec![oc("A", 9), oc("B", 11), oc("C", 16)],
            vec![Staff::new("N1", "U")],
        );
        let drafts: Vec<_> = ["A", "B", "C"]
            .iter()
            .map(|s| draft(&ctx, s, "N1", false))
            .collect();
        let v = run(OnCallLimits, &ctx, &drafts);
        // Week of the 11th has two; March has two on-call weekends
        assert_eq!(v.len(), 2);
        assert!(v.iter().all(|x| x.shift_id.as_deref() == Some("C")));
    }

    #[test]
    fn test_rolling_hours_single_streak() {
        // Six 12h shifts on alternating-free days: 72h within 7 days
        let days = [4u32, 5, 6, 8, 9, 10];
        let shifts: Vec<Shift> = days
            .iter()
            .map(|&day| shift(&format!("S{day}"), day, 7, 12.0, "U"))
            .collect();
        let ctx = SchedulerContext::new(shifts, vec![Staff::new("N1", "U")]);
        let drafts: Vec<_> = days
            .iter()
            .map(|day| draft(&ctx, &format!("S{day}"), "N1", false))
            .collect();
        let v = run(MaxRollingHours, &ctx, &drafts);
        assert_eq!(v.len(), 1);
        assert!(v[0].description.contains("72.0h"));
    }

    #[test]
    fn test_missing_lookups_skipped() {
        let ctx = SchedulerContext::new(vec![shift("S1", 4, 7, 12.0, "U")], vec![]);
        let ghost = AssignmentDraft {
            shift_id: "S1".into(),
            staff_id: "GHOST".into(),
            is_charge_nurse: false,
            is_overtime: false,
            is_float: false,
            float_from_unit: None,
        };
        let v = run(MinStaff, &ctx, &[ghost]);
        assert_eq!(v.len(), 1);
        assert!(v[0].description.contains("0 of 1"));
    }
}
