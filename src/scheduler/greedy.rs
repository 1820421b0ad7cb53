//! Greedy constructor.
//!
//! # Algorithm
//!
//! 1. Order shifts by difficulty ([`priority`](super::priority)).
//! 2. For each shift, in order:
//!    a. fill the charge slot with a charge-capable candidate, highest
//!       level first;
//!    b. on ICU/ER without a level-4+, place one (they also take charge
//!       when the slot is still open);
//!    c. fill up to the target headcount, lowest soft-penalty score first.
//! 3. A slot with no legal candidate ends the shift's fill; the shift is
//!    reported understaffed with the most frequent rejection reasons
//!    across a sample of unassigned staff.
//!
//! Every candidate must pass the eligibility gate and the composition
//! check. Nothing is ever un-placed during construction.
//!
//! # Complexity
//! O(s · t · n · log k) where s=shifts, t=target headcount, n=staff,
//! k=assignments per staff member.
//!
//! # Reference
//! Burke et al. (2004), "The State of the Art of Nurse Rostering", §5.2:
//! constructive heuristics

use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::context::SchedulerContext;
use crate::eligibility::{self, static_check};
use crate::models::{Shift, ShortageKind, Staff, UnderstaffedShift};
use crate::scoring::PenaltyScorer;

use super::composition::{can_join, has_level, needs_charge, SENIOR_LEVEL};
use super::{priority, Roster};

/// Reason given when a legal candidate would break supervision.
pub const SUPERVISION_REASON: &str = "would leave the shift without required supervision";

/// Explains unfilled shifts from a sample of unassigned staff.
#[derive(Debug, Clone, Copy)]
pub struct ShortfallExplainer {
    sample_size: usize,
    max_reasons: usize,
}

impl Default for ShortfallExplainer {
    fn default() -> Self {
        Self::new(25, 3)
    }
}

impl ShortfallExplainer {
    /// Samples up to `sample_size` staff and keeps `max_reasons` reasons.
    pub fn new(sample_size: usize, max_reasons: usize) -> Self {
        Self {
            sample_size,
            max_reasons,
        }
    }

    /// Understaffed entry for a shift below its target.
    pub fn explain(
        &self,
        shift: &Shift,
        roster: &Roster,
        ctx: &SchedulerContext,
    ) -> UnderstaffedShift {
        UnderstaffedShift {
            shift_id: shift.id.clone(),
            date: shift.date,
            unit: shift.unit.clone(),
            required: shift.target_headcount(),
            assigned: roster.headcount(&shift.id) as u32,
            reasons: self.reasons(shift, roster, ctx),
            shortage: Self::classify(shift, roster, ctx),
        }
    }

    /// De-duplicated rejection reasons, most frequent first. Equal
    /// counts keep first-seen order.
    pub fn reasons(&self, shift: &Shift, roster: &Roster, ctx: &SchedulerContext) -> Vec<String> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        let sample = ctx
            .staff()
            .iter()
            .filter(|s| !roster.state().is_assigned(&s.id, &shift.id))
            .take(self.sample_size);

        for staff in sample {
            let mut found = eligibility::rejection_reasons(staff, shift, roster.state(), ctx);
            if found.is_empty() && !can_join(staff, shift, roster, ctx) {
                found.push(SUPERVISION_REASON.to_string());
            }
            for reason in found {
                match counts.iter_mut().find(|(r, _)| *r == reason) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((reason, 1)),
                }
            }
        }

        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
            .into_iter()
            .take(self.max_reasons)
            .map(|(r, _)| r)
            .collect()
    }

    /// Candidate scarcity when someone off the shift could work it in
    /// principle; genuine shortage otherwise.
    pub fn classify(shift: &Shift, roster: &Roster, ctx: &SchedulerContext) -> ShortageKind {
        let fixable = ctx.staff().iter().any(|s| {
            !roster.state().is_assigned(&s.id, &shift.id) && static_check(s, shift, ctx).is_ok()
        });
        if fixable {
            ShortageKind::CandidateScarcity
        } else {
            ShortageKind::GenuineShortage
        }
    }
}

/// Output of construction.
#[derive(Debug, Clone, Default)]
pub struct Construction {
    pub roster: Roster,
    pub understaffed: Vec<UnderstaffedShift>,
}

/// Greedy difficulty-ordered constructor.
///
/// # Example
/// ```
/// use chrono::{NaiveDate, NaiveTime};
/// use u_roster::context::SchedulerContext;
/// use u_roster::models::{Shift, ShiftType, Staff};
/// use u_roster::scheduler::GreedyConstructor;
/// use u_roster::scoring::PenaltyScorer;
///
/// let shift = Shift::new(
///     "S1",
///     NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
///     ShiftType::Day,
///     NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
///     12.0,
///     "Med-Surg",
/// )
/// .with_required(2);
/// let ctx = SchedulerContext::new(
///     vec![shift],
///     vec![Staff::new("N1", "Med-Surg"), Staff::new("N2", "Med-Surg")],
/// );
///
/// let scorer = PenaltyScorer::default();
/// let built = GreedyConstructor::new(&scorer).construct(&ctx);
/// assert_eq!(built.roster.len(), 2);
/// assert!(built.understaffed.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct GreedyConstructor<'a> {
    scorer: &'a PenaltyScorer,
    explainer: ShortfallExplainer,
}

impl<'a> GreedyConstructor<'a> {
    /// Creates a constructor ranking candidates with `scorer`.
    pub fn new(scorer: &'a PenaltyScorer) -> Self {
        Self {
            scorer,
            explainer: ShortfallExplainer::default(),
        }
    }

    /// Sets how unfilled shifts are explained.
    pub fn with_explainer(mut self, explainer: ShortfallExplainer) -> Self {
        self.explainer = explainer;
        self
    }

    /// Builds a roster from scratch.
    pub fn construct(&self, ctx: &SchedulerContext) -> Construction {
        let mut roster = Roster::new();
        let mut understaffed = Vec::new();
        for i in priority::sort_indices(ctx.shifts()) {
            let shift = &ctx.shifts()[i];
            if !self.fill_shift(shift, &mut roster, ctx) {
                understaffed.push(self.explainer.explain(shift, &roster, ctx));
            }
        }
        Construction {
            roster,
            understaffed,
        }
    }

    /// Runs the three passes on one shift. Returns `false` if the shift
    /// ends below its target headcount.
    pub fn fill_shift(&self, shift: &Shift, roster: &mut Roster, ctx: &SchedulerContext) -> bool {
        let target = shift.target_headcount() as usize;
        let room = |r: &Roster| r.headcount(&shift.id) < target;

        if needs_charge(shift, roster) && room(roster) {
            // Prefer level 5
            let pick = self.pick(shift, roster, ctx, Staff::can_take_charge, |s| {
                u8::MAX - s.competency_level
            });
            if let Some(staff) = pick {
                debug!(shift = %shift.id, staff = %staff.id, "charge slot filled");
                roster.assign(staff, shift, true);
            }
        }

        if shift.is_critical_care() && !has_level(shift, roster, ctx, SENIOR_LEVEL) && room(roster)
        {
            let charge_open = needs_charge(shift, roster);
            let pick = self.pick(
                shift,
                roster,
                ctx,
                |s| s.competency_level >= SENIOR_LEVEL,
                |s| u8::from(!(charge_open && s.can_take_charge())),
            );
            if let Some(staff) = pick {
                debug!(shift = %shift.id, staff = %staff.id, "senior slot filled");
                roster.assign(staff, shift, charge_open && staff.can_take_charge());
            }
        }

        while room(roster) {
            let Some(staff) = self.pick(shift, roster, ctx, |_| true, |_| 0) else {
                trace!(shift = %shift.id, "no legal candidate");
                return false;
            };
            let take_charge = needs_charge(shift, roster) && staff.can_take_charge();
            roster.assign(staff, shift, take_charge);
        }
        true
    }

    /// Legal candidate minimizing `(rank, score)`; ties keep roster order.
    fn pick<'c>(
        &self,
        shift: &Shift,
        roster: &Roster,
        ctx: &'c SchedulerContext,
        filter: impl Fn(&Staff) -> bool,
        rank: impl Fn(&Staff) -> u8,
    ) -> Option<&'c Staff> {
        ctx.active_staff()
            .filter(|&s| filter(s))
            .filter(|s| !roster.state().is_assigned(&s.id, &shift.id))
            .filter(|s| eligibility::is_eligible(s, shift, roster.state(), ctx))
            .filter(|s| can_join(s, shift, roster, ctx))
            .map(|s| (s, rank(s), self.scorer.score(s, shift, roster.state(), ctx)))
            .min_by(|a, b| {
                a.1.cmp(&b.1)
                    .then_with(|| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal))
            })
            .map(|(s, _, _)| s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ShiftType, StaffLeave};
    use chrono::{NaiveDate, NaiveTime};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn shift(id: &str, day: u32, unit: &str, required: u32) -> Shift {
        Shift::new(
            id,
            d(day),
            ShiftType::Day,
            NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            12.0,
            unit,
        )
        .with_required(required)
    }

    fn build(ctx: &SchedulerContext) -> Construction {
        let scorer = PenaltyScorer::default();
        GreedyConstructor::new(&scorer).construct(ctx)
    }

    #[test]
    fn test_fills_to_target_with_acuity() {
        let ctx = SchedulerContext::new(
            vec![shift("S1", 4, "Med", 2).with_acuity_extra(1)],
            (1..=4).map(|i| Staff::new(format!("N{i}"), "Med")).collect(),
        );
        let built = build(&ctx);
        assert_eq!(built.roster.headcount("S1"), 3);
        assert!(built.understaffed.is_empty());
    }

    #[test]
    fn test_charge_prefers_level_five() {
        let ctx = SchedulerContext::new(
            vec![shift("S1", 4, "Med", 2).with_charge_required()],
            vec![
                Staff::new("L4", "Med").with_level(4).with_charge_qualification(),
                Staff::new("L5", "Med").with_level(5).with_charge_qualification(),
                Staff::new("L3", "Med"),
            ],
        );
        let built = build(&ctx);
        assert_eq!(built.roster.charge_holder("S1"), Some("L5"));
        assert_eq!(built.roster.headcount("S1"), 2);
    }

    #[test]
    fn test_icu_places_senior_before_junior() {
        let ctx = SchedulerContext::new(
            vec![shift("S1", 4, "ICU", 2)],
            vec![
                Staff::new("J", "ICU").with_level(2),
                Staff::new("S", "ICU").with_level(4),
            ],
        );
        let built = build(&ctx);
        assert_eq!(built.roster.headcount("S1"), 2);
        assert!(built.roster.state().is_assigned("S", "S1"));
        assert!(built.roster.state().is_assigned("J", "S1"));
    }

    #[test]
    fn test_novice_needs_preceptor() {
        let ctx = SchedulerContext::new(
            vec![shift("S1", 4, "Med", 2)],
            vec![Staff::new("NEW", "Med").with_level(1), Staff::new("N3", "Med")],
        );
        let built = build(&ctx);
        assert_eq!(built.roster.headcount("S1"), 1);
        assert!(!built.roster.state().is_assigned("NEW", "S1"));
        let entry = &built.understaffed[0];
        assert_eq!(entry.assigned, 1);
        assert_eq!(entry.reasons, vec![SUPERVISION_REASON.to_string()]);
        assert_eq!(entry.shortage, ShortageKind::CandidateScarcity);
    }

    #[test]
    fn test_no_staff_reports_every_shift() {
        let ctx = SchedulerContext::new(
            vec![shift("S1", 4, "Med", 1), shift("S2", 5, "Med", 2)],
            vec![],
        );
        let built = build(&ctx);
        assert!(built.roster.is_empty());
        assert_eq!(built.understaffed.len(), 2);
        for u in &built.understaffed {
            assert_eq!(u.assigned, 0);
            assert!(u.reasons.is_empty());
            assert_eq!(u.shortage, ShortageKind::GenuineShortage);
        }
    }

    #[test]
    fn test_reasons_most_frequent_first() {
        let ctx = SchedulerContext::new(
            vec![shift("S1", 4, "Med", 1)],
            vec![
                Staff::new("A", "Med").with_active(false),
                Staff::new("B", "Med"),
                Staff::new("C", "Med"),
            ],
        )
        .with_leave(StaffLeave::approved("B", d(1), d(10)))
        .with_leave(StaffLeave::approved("C", d(3), d(5)));
        let built = build(&ctx);
        let entry = &built.understaffed[0];
        assert_eq!(entry.reasons, vec!["on approved leave", "inactive"]);
        assert_eq!(entry.shortage, ShortageKind::GenuineShortage);
    }

    #[test]
    fn test_max_reasons_truncates() {
        let ctx = SchedulerContext::new(
            vec![shift("S1", 4, "Med", 1)],
            vec![
                Staff::new("A", "Med").with_active(false),
                Staff::new("B", "Med"),
            ],
        )
        .with_leave(StaffLeave::approved("B", d(4), d(4)));
        let scorer = PenaltyScorer::default();
        let built = GreedyConstructor::new(&scorer)
            .with_explainer(ShortfallExplainer::new(25, 1))
            .construct(&ctx);
        assert_eq!(built.understaffed[0].reasons, vec!["inactive"]);
    }

    #[test]
    fn test_rest_blocks_back_to_back() {
        // Night 19:00 Mon then day 07:00 Tue for the only nurse
        let night = Shift::new(
            "N",
            d(4),
            ShiftType::Night,
            NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            12.0,
            "Med",
        );
        let ctx = SchedulerContext::new(
            vec![night, shift("D", 5, "Med", 1)],
            vec![Staff::new("N1", "Med")],
        );
        let built = build(&ctx);
        // Night ranks first
        assert!(built.roster.state().is_assigned("N1", "N"));
        assert_eq!(built.understaffed.len(), 1);
        assert_eq!(built.understaffed[0].shift_id, "D");
        assert_eq!(
            built.understaffed[0].reasons,
            vec!["less than 10h rest between shifts"]
        );
        assert_eq!(built.understaffed[0].shortage, ShortageKind::CandidateScarcity);
    }
}
