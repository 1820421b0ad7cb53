//! Rule evaluators and the rule registry.
//!
//! Evaluators scan a whole (possibly partial) assignment set and report
//! violations. They are used for reporting and total-penalty scoring;
//! the constructor never consults them, it asks the eligibility gate.
//!
//! # Usage
//!
//! ```
//! use u_roster::context::SchedulerContext;
//! use u_roster::rules::{RuleContext, RuleRegistry};
//!
//! let ctx = SchedulerContext::new(vec![], vec![]);
//! let registry = RuleRegistry::standard();
//! let violations = registry.evaluate_all(&RuleContext::new(&ctx, &[]));
//! assert!(violations.is_empty());
//! ```
//!
//! # Rules
//!
//! | Id | Severity | Category |
//! |----|----------|----------|
//! | `min-staff` | hard | staffing |
//! | `charge-nurse` | hard | staffing |
//! | `patient-ratio` | hard | staffing |
//! | `rest-hours` | hard | rest |
//! | `max-consecutive-days` | hard | workload |
//! | `icu-competency` | hard | competency |
//! | `competency-supervision` | hard | competency |
//! | `no-overlap` | hard | rest |
//! | `prn-availability` | hard | availability |
//! | `leave-conflict` | hard | availability |
//! | `on-call-limits` | hard | workload |
//! | `max-rolling-hours` | hard | workload |
//! | `overtime` | soft | overtime |
//! | `preference-mismatch` | soft | preference |
//! | `weekend-count` | soft | weekend count |
//! | `consecutive-weekends` | soft | consecutive weekends |
//! | `holiday-fairness` | soft | holiday fairness |
//! | `skill-mix` | soft | skill mix |
//! | `charge-clustering` | soft | charge clustering |
//! | `float-assignment` | soft | float |
//! | `agency-usage` | soft | agency |
//!
//! # References
//!
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"
//! - Cheang et al. (2003), "Nurse rostering problems: a bibliographic survey"

mod hard;
mod registry;
mod soft;

pub use hard::{
    required_headcount, ChargeNurse, CompetencySupervision, IcuCompetency, LeaveConflict,
    MaxConsecutiveDays, MaxRollingHours, MinStaff, NoOverlap, OnCallLimits, PatientRatio,
    PrnAvailability, RestHours,
};
pub use registry::RuleRegistry;
pub use soft::{
    float_penalty, overtime_split, preference_penalties, skill_mix_penalty, AgencyUsage,
    ChargeClustering, ConsecutiveWeekends, FloatAssignment, HolidayFairness, Overtime,
    PreferenceMismatch, SkillMix, WeekendCount, AGENCY_PENALTY, CHARGE_CLUSTER_PENALTY,
    CONSECUTIVE_WEEKEND_PENALTY, DAY_OFF_PENALTY, EXCESS_WEEKEND_PENALTY,
    EXTRA_HOURS_PENALTY_PER_HOUR, FLOAT_TRAINED_PENALTY, FLOAT_UNTRAINED_PENALTY,
    HOLIDAY_IMBALANCE_PENALTY, OVERTIME_PENALTY_PER_HOUR, SHIFT_TYPE_MISMATCH_PENALTY,
    SKILL_MIX_NARROW_PENALTY, SKILL_MIX_UNIFORM_PENALTY, WEEKEND_AVOIDANCE_PENALTY,
};

use std::collections::HashMap;
use std::fmt::Debug;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RuleParameters;
use crate::context::SchedulerContext;
use crate::models::{AssignmentDraft, RuleCategory, RuleViolation, Severity, Shift, Staff};

/// Stable rule identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    MinStaff,
    ChargeNurse,
    PatientRatio,
    RestHours,
    MaxConsecutiveDays,
    IcuCompetency,
    CompetencySupervision,
    NoOverlap,
    PrnAvailability,
    LeaveConflict,
    OnCallLimits,
    MaxRollingHours,
    Overtime,
    PreferenceMismatch,
    WeekendCount,
    ConsecutiveWeekends,
    HolidayFairness,
    SkillMix,
    ChargeClustering,
    FloatAssignment,
    AgencyUsage,
}

/// Unknown rule identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown rule id: {0}")]
pub struct UnknownRule(pub String);

impl RuleId {
    /// Every rule, hard rules first.
    pub const ALL: [RuleId; 21] = [
        RuleId::MinStaff,
        RuleId::ChargeNurse,
        RuleId::PatientRatio,
        RuleId::RestHours,
        RuleId::MaxConsecutiveDays,
        RuleId::IcuCompetency,
        RuleId::CompetencySupervision,
        RuleId::NoOverlap,
        RuleId::PrnAvailability,
        RuleId::LeaveConflict,
        RuleId::OnCallLimits,
        RuleId::MaxRollingHours,
        RuleId::Overtime,
        RuleId::PreferenceMismatch,
        RuleId::WeekendCount,
        RuleId::ConsecutiveWeekends,
        RuleId::HolidayFairness,
        RuleId::SkillMix,
        RuleId::ChargeClustering,
        RuleId::FloatAssignment,
        RuleId::AgencyUsage,
    ];

    /// Stable string id.
    pub fn as_str(self) -> &'static str {
        match self {
            RuleId::MinStaff => "min-staff",
            RuleId::ChargeNurse => "charge-nurse",
            RuleId::PatientRatio => "patient-ratio",
            RuleId::RestHours => "rest-hours",
            RuleId::MaxConsecutiveDays => "max-consecutive-days",
            RuleId::IcuCompetency => "icu-competency",
            RuleId::CompetencySupervision => "competency-supervision",
            RuleId::NoOverlap => "no-overlap",
            RuleId::PrnAvailability => "prn-availability",
            RuleId::LeaveConflict => "leave-conflict",
            RuleId::OnCallLimits => "on-call-limits",
            RuleId::MaxRollingHours => "max-rolling-hours",
            RuleId::Overtime => "overtime",
            RuleId::PreferenceMismatch => "preference-mismatch",
            RuleId::WeekendCount => "weekend-count",
            RuleId::ConsecutiveWeekends => "consecutive-weekends",
            RuleId::HolidayFairness => "holiday-fairness",
            RuleId::SkillMix => "skill-mix",
            RuleId::ChargeClustering => "charge-clustering",
            RuleId::FloatAssignment => "float-assignment",
            RuleId::AgencyUsage => "agency-usage",
        }
    }

    /// Hard rules block; soft rules penalize.
    pub fn severity(self) -> Severity {
        match self {
            RuleId::Overtime
            | RuleId::PreferenceMismatch
            | RuleId::WeekendCount
            | RuleId::ConsecutiveWeekends
            | RuleId::HolidayFairness
            | RuleId::SkillMix
            | RuleId::ChargeClustering
            | RuleId::FloatAssignment
            | RuleId::AgencyUsage => Severity::Soft,
            _ => Severity::Hard,
        }
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleId {
    type Err = UnknownRule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownRule(s.to_string()))
    }
}

/// A rule evaluated over a whole assignment set.
///
/// # Reference
/// Burke et al. (2004), §2: hard and soft constraints
pub trait Rule: Send + Sync + Debug {
    /// Stable identifier.
    fn id(&self) -> RuleId;

    /// Human-readable name.
    fn name(&self) -> &'static str;

    /// Category used for weighting.
    fn category(&self) -> RuleCategory;

    /// Hard or soft.
    fn severity(&self) -> Severity {
        self.id().severity()
    }

    /// Scans the assignment set and reports violations.
    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation>;

    /// Starts a violation tagged with this rule.
    fn violation(&self, description: String) -> RuleViolation {
        RuleViolation::new(
            self.id().as_str(),
            self.name(),
            self.severity(),
            self.category(),
            description,
        )
    }
}

/// A draft with its shift and staff resolved.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub draft: &'a AssignmentDraft,
    pub shift: &'a Shift,
    pub staff: &'a Staff,
}

/// An assignment set indexed for evaluation.
///
/// Drafts referencing unknown shifts or staff are skipped.
#[derive(Debug)]
pub struct RuleContext<'a> {
    /// Scheduler input.
    pub context: &'a SchedulerContext,
    /// Assignment set under evaluation.
    pub assignments: &'a [AssignmentDraft],
    by_shift: HashMap<&'a str, Vec<Placement<'a>>>,
    by_staff: HashMap<&'a str, Vec<Placement<'a>>>,
}

impl<'a> RuleContext<'a> {
    /// Indexes `assignments` against `context`.
    pub fn new(context: &'a SchedulerContext, assignments: &'a [AssignmentDraft]) -> Self {
        let mut by_shift: HashMap<&str, Vec<Placement<'a>>> = HashMap::new();
        let mut by_staff: HashMap<&str, Vec<Placement<'a>>> = HashMap::new();
        for draft in assignments {
            let (Some(shift), Some(staff)) = (
                context.shift_by_id(&draft.shift_id),
                context.staff_by_id(&draft.staff_id),
            ) else {
                continue;
            };
            let p = Placement {
                draft,
                shift,
                staff,
            };
            by_shift.entry(shift.id.as_str()).or_default().push(p);
            by_staff.entry(staff.id.as_str()).or_default().push(p);
        }
        for placements in by_staff.values_mut() {
            placements.sort_by(|a, b| {
                a.shift
                    .start()
                    .cmp(&b.shift.start())
                    .then_with(|| a.shift.id.cmp(&b.shift.id))
            });
        }
        Self {
            context,
            assignments,
            by_shift,
            by_staff,
        }
    }

    /// Rule parameter bag.
    #[inline]
    pub fn params(&self) -> &'a RuleParameters {
        self.context.params()
    }

    /// Placements on a shift, in draft order.
    pub fn on_shift(&self, shift_id: &str) -> &[Placement<'a>] {
        self.by_shift.get(shift_id).map_or(&[], Vec::as_slice)
    }

    /// Placements of a staff member, chronological.
    pub fn for_staff(&self, staff_id: &str) -> &[Placement<'a>] {
        self.by_staff.get(staff_id).map_or(&[], Vec::as_slice)
    }

    /// Every shift with its placements, in input order.
    pub fn shifts(&self) -> impl Iterator<Item = (&'a Shift, &[Placement<'a>])> + '_ {
        self.context
            .shifts()
            .iter()
            .map(move |s| (s, self.on_shift(&s.id)))
    }

    /// Staff with at least one placement, in roster order.
    pub fn rostered_staff(&self) -> impl Iterator<Item = (&'a Staff, &[Placement<'a>])> + '_ {
        self.context
            .staff()
            .iter()
            .map(move |s| (s, self.for_staff(&s.id)))
            .filter(|(_, p)| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_id_round_trip() {
        for id in RuleId::ALL {
            assert_eq!(id.as_str().parse::<RuleId>(), Ok(id));
        }
        assert_eq!(
            "no-such-rule".parse::<RuleId>(),
            Err(UnknownRule("no-such-rule".into()))
        );
    }

    #[test]
    fn test_severity_split() {
        let hard = RuleId::ALL
            .iter()
            .filter(|id| id.severity() == Severity::Hard)
            .count();
        assert_eq!(hard, 12);
        assert_eq!(RuleId::Overtime.severity(), Severity::Soft);
    }

    #[test]
    fn test_serde_matches_string_id() {
        let json = serde_json::to_string(&RuleId::MaxRollingHours).unwrap();
        assert_eq!(json, "\"max-rolling-hours\"");
    }
}
