//! Rule registry.
//!
//! A startup-time table of evaluators keyed by [`RuleId`]. Rule selection
//! comes from the parameter bag (`enabled_rules`); the registry never
//! reads configuration from anywhere else.

use std::sync::Arc;

use super::hard::*;
use super::soft::*;
use super::{Rule, RuleContext, RuleId};
use crate::context::SchedulerContext;
use crate::models::{AssignmentDraft, RuleViolation, Severity};

/// Registered rule evaluators.
///
/// # Example
/// ```
/// use u_roster::rules::{RuleRegistry, RuleId, Overtime, RestHours};
///
/// let registry = RuleRegistry::new()
///     .with_rule(RestHours)
///     .with_rule(Overtime);
/// assert_eq!(registry.len(), 2);
/// assert!(registry.get(RuleId::RestHours).is_some());
/// ```
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in rule, hard rules first.
    pub fn standard() -> Self {
        Self::new()
            .with_rule(MinStaff)
            .with_rule(ChargeNurse)
            .with_rule(PatientRatio)
            .with_rule(RestHours)
            .with_rule(MaxConsecutiveDays)
            .with_rule(IcuCompetency)
            .with_rule(CompetencySupervision)
            .with_rule(NoOverlap)
            .with_rule(PrnAvailability)
            .with_rule(LeaveConflict)
            .with_rule(OnCallLimits)
            .with_rule(MaxRollingHours)
            .with_rule(Overtime)
            .with_rule(PreferenceMismatch)
            .with_rule(WeekendCount)
            .with_rule(ConsecutiveWeekends)
            .with_rule(HolidayFairness)
            .with_rule(SkillMix)
            .with_rule(ChargeClustering)
            .with_rule(FloatAssignment)
            .with_rule(AgencyUsage)
    }

    /// Built-in rules of one severity.
    pub fn standard_of(severity: Severity) -> Self {
        Self::standard().only(severity)
    }

    /// Registers a rule, replacing any rule with the same id.
    pub fn with_rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        let id = rule.id();
        self.rules.retain(|r| r.id() != id);
        self.rules.push(Arc::new(rule));
        self
    }

    /// Keeps rules of one severity.
    pub fn only(mut self, severity: Severity) -> Self {
        self.rules.retain(|r| r.severity() == severity);
        self
    }

    /// Rule by id.
    pub fn get(&self, id: RuleId) -> Option<&dyn Rule> {
        self.rules.iter().find(|r| r.id() == id).map(|r| r.as_ref())
    }

    /// Registered rules in registration order.
    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Number of registered rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluates every registered rule enabled in the parameter bag.
    pub fn evaluate_all(&self, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
        let params = ctx.params();
        self.rules
            .iter()
            .filter(|r| params.is_enabled(r.id().as_str()))
            .flat_map(|r| r.evaluate(ctx))
            .collect()
    }

    /// Indexes `assignments` and evaluates every enabled rule.
    pub fn check(
        &self,
        context: &SchedulerContext,
        assignments: &[AssignmentDraft],
    ) -> Vec<RuleViolation> {
        self.evaluate_all(&RuleContext::new(context, assignments))
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.id().as_str()))
            .finish()
    }
}
