//! Rule violations.

use serde::{Deserialize, Serialize};

/// Hard rules must never be violated; soft rules carry a penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Hard,
    Soft,
}

/// Rule category. Soft categories are the keys weight profiles tune.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    Staffing,
    Rest,
    Competency,
    Availability,
    Workload,
    Overtime,
    Preference,
    WeekendCount,
    ConsecutiveWeekends,
    HolidayFairness,
    SkillMix,
    Float,
    ChargeClustering,
    Agency,
}

/// A rule violation found in an assignment set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleViolation {
    /// Stable rule identifier (e.g. `"rest-hours"`).
    pub rule_id: String,
    /// Human-readable rule name.
    pub rule_name: String,
    /// Human-readable description of this occurrence.
    pub description: String,
    /// Hard or soft.
    pub severity: Severity,
    /// Rule category.
    pub category: RuleCategory,
    /// Offending shift, if any.
    pub shift_id: Option<String>,
    /// Offending staff member, if any.
    pub staff_id: Option<String>,
    /// Unweighted penalty magnitude for soft violations.
    pub penalty: Option<f64>,
}

impl RuleViolation {
    /// Creates a violation with no references.
    pub fn new(
        rule_id: impl Into<String>,
        rule_name: impl Into<String>,
        severity: Severity,
        category: RuleCategory,
        description: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            rule_name: rule_name.into(),
            description: description.into(),
            severity,
            category,
            shift_id: None,
            staff_id: None,
            penalty: None,
        }
    }

    /// Attaches the offending shift.
    pub fn on_shift(mut self, shift_id: impl Into<String>) -> Self {
        self.shift_id = Some(shift_id.into());
        self
    }

    /// Attaches the offending staff member.
    pub fn for_staff(mut self, staff_id: impl Into<String>) -> Self {
        self.staff_id = Some(staff_id.into());
        self
    }

    /// Sets the penalty magnitude.
    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = Some(penalty);
        self
    }

    /// Whether this is a hard violation.
    #[inline]
    pub fn is_hard(&self) -> bool {
        self.severity == Severity::Hard
    }

    /// Penalty magnitude, zero when absent.
    #[inline]
    pub fn penalty_or_zero(&self) -> f64 {
        self.penalty.unwrap_or(0.0)
    }
}
