//! Weight profiles.
//!
//! A profile scales soft penalties by category. Swapping profiles only
//! changes the weighted sum; evaluators, gate, and search are untouched.
//!
//! | Weight | Balanced | Fair | Cost-optimized |
//! |--------|----------|------|----------------|
//! | overtime | 1.2 | 0.5 | 2.5 |
//! | preference | 1.2 | 2.0 | 0.5 |
//! | weekend count | 1.0 | 2.0 | 0.5 |
//! | consecutive weekends | 1.0 | 2.0 | 0.5 |
//! | holiday fairness | 1.0 | 2.0 | 0.5 |
//! | skill mix | 1.0 | 1.0 | 1.0 |
//! | float | 1.0 | 0.5 | 2.0 |
//! | charge clustering | 1.0 | 1.0 | 1.0 |
//! | agency | 1.0 | 0.5 | 2.5 |

use serde::{Deserialize, Serialize};

use crate::models::RuleCategory;

/// Named weight profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    /// Moderate, leaning slightly toward overtime and preferences.
    #[default]
    Balanced,
    /// Fairness and preferences first.
    Fair,
    /// Overtime, agency, and float cost first.
    CostOptimized,
}

impl ProfileKind {
    /// Every profile, in reporting order.
    pub const ALL: [ProfileKind; 3] = [
        ProfileKind::Balanced,
        ProfileKind::Fair,
        ProfileKind::CostOptimized,
    ];

    /// The profile's weights.
    pub fn weights(self) -> WeightProfile {
        match self {
            ProfileKind::Balanced => WeightProfile::balanced(),
            ProfileKind::Fair => WeightProfile::fair(),
            ProfileKind::CostOptimized => WeightProfile::cost_optimized(),
        }
    }
}

/// Per-category soft-penalty weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightProfile {
    pub overtime: f64,
    pub preference: f64,
    pub weekend_count: f64,
    pub consecutive_weekends: f64,
    pub holiday_fairness: f64,
    pub skill_mix: f64,
    pub float: f64,
    pub charge_clustering: f64,
    pub agency: f64,
}

impl Default for WeightProfile {
    fn default() -> Self {
        Self::balanced()
    }
}

impl WeightProfile {
    /// Every weight 1.0.
    pub fn uniform() -> Self {
        Self {
            overtime: 1.0,
            preference: 1.0,
            weekend_count: 1.0,
            consecutive_weekends: 1.0,
            holiday_fairness: 1.0,
            skill_mix: 1.0,
            float: 1.0,
            charge_clustering: 1.0,
            agency: 1.0,
        }
    }

    /// Balanced profile.
    pub fn balanced() -> Self {
        Self {
            overtime: 1.2,
            preference: 1.2,
            ..Self::uniform()
        }
    }

    /// Fairness-optimized profile.
    pub fn fair() -> Self {
        Self {
            overtime: 0.5,
            preference: 2.0,
            weekend_count: 2.0,
            consecutive_weekends: 2.0,
            holiday_fairness: 2.0,
            float: 0.5,
            agency: 0.5,
            ..Self::uniform()
        }
    }

    /// Cost-optimized profile.
    pub fn cost_optimized() -> Self {
        Self {
            overtime: 2.5,
            preference: 0.5,
            weekend_count: 0.5,
            consecutive_weekends: 0.5,
            holiday_fairness: 0.5,
            float: 2.0,
            agency: 2.5,
            ..Self::uniform()
        }
    }

    /// Weight for a category. Hard-rule categories weigh nothing.
    pub fn weight_for(&self, category: RuleCategory) -> f64 {
        match category {
            RuleCategory::Overtime => self.overtime,
            RuleCategory::Preference => self.preference,
            RuleCategory::WeekendCount => self.weekend_count,
            RuleCategory::ConsecutiveWeekends => self.consecutive_weekends,
            RuleCategory::HolidayFairness => self.holiday_fairness,
            RuleCategory::SkillMix => self.skill_mix,
            RuleCategory::Float => self.float,
            RuleCategory::ChargeClustering => self.charge_clustering,
            RuleCategory::Agency => self.agency,
            RuleCategory::Staffing
            | RuleCategory::Rest
            | RuleCategory::Competency
            | RuleCategory::Availability
            | RuleCategory::Workload => 0.0,
        }
    }
}
