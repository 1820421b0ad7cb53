//! Engine configuration and the rule parameter bag.
//!
//! Load engine settings from TOML to tune search effort, reproducibility,
//! and per-rule thresholds without code changes. Every threshold the
//! gate and the evaluators use is read from the [`RuleParameters`] bag
//! carried by the context; nothing else in the crate hard-codes them.
//! A `[rules]` table here replaces that bag for every run of the engine.
//!
//! # Examples
//!
//! ```
//! use u_roster::config::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     local_search_iterations = 200
//!     random_seed = 7
//!     profile = "fair"
//!
//!     [rules]
//!     min_rest_hours = 11.0
//!     enabled_rules = ["rest-hours", "overtime"]
//! "#).unwrap();
//!
//! assert_eq!(config.local_search_iterations, 200);
//! assert_eq!(config.random_seed, Some(7));
//! let rules = config.rules.unwrap();
//! assert!((rules.min_rest_hours - 11.0).abs() < 1e-10);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rules::RuleId;
use crate::scoring::ProfileKind;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Local-search swap attempts.
    pub local_search_iterations: usize,
    /// Ceiling on repair passes. Repair stops early when a pass makes no
    /// progress, so this bounds work rather than forcing it.
    pub repair_passes: usize,
    /// Seed for local-search randomness. `None` seeds from the OS.
    pub random_seed: Option<u64>,
    /// Unassigned staff sampled when explaining an unfilled slot.
    pub rejection_sample_size: usize,
    /// Reasons kept per understaffed shift.
    pub max_rejection_reasons: usize,
    /// Weight profile for single-profile runs.
    pub profile: ProfileKind,
    /// Rule thresholds that replace the context's bag. `None` keeps the
    /// bag the context was built with.
    pub rules: Option<RuleParameters>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            local_search_iterations: 500,
            repair_passes: 3,
            random_seed: None,
            rejection_sample_size: 25,
            max_rejection_reasons: 3,
            profile: ProfileKind::Balanced,
            rules: None,
        }
    }
}

impl EngineConfig {
    /// Creates a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist, contains invalid TOML, or
    /// holds out-of-range values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the local-search iteration budget.
    pub fn with_local_search_iterations(mut self, iterations: usize) -> Self {
        self.local_search_iterations = iterations;
        self
    }

    /// Sets the repair pass ceiling.
    pub fn with_repair_passes(mut self, passes: usize) -> Self {
        self.repair_passes = passes;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Sets the weight profile.
    pub fn with_profile(mut self, profile: ProfileKind) -> Self {
        self.profile = profile;
        self
    }

    /// Replaces the context's rule parameters on every run.
    pub fn with_rules(mut self, rules: RuleParameters) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(rules) = &self.rules {
            rules.validate()?;
        }
        if self.max_rejection_reasons == 0 {
            return Err(ConfigError::Invalid(
                "max_rejection_reasons must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Per-rule thresholds and rule selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleParameters {
    /// Minimum rest between two shifts (hours).
    pub min_rest_hours: f64,
    /// Hard cap on consecutive working days.
    pub max_consecutive_days: u32,
    /// Hard cap on hours in any rolling 7-day window.
    pub max_rolling_hours: f64,
    /// Weekly hours above which work is actual overtime.
    pub overtime_threshold_hours: f64,
    /// Minimum competency level on ICU/ER-class units.
    pub min_critical_care_level: u8,
    /// Holiday-count deviation from the staff average tolerated before
    /// a fairness penalty applies.
    pub holiday_fairness_tolerance: f64,
    /// Rule ids to evaluate. `None` evaluates every registered rule.
    pub enabled_rules: Option<Vec<String>>,
}

impl Default for RuleParameters {
    fn default() -> Self {
        Self {
            min_rest_hours: 10.0,
            max_consecutive_days: 5,
            max_rolling_hours: 60.0,
            overtime_threshold_hours: 40.0,
            min_critical_care_level: 2,
            holiday_fairness_tolerance: 1.0,
            enabled_rules: None,
        }
    }
}

impl RuleParameters {
    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_rest_hours >= 0.0) {
            return Err(ConfigError::Invalid("min_rest_hours must be >= 0".into()));
        }
        if self.max_consecutive_days == 0 {
            return Err(ConfigError::Invalid(
                "max_consecutive_days must be at least 1".into(),
            ));
        }
        if !(self.max_rolling_hours > 0.0) {
            return Err(ConfigError::Invalid("max_rolling_hours must be > 0".into()));
        }
        if !(self.overtime_threshold_hours > 0.0) {
            return Err(ConfigError::Invalid(
                "overtime_threshold_hours must be > 0".into(),
            ));
        }
        if !(1..=5).contains(&self.min_critical_care_level) {
            return Err(ConfigError::Invalid(
                "min_critical_care_level must be between 1 and 5".into(),
            ));
        }
        for id in self.enabled_rules.iter().flatten() {
            id.parse::<RuleId>()
                .map_err(|e| ConfigError::Invalid(format!("enabled_rules: {e}")))?;
        }
        Ok(())
    }

    /// Whether `rule_id` is selected.
    pub fn is_enabled(&self, rule_id: &str) -> bool {
        self.enabled_rules
            .as_ref()
            .map_or(true, |ids| ids.iter().any(|id| id == rule_id))
    }
}
