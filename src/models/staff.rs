//! Staff model.
//!
//! Staff members are the resources a roster assigns: registered nurses,
//! licensed practical nurses, and nursing assistants. Each carries a
//! competency level, an FTE that drives standard weekly hours, and an
//! optional preference block.
//!
//! # Reference
//! Burke et al. (2004), "The State of the Art of Nurse Rostering", §2

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::ShiftType;

/// Hours in a full-time (1.0 FTE) working week.
pub const FULL_TIME_WEEKLY_HOURS: f64 = 40.0;

/// Lowest competency level.
pub const MIN_COMPETENCY_LEVEL: u8 = 1;

/// Highest (preceptor-capable) competency level.
pub const MAX_COMPETENCY_LEVEL: u8 = 5;

/// Minimum competency level for holding the charge role.
pub const CHARGE_MIN_LEVEL: u8 = 4;

/// A staff member available to the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    /// Unique staff identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Licensure role.
    pub role: StaffRole,
    /// Contract type.
    pub employment_type: EmploymentType,
    /// Competency level (1 = novice, 5 = expert/preceptor).
    pub competency_level: u8,
    /// Whether this person may be designated charge nurse.
    #[serde(default)]
    pub charge_qualified: bool,
    /// Fractional full-time equivalent (1.0 = 40h/week).
    pub fte: f64,
    /// Unit this person normally works on.
    pub home_unit: String,
    /// Other units this person is trained to float to.
    #[serde(default)]
    pub cross_trained_units: Vec<String>,
    /// Exempt from the weekend rotation.
    #[serde(default)]
    pub weekend_exempt: bool,
    /// Inactive staff are never assigned.
    #[serde(default = "default_true")]
    pub active: bool,
    /// Personal scheduling preferences.
    #[serde(default)]
    pub preferences: Option<StaffPreferences>,
}

/// Licensure role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StaffRole {
    /// Registered nurse.
    Rn,
    /// Licensed practical nurse.
    Lpn,
    /// Certified nursing assistant.
    Cna,
}

/// Contract type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    /// PRN staff, workable only on dates they marked available.
    PerDiem,
    /// Internal float pool.
    Float,
    /// External agency staff.
    Agency,
}

/// Personal scheduling preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffPreferences {
    /// Preferred shift type.
    #[serde(default)]
    pub preferred_shift_type: Option<ShiftType>,
    /// Weekdays this person would rather not work.
    #[serde(default)]
    pub preferred_days_off: Vec<Weekday>,
    /// Prefers not to work Saturdays and Sundays.
    #[serde(default)]
    pub avoid_weekends: bool,
    /// Personal cap on consecutive working days.
    #[serde(default)]
    pub max_consecutive_days: Option<u32>,
    /// Personal cap on weekly hours.
    #[serde(default)]
    pub max_hours_per_week: Option<f64>,
}

fn default_true() -> bool {
    true
}

impl Staff {
    /// Creates an active full-time RN at level 3 on the given home unit.
    pub fn new(id: impl Into<String>, home_unit: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            role: StaffRole::Rn,
            employment_type: EmploymentType::FullTime,
            competency_level: 3,
            charge_qualified: false,
            fte: 1.0,
            home_unit: home_unit.into(),
            cross_trained_units: Vec::new(),
            weekend_exempt: false,
            active: true,
            preferences: None,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the licensure role.
    pub fn with_role(mut self, role: StaffRole) -> Self {
        self.role = role;
        self
    }

    /// Sets the employment type.
    pub fn with_employment(mut self, employment_type: EmploymentType) -> Self {
        self.employment_type = employment_type;
        self
    }

    /// Sets the competency level, clamped to 1–5.
    pub fn with_level(mut self, level: u8) -> Self {
        self.competency_level = level.clamp(MIN_COMPETENCY_LEVEL, MAX_COMPETENCY_LEVEL);
        self
    }

    /// Marks this person as charge-qualified.
    pub fn with_charge_qualification(mut self) -> Self {
        self.charge_qualified = true;
        self
    }

    /// Sets the FTE.
    pub fn with_fte(mut self, fte: f64) -> Self {
        self.fte = fte;
        self
    }

    /// Adds a cross-trained unit.
    pub fn with_cross_training(mut self, unit: impl Into<String>) -> Self {
        self.cross_trained_units.push(unit.into());
        self
    }

    /// Exempts this person from the weekend rotation.
    pub fn with_weekend_exemption(mut self) -> Self {
        self.weekend_exempt = true;
        self
    }

    /// Sets the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Sets the preference block.
    pub fn with_preferences(mut self, preferences: StaffPreferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    /// Standard (non-overtime) weekly hours: FTE × 40.
    #[inline]
    pub fn standard_weekly_hours(&self) -> f64 {
        self.fte * FULL_TIME_WEEKLY_HOURS
    }

    /// RNs and LPNs count as licensed staff for ratio purposes.
    #[inline]
    pub fn is_licensed(&self) -> bool {
        matches!(self.role, StaffRole::Rn | StaffRole::Lpn)
    }

    /// Charge-qualified and at least level 4.
    #[inline]
    pub fn can_take_charge(&self) -> bool {
        self.charge_qualified && self.competency_level >= CHARGE_MIN_LEVEL
    }

    /// PRN staff need explicit availability.
    #[inline]
    pub fn is_per_diem(&self) -> bool {
        self.employment_type == EmploymentType::PerDiem
    }

    /// Whether this person is cross-trained for (or based on) `unit`.
    pub fn is_trained_for(&self, unit: &str) -> bool {
        self.home_unit == unit || self.cross_trained_units.iter().any(|u| u == unit)
    }

    /// Personal consecutive-day cap, if any.
    pub fn preferred_max_consecutive_days(&self) -> Option<u32> {
        self.preferences
            .as_ref()
            .and_then(|p| p.max_consecutive_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_builder() {
        let s = Staff::new("N1", "MedSurg")
            .with_name("Nurse One")
            .with_role(StaffRole::Lpn)
            .with_employment(EmploymentType::PartTime)
            .with_level(4)
            .with_charge_qualification()
            .with_fte(0.8)
            .with_cross_training("ICU");

        assert_eq!(s.id, "N1");
        assert_eq!(s.role, StaffRole::Lpn);
        assert!(s.is_licensed());
        assert!(s.can_take_charge());
        assert!((s.standard_weekly_hours() - 32.0).abs() < 1e-10);
        assert!(s.is_trained_for("ICU"));
        assert!(s.is_trained_for("MedSurg"));
        assert!(!s.is_trained_for("ER"));
    }

    #[test]
    fn test_level_clamping() {
        assert_eq!(Staff::new("a", "U").with_level(0).competency_level, 1);
        assert_eq!(Staff::new("b", "U").with_level(9).competency_level, 5);
    }

    #[test]
    fn test_charge_requires_level_four() {
        let s = Staff::new("N1", "U").with_level(3).with_charge_qualification();
        assert!(!s.can_take_charge());
    }

    #[test]
    fn test_cna_not_licensed() {
        let s = Staff::new("C1", "U").with_role(StaffRole::Cna);
        assert!(!s.is_licensed());
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{
            "id": "N9",
            "role": "RN",
            "employment_type": "per_diem",
            "competency_level": 2,
            "fte": 0.5,
            "home_unit": "ER"
        }"#;
        let s: Staff = serde_json::from_str(json).unwrap();
        assert!(s.active);
        assert!(s.is_per_diem());
        assert!(s.preferences.is_none());
    }
}
