//! Read-only policy inputs: census bands, unit policy, leave, holidays.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Patient-count band mapping census to required staffing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CensusBand {
    /// Unit the band applies to; `None` applies to every unit.
    #[serde(default)]
    pub unit: Option<String>,
    /// Lowest patient count in the band (inclusive).
    pub min_patients: u32,
    /// Highest patient count in the band (inclusive).
    pub max_patients: u32,
    /// Required RNs.
    #[serde(default)]
    pub required_rns: u32,
    /// Required LPNs.
    #[serde(default)]
    pub required_lpns: u32,
    /// Required CNAs.
    #[serde(default)]
    pub required_cnas: u32,
    /// Maximum patients per licensed nurse.
    pub patients_per_nurse: f64,
}

impl CensusBand {
    /// Creates a band for all units.
    pub fn new(min_patients: u32, max_patients: u32, patients_per_nurse: f64) -> Self {
        Self {
            unit: None,
            min_patients,
            max_patients,
            required_rns: 0,
            required_lpns: 0,
            required_cnas: 0,
            patients_per_nurse,
        }
    }

    /// Restricts the band to a unit.
    pub fn for_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Sets required counts per role.
    pub fn with_staffing(mut self, rns: u32, lpns: u32, cnas: u32) -> Self {
        self.required_rns = rns;
        self.required_lpns = lpns;
        self.required_cnas = cnas;
        self
    }

    /// Total headcount the band requires.
    pub fn required_total(&self) -> u32 {
        self.required_rns + self.required_lpns + self.required_cnas
    }

    /// Whether the band covers `census` on `unit`.
    pub fn matches(&self, unit: &str, census: u32) -> bool {
        let unit_ok = self.unit.as_deref().map_or(true, |u| u == unit);
        unit_ok && census >= self.min_patients && census <= self.max_patients
    }
}

/// Unit policy as stored upstream; every field optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitPolicyRecord {
    #[serde(default)]
    pub max_on_call_per_week: Option<u32>,
    #[serde(default)]
    pub max_on_call_weekends_per_month: Option<u32>,
    #[serde(default)]
    pub max_consecutive_weekends: Option<u32>,
    #[serde(default)]
    pub weekend_shifts_required: Option<u32>,
    #[serde(default, alias = "holidays_required_per_year")]
    pub max_holidays_per_year: Option<u32>,
}

/// Fully resolved unit policy. Defaults are applied once, when the
/// context is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitPolicy {
    /// On-call shifts allowed per calendar week.
    pub max_on_call_per_week: u32,
    /// Distinct on-call weekends allowed per calendar month.
    pub max_on_call_weekends_per_month: u32,
    /// Longest allowed run of consecutive worked weekends.
    pub max_consecutive_weekends: u32,
    /// Weekend shifts each staff member is expected to work per period.
    pub weekend_shifts_required: u32,
    /// Holidays a staff member may work per year; each one beyond it is
    /// penalized regardless of the staff average.
    pub max_holidays_per_year: Option<u32>,
}

impl Default for UnitPolicy {
    fn default() -> Self {
        Self {
            max_on_call_per_week: 1,
            max_on_call_weekends_per_month: 1,
            max_consecutive_weekends: 2,
            weekend_shifts_required: 3,
            max_holidays_per_year: None,
        }
    }
}

impl UnitPolicy {
    /// Resolves an optional upstream record against the defaults.
    pub fn resolve(record: Option<&UnitPolicyRecord>) -> Self {
        let defaults = Self::default();
        let Some(r) = record else {
            return defaults;
        };
        Self {
            max_on_call_per_week: r
                .max_on_call_per_week
                .unwrap_or(defaults.max_on_call_per_week),
            max_on_call_weekends_per_month: r
                .max_on_call_weekends_per_month
                .unwrap_or(defaults.max_on_call_weekends_per_month),
            max_consecutive_weekends: r
                .max_consecutive_weekends
                .unwrap_or(defaults.max_consecutive_weekends),
            weekend_shifts_required: r
                .weekend_shifts_required
                .unwrap_or(defaults.weekend_shifts_required),
            max_holidays_per_year: r.max_holidays_per_year,
        }
    }
}

/// Leave approval state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Approved,
    Pending,
}

/// A leave interval, inclusive on both ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffLeave {
    pub staff_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
}

impl StaffLeave {
    /// Creates an approved leave interval.
    pub fn approved(staff_id: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            staff_id: staff_id.into(),
            start_date,
            end_date,
            status: LeaveStatus::Approved,
        }
    }

    /// Creates a pending leave interval.
    pub fn pending(staff_id: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            status: LeaveStatus::Pending,
            ..Self::approved(staff_id, start_date, end_date)
        }
    }

    /// Approved and covering `date`.
    pub fn blocks(&self, date: NaiveDate) -> bool {
        self.status == LeaveStatus::Approved && self.start_date <= date && date <= self.end_date
    }
}

/// A public holiday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicHoliday {
    pub date: NaiveDate,
    pub name: String,
    /// Explicit fairness group; overrides name-based grouping.
    #[serde(default)]
    pub group: Option<String>,
}

impl PublicHoliday {
    /// Creates a holiday.
    pub fn new(date: NaiveDate, name: impl Into<String>) -> Self {
        Self {
            date,
            name: name.into(),
            group: None,
        }
    }

    /// Sets an explicit fairness group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Fairness group key. Christmas Eve/Day merge into "Christmas" and
    /// New Year's Eve/Day into "New Year", keyed by the year the group
    /// belongs to.
    pub fn group_key(&self) -> (i32, String) {
        if let Some(g) = &self.group {
            return (self.date.year(), g.clone());
        }
        let lower = self.name.to_ascii_lowercase();
        if lower.contains("christmas") {
            (self.date.year(), "Christmas".to_string())
        } else if lower.contains("new year") {
            // Dec 31 belongs to the following year's New Year group
            let year = if self.date.month() == 12 {
                self.date.year() + 1
            } else {
                self.date.year()
            };
            (year, "New Year".to_string())
        } else {
            (self.date.year(), self.name.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_policy_defaults() {
        let p = UnitPolicy::resolve(None);
        assert_eq!(p.max_on_call_per_week, 1);
        assert_eq!(p.max_on_call_weekends_per_month, 1);
        assert_eq!(p.max_consecutive_weekends, 2);
        assert_eq!(p.weekend_shifts_required, 3);
    }

    #[test]
    fn test_policy_partial_override() {
        let record = UnitPolicyRecord {
            max_on_call_per_week: Some(2),
            ..Default::default()
        };
        let p = UnitPolicy::resolve(Some(&record));
        assert_eq!(p.max_on_call_per_week, 2);
        assert_eq!(p.max_consecutive_weekends, 2);
    }

    #[test]
    fn test_holiday_cap_accepts_legacy_key() {
        let record: UnitPolicyRecord =
            serde_json::from_str(r#"{"holidays_required_per_year": 4}"#).unwrap();
        assert_eq!(UnitPolicy::resolve(Some(&record)).max_holidays_per_year, Some(4));
    }

    #[test]
    fn test_census_band_matching() {
        let band = CensusBand::new(10, 20, 4.0).for_unit("ICU");
        assert!(band.matches("ICU", 10));
        assert!(band.matches("ICU", 20));
        assert!(!band.matches("ICU", 21));
        assert!(!band.matches("ER", 15));
        assert!(CensusBand::new(0, 5, 5.0).matches("anything", 3));
    }

    #[test]
    fn test_leave_blocks_only_when_approved() {
        let approved = StaffLeave::approved("N1", d(2024, 3, 4), d(2024, 3, 6));
        let pending = StaffLeave::pending("N1", d(2024, 3, 4), d(2024, 3, 6));
        assert!(approved.blocks(d(2024, 3, 6)));
        assert!(!approved.blocks(d(2024, 3, 7)));
        assert!(!pending.blocks(d(2024, 3, 5)));
    }

    #[test]
    fn test_holiday_grouping() {
        let eve = PublicHoliday::new(d(2024, 12, 24), "Christmas Eve");
        let day = PublicHoliday::new(d(2024, 12, 25), "Christmas Day");
        assert_eq!(eve.group_key(), day.group_key());

        let nye = PublicHoliday::new(d(2024, 12, 31), "New Year's Eve");
        let nyd = PublicHoliday::new(d(2025, 1, 1), "New Year's Day");
        assert_eq!(nye.group_key(), nyd.group_key());

        let custom = PublicHoliday::new(d(2024, 7, 4), "Independence Day").with_group("Summer");
        assert_eq!(custom.group_key().1, "Summer");
    }
}
