//! Unit classification.

/// Unit-name tokens that mark a unit as ICU/ER-class.
const CRITICAL_CARE_TOKENS: [&str; 4] = ["ICU", "ER", "ED", "EMERGENCY"];

/// Whether a unit is ICU/ER-class.
///
/// Matches whole words only, splitting on space, hyphen, and underscore:
/// `"ICU"`, `"Cardiac ICU"`, `"ER-North"` qualify, `"PICU"` and
/// `"Nursery"` do not.
pub fn is_critical_care_unit(unit: &str) -> bool {
    unit.split([' ', '-', '_'])
        .filter(|token| !token.is_empty())
        .any(|token| {
            CRITICAL_CARE_TOKENS
                .iter()
                .any(|kw| token.eq_ignore_ascii_case(kw))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_names() {
        assert!(is_critical_care_unit("ICU"));
        assert!(is_critical_care_unit("ER"));
        assert!(is_critical_care_unit("ED"));
        assert!(is_critical_care_unit("Emergency"));
    }

    #[test]
    fn test_word_boundaries() {
        assert!(is_critical_care_unit("Cardiac ICU"));
        assert!(is_critical_care_unit("ER-North"));
        assert!(is_critical_care_unit("main_ed"));
        assert!(!is_critical_care_unit("PICU"));
        assert!(!is_critical_care_unit("Nursery"));
        assert!(!is_critical_care_unit("MedSurg"));
        assert!(!is_critical_care_unit(""));
    }
}
