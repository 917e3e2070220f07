//! Pet health form: vaccination and treatment dates.
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::forms::{FieldDef, FieldError, FieldSet};
use crate::validation::FieldRule;

pub const LAST_VACCINATION: &str = "last_vaccination";
pub const NEXT_VACCINATION: &str = "next_vaccination";
pub const LAST_PARASITE_TREATMENT: &str = "last_parasite_treatment";
pub const NEXT_PARASITE_TREATMENT: &str = "next_parasite_treatment";
pub const LAST_FLEAS_TICKS_TREATMENT: &str = "last_fleas_ticks_treatment";
pub const NEXT_FLEAS_TICKS_TREATMENT: &str = "next_fleas_ticks_treatment";

const DATE_MESSAGE: &str = "Введите дату в формате ГГГГ-ММ-ДД";

lazy_static! {
    static ref DATE_PATTERN: Regex =
        match Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$") {
            Ok(re) => re,
            Err(e) => panic!("invalid date pattern: {e}"),
        };
}

/// Stored health dates. Empty strings are dates never recorded.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthRecord {
    pub last_vaccination: String,
    pub next_vaccination: String,
    pub last_parasite_treatment: String,
    pub next_parasite_treatment: String,
    pub last_fleas_ticks_treatment: String,
    pub next_fleas_ticks_treatment: String,
}

fn date(key: &'static str) -> FieldDef {
    FieldDef::new(
        key,
        key,
        FieldRule::optional().pattern(DATE_PATTERN.clone(), DATE_MESSAGE),
    )
}

/// Every field is optional; the backend keeps dates sent empty.
pub fn health_fields(current: &HealthRecord) -> Result<FieldSet, FieldError> {
    FieldSet::with_values(
        vec![
            date(LAST_VACCINATION),
            date(NEXT_VACCINATION),
            date(LAST_PARASITE_TREATMENT),
            date(NEXT_PARASITE_TREATMENT),
            date(LAST_FLEAS_TICKS_TREATMENT),
            date(NEXT_FLEAS_TICKS_TREATMENT),
        ],
        [
            (LAST_VACCINATION, current.last_vaccination.clone()),
            (NEXT_VACCINATION, current.next_vaccination.clone()),
            (LAST_PARASITE_TREATMENT, current.last_parasite_treatment.clone()),
            (NEXT_PARASITE_TREATMENT, current.next_parasite_treatment.clone()),
            (
                LAST_FLEAS_TICKS_TREATMENT,
                current.last_fleas_ticks_treatment.clone(),
            ),
            (
                NEXT_FLEAS_TICKS_TREATMENT,
                current.next_fleas_ticks_treatment.clone(),
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_are_optional_but_checked() {
        let mut fields = health_fields(&HealthRecord::default()).unwrap();
        assert!(fields.is_valid());

        let state = fields.input(NEXT_VACCINATION, "12.05.2025").unwrap();
        assert!(!state.valid);
        assert_eq!(state.error_message, DATE_MESSAGE);

        let state = fields.input(NEXT_VACCINATION, "2025-05-12").unwrap();
        assert!(state.valid);

        let state = fields.input(LAST_VACCINATION, "2025-13-01").unwrap();
        assert!(!state.valid);
    }

    #[test]
    fn stored_dates_form_the_snapshot() {
        let record = HealthRecord {
            last_vaccination: "2024-03-01".into(),
            ..HealthRecord::default()
        };
        let mut fields = health_fields(&record).unwrap();
        assert!(!fields.has_changes());

        fields.input(LAST_VACCINATION, " 2024-03-01 ").unwrap();
        assert!(!fields.has_changes());

        fields.input(NEXT_PARASITE_TREATMENT, "2024-09-01").unwrap();
        assert!(fields.has_changes());
        assert!(
            fields
                .text_parts()
                .contains(&("next_parasite_treatment".to_string(), "2024-09-01".to_string()))
        );
    }
}
