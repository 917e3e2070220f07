//! User profile form fields.
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::forms::{FieldDef, FieldError, FieldSet};
use crate::validation::FieldRule;

pub const FIRST_NAME: &str = "first_name";
pub const LAST_NAME: &str = "last_name";
pub const PHONE: &str = "phone";

lazy_static! {
    static ref PHONE_PATTERN: Regex = match Regex::new(r"^\+7\d{10}$") {
        Ok(re) => re,
        Err(e) => panic!("invalid phone pattern: {e}"),
    };
}

/// Stored profile values.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

pub fn profile_fields(current: &UserProfile) -> Result<FieldSet, FieldError> {
    FieldSet::with_values(
        vec![
            FieldDef::new(FIRST_NAME, "first_name", FieldRule::required().length(2, 20)),
            FieldDef::new(LAST_NAME, "last_name", FieldRule::required().length(2, 20)),
            FieldDef::new(
                PHONE,
                "phone",
                FieldRule::required().pattern(
                    PHONE_PATTERN.clone(),
                    "Введите номер в международном формате (например, +79001234567)",
                ),
            ),
        ],
        [
            (FIRST_NAME, current.first_name.clone()),
            (LAST_NAME, current.last_name.clone()),
            (PHONE, current.phone.clone()),
        ],
    )
}
