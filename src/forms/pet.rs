//! Pet profile form fields.
use serde::{Deserialize, Serialize};

use crate::forms::{FieldDef, FieldError, FieldSet};
use crate::validation::FieldRule;

pub const NAME: &str = "name";
pub const BREED: &str = "breed";
pub const AGE: &str = "age";
pub const COLOR: &str = "color";
pub const DESCRIPTION: &str = "description";

pub const MIN_AGE: i64 = 1;
pub const MAX_AGE: i64 = 30;

/// Stored pet values, used to prefill the edit form.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PetDetails {
    pub name: String,
    pub breed: String,
    pub age: String,
    pub color: String,
    pub description: String,
}

fn age_rule() -> FieldRule {
    FieldRule::required()
        .integer_range(MIN_AGE, MAX_AGE)
        .bound_messages(
            format!("Возраст не может быть меньше {MIN_AGE}"),
            format!("Максимальный возраст: {MAX_AGE}"),
        )
}

fn defs(names: [&'static str; 5]) -> Vec<FieldDef> {
    let [name, breed, age, color, description] = names;
    vec![
        FieldDef::new(NAME, name, FieldRule::required().length(2, 15)),
        FieldDef::new(BREED, breed, FieldRule::required().length(2, 50)),
        FieldDef::new(AGE, age, age_rule()),
        FieldDef::new(COLOR, color, FieldRule::required().length(2, 30)),
        FieldDef::new(DESCRIPTION, description, FieldRule::required().length(10, 200)),
    ]
}

/// Fields of the "add pet" page.
pub fn create_fields() -> FieldSet {
    FieldSet::new(defs([
        "pet_name",
        "pet_breed",
        "pet_age",
        "pet_color",
        "pet_description",
    ]))
}

/// Fields of the "edit pet" page, prefilled from stored values.
pub fn edit_fields(current: &PetDetails) -> Result<FieldSet, FieldError> {
    FieldSet::with_values(
        defs(["name", "breed", "age", "color", "description"]),
        [
            (NAME, current.name.clone()),
            (BREED, current.breed.clone()),
            (AGE, current.age.clone()),
            (COLOR, current.color.clone()),
            (DESCRIPTION, current.description.clone()),
        ],
    )
}
