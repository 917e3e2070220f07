//! Lost/found report form fields.
use serde::{Deserialize, Serialize};

use crate::domain::PetId;
use crate::forms::{FieldDef, FieldError, FieldSet};
use crate::validation::FieldRule;

pub const TITLE: &str = "title";
pub const CONTENT: &str = "content";
pub const LOCATION: &str = "location";
pub const REGION: &str = "region";
pub const PET: &str = "pet_id";

/// Stored report values, used to prefill the edit form.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReportDetails {
    pub title: String,
    pub content: String,
}

/// Fields of the "create report" page. The pet is picked from a dropdown.
pub fn create_fields() -> FieldSet {
    FieldSet::new(vec![
        FieldDef::new(TITLE, "title", FieldRule::required().length(2, 50)),
        FieldDef::new(CONTENT, "content", FieldRule::required().length(10, 500)),
        FieldDef::new(LOCATION, "location", FieldRule::required().length(2, 100)),
        FieldDef::new(REGION, "region", FieldRule::required().length(2, 50)),
        FieldDef::new(PET, "pet_id", FieldRule::required()),
    ])
}

/// Record the dropdown choice.
pub fn select_pet(fields: &mut FieldSet, pet: PetId) -> Result<(), FieldError> {
    fields.input(PET, pet.to_string()).map(|_| ())
}

/// Fields of the "edit report" page.
pub fn edit_fields(current: &ReportDetails) -> Result<FieldSet, FieldError> {
    FieldSet::with_values(
        vec![
            FieldDef::new(TITLE, "title", FieldRule::required().length(5, 100)),
            FieldDef::new(CONTENT, "content", FieldRule::required().length(20, 1000)),
        ],
        [
            (TITLE, current.title.clone()),
            (CONTENT, current.content.clone()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_form_requires_pet_selection() {
        let mut fields = create_fields();
        fields.input(TITLE, "Потерялся пёс").unwrap();
        fields.input(CONTENT, "Убежал вечером возле парка").unwrap();
        fields.input(LOCATION, "Парк Горького").unwrap();
        fields.input(REGION, "Москва").unwrap();
        assert!(!fields.is_valid());

        select_pet(&mut fields, PetId::new(12)).unwrap();
        assert!(fields.is_valid());
        assert_eq!(fields.value(PET).unwrap(), "12");
    }

    #[test]
    fn edit_form_has_stricter_bounds() {
        let mut fields = edit_fields(&ReportDetails {
            title: "Нашлась кошка".into(),
            content: "Серая кошка сидит у подъезда".into(),
        })
        .unwrap();
        assert!(fields.is_valid());

        let state = fields.input(TITLE, "Кот").unwrap();
        assert_eq!(state.error_message, "Минимум 5 символа(ов)");
    }
}
