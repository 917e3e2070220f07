//! Per-form field sets: values, touched tracking and edit snapshots.
use thiserror::Error;

use crate::validation::{FieldCheck, FieldRule, parse_integer, validate};

pub mod health;
pub mod pet;
pub mod report;
pub mod user;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("unknown form field `{0}`")]
    Unknown(String),
}

/// Static description of a form field.
#[derive(Clone, Debug)]
pub struct FieldDef {
    pub key: &'static str,
    pub backend_name: &'static str,
    pub rule: FieldRule,
}

impl FieldDef {
    pub fn new(key: &'static str, backend_name: &'static str, rule: FieldRule) -> Self {
        Self {
            key,
            backend_name,
            rule,
        }
    }
}

/// Live state of a field. `error_message` stays empty until the field is touched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldState {
    pub value: String,
    pub touched: bool,
    pub valid: bool,
    pub error_message: String,
}

#[derive(Clone, Debug)]
struct Field {
    def: FieldDef,
    state: FieldState,
}

impl Field {
    fn revalidate(&mut self) -> FieldCheck {
        let check = validate(&self.state.value, &self.def.rule);
        self.state.valid = check.ok;
        self.state.error_message = if self.state.touched {
            check.message.clone()
        } else {
            String::new()
        };
        check
    }
}

/// Ordered collection of fields belonging to one form instance.
#[derive(Clone, Debug)]
pub struct FieldSet {
    fields: Vec<Field>,
    original: Vec<String>,
}

impl FieldSet {
    /// Empty form, as shown on a create page.
    pub fn new(defs: Vec<FieldDef>) -> Self {
        let mut set = Self {
            fields: defs
                .into_iter()
                .map(|def| Field {
                    def,
                    state: FieldState::default(),
                })
                .collect(),
            original: Vec::new(),
        };
        set.revalidate_all();
        set.commit();
        set
    }

    /// Form prefilled with stored values; the values become the edit snapshot.
    pub fn with_values<'a>(
        defs: Vec<FieldDef>,
        values: impl IntoIterator<Item = (&'a str, String)>,
    ) -> Result<Self, FieldError> {
        let mut set = Self::new(defs);
        for (key, value) in values {
            set.field_mut(key)?.state.value = value;
        }
        set.revalidate_all();
        set.commit();
        Ok(set)
    }

    fn field(&self, key: &str) -> Result<&Field, FieldError> {
        self.fields
            .iter()
            .find(|f| f.def.key == key)
            .ok_or_else(|| FieldError::Unknown(key.to_string()))
    }

    fn field_mut(&mut self, key: &str) -> Result<&mut Field, FieldError> {
        self.fields
            .iter_mut()
            .find(|f| f.def.key == key)
            .ok_or_else(|| FieldError::Unknown(key.to_string()))
    }

    fn revalidate_all(&mut self) {
        for field in &mut self.fields {
            field.revalidate();
        }
    }

    /// User typed into a field.
    pub fn input(
        &mut self,
        key: &str,
        value: impl Into<String>,
    ) -> Result<&FieldState, FieldError> {
        let field = self.field_mut(key)?;
        field.state.value = value.into();
        field.state.touched = true;
        field.revalidate();
        Ok(&field.state)
    }

    /// Field lost focus.
    pub fn blur(&mut self, key: &str) -> Result<&FieldState, FieldError> {
        let field = self.field_mut(key)?;
        field.state.touched = true;
        field.revalidate();
        Ok(&field.state)
    }

    pub fn state(&self, key: &str) -> Result<&FieldState, FieldError> {
        self.field(key).map(|f| &f.state)
    }

    pub fn value(&self, key: &str) -> Result<&str, FieldError> {
        self.field(key).map(|f| f.state.value.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.def.key)
    }

    /// Every field passes its rule, touched or not.
    pub fn is_valid(&self) -> bool {
        self.fields.iter().all(|f| f.state.valid)
    }

    pub fn is_touched(&self) -> bool {
        self.fields.iter().any(|f| f.state.touched)
    }

    /// Mark every field touched and return the failing ones with their messages.
    pub fn force_validate(&mut self) -> Vec<(&'static str, String)> {
        let mut errors = Vec::new();
        for field in &mut self.fields {
            field.state.touched = true;
            let check = field.revalidate();
            if !check.ok {
                errors.push((field.def.key, check.message));
            }
        }
        errors
    }

    /// Any value differs (ignoring surrounding whitespace) from the snapshot.
    pub fn has_changes(&self) -> bool {
        self.fields
            .iter()
            .zip(&self.original)
            .any(|(field, original)| field.state.value.trim() != original.trim())
    }

    pub fn changed_keys(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .zip(&self.original)
            .filter(|(field, original)| field.state.value.trim() != original.trim())
            .map(|(field, _)| field.def.key)
            .collect()
    }

    /// Take the current values as the new snapshot.
    pub fn commit(&mut self) {
        self.original = self.fields.iter().map(|f| f.state.value.clone()).collect();
    }

    /// Restore snapshot values and clear touched flags.
    pub fn reset(&mut self) {
        for (field, original) in self.fields.iter_mut().zip(&self.original) {
            field.state.value = original.clone();
            field.state.touched = false;
        }
        self.revalidate_all();
    }

    /// Text parts for the multipart body, keyed by backend field names.
    pub fn text_parts(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|field| {
                let value = field.state.value.trim();
                let value = if field.def.rule.is_integer() {
                    parse_integer(value)
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| value.to_string())
                } else {
                    value.to_string()
                };
                (field.def.backend_name.to_string(), value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs() -> Vec<FieldDef> {
        vec![
            FieldDef::new("name", "pet_name", FieldRule::required().length(2, 15)),
            FieldDef::new("age", "pet_age", FieldRule::required().integer_range(1, 30)),
            FieldDef::new("note", "note", FieldRule::optional().length(0, 10)),
        ]
    }

    #[test]
    fn untouched_required_field_is_invalid_but_silent() {
        let set = FieldSet::new(defs());
        let state = set.state("name").unwrap();

        assert!(!state.valid);
        assert!(!state.touched);
        assert!(state.error_message.is_empty());
        assert!(!set.is_valid());
    }

    #[test]
    fn touched_empty_required_field_shows_message() {
        let mut set = FieldSet::new(defs());
        let state = set.input("name", "").unwrap();

        assert!(state.touched);
        assert_eq!(state.error_message, "Это поле обязательно");
    }

    #[test]
    fn blur_marks_touched() {
        let mut set = FieldSet::new(defs());
        let state = set.blur("age").unwrap();

        assert!(state.touched);
        assert!(!state.error_message.is_empty());
    }

    #[test]
    fn force_validate_reports_every_failure() {
        let mut set = FieldSet::new(defs());
        set.input("name", "Рекс").unwrap();

        let errors = set.force_validate();
        assert_eq!(errors, vec![("age", "Это поле обязательно".to_string())]);
        assert!(set.state("note").unwrap().touched);
    }

    #[test]
    fn unknown_field_is_an_error() {
        let mut set = FieldSet::new(defs());
        assert_eq!(
            set.input("colour", "red").unwrap_err(),
            FieldError::Unknown("colour".into())
        );
    }

    #[test]
    fn snapshot_tracks_changes() {
        let mut set = FieldSet::with_values(
            defs(),
            [("name", "Рекс".to_string()), ("age", "3".to_string())],
        )
        .unwrap();
        assert!(set.is_valid());
        assert!(!set.has_changes());

        set.input("age", " 3 ").unwrap();
        assert!(!set.has_changes());

        set.input("age", "4").unwrap();
        assert_eq!(set.changed_keys(), vec!["age"]);

        set.commit();
        assert!(!set.has_changes());

        set.input("name", "Бим").unwrap();
        set.reset();
        assert_eq!(set.value("name").unwrap(), "Рекс");
        assert!(!set.is_touched());
    }

    #[test]
    fn text_parts_use_backend_names_and_normalize_integers() {
        let mut set = FieldSet::new(defs());
        set.input("name", "  Рекс ").unwrap();
        set.input("age", "7.0").unwrap();

        let parts = set.text_parts();
        assert_eq!(
            parts,
            vec![
                ("pet_name".to_string(), "Рекс".to_string()),
                ("pet_age".to_string(), "7".to_string()),
                ("note".to_string(), String::new()),
            ]
        );
    }
}
