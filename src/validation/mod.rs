//! Declarative per-field validation rules with localized messages.
use regex::Regex;
use validator::ValidateLength;

pub const MSG_REQUIRED: &str = "Это поле обязательно";
pub const MSG_NOT_INTEGER: &str = "Должно быть целое число";
pub const MSG_BAD_FORMAT: &str = "Неверный формат";

/// Validation rule attached to a single named field.
#[derive(Clone, Debug, Default)]
pub struct FieldRule {
    required: bool,
    min_length: Option<u64>,
    max_length: Option<u64>,
    min_value: Option<i64>,
    max_value: Option<i64>,
    integer: bool,
    pattern: Option<Regex>,
    pattern_message: Option<String>,
    below_min_message: Option<String>,
    above_max_message: Option<String>,
}

impl FieldRule {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn optional() -> Self {
        Self::default()
    }

    /// Character-count bounds for text fields.
    pub fn length(mut self, min: u64, max: u64) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    /// Inclusive integer bounds for numeric fields.
    pub fn integer_range(mut self, min: i64, max: i64) -> Self {
        self.integer = true;
        self.min_value = Some(min);
        self.max_value = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: Regex, message: impl Into<String>) -> Self {
        self.pattern = Some(pattern);
        self.pattern_message = Some(message.into());
        self
    }

    /// Override the messages shown for out-of-range numbers.
    pub fn bound_messages(
        mut self,
        below_min: impl Into<String>,
        above_max: impl Into<String>,
    ) -> Self {
        self.below_min_message = Some(below_min.into());
        self.above_max_message = Some(above_max.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_integer(&self) -> bool {
        self.integer
    }

    fn is_numeric(&self) -> bool {
        self.integer || self.min_value.is_some() || self.max_value.is_some()
    }
}

/// Result of checking one value against one rule. An empty message means valid.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldCheck {
    pub ok: bool,
    pub message: String,
}

impl FieldCheck {
    fn pass() -> Self {
        Self {
            ok: true,
            message: String::new(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Check a raw input value against a rule. Surrounding whitespace is ignored.
pub fn validate(value: &str, rule: &FieldRule) -> FieldCheck {
    let value = value.trim();

    if value.is_empty() {
        return if rule.required {
            FieldCheck::fail(MSG_REQUIRED)
        } else {
            FieldCheck::pass()
        };
    }

    if let Some(pattern) = &rule.pattern {
        if !pattern.is_match(value) {
            let message = rule.pattern_message.as_deref().unwrap_or(MSG_BAD_FORMAT);
            return FieldCheck::fail(message);
        }
    }

    if rule.is_numeric() {
        check_number(value, rule)
    } else {
        check_length(value, rule)
    }
}

fn check_number(value: &str, rule: &FieldRule) -> FieldCheck {
    let number = match parse_integer(value) {
        Some(number) => number,
        None if rule.integer => return FieldCheck::fail(MSG_NOT_INTEGER),
        None => return FieldCheck::fail(MSG_BAD_FORMAT),
    };

    if let Some(min) = rule.min_value {
        if number < min {
            return FieldCheck::fail(
                rule.below_min_message
                    .clone()
                    .unwrap_or_else(|| format!("Минимальное значение: {min}")),
            );
        }
    }
    if let Some(max) = rule.max_value {
        if number > max {
            return FieldCheck::fail(
                rule.above_max_message
                    .clone()
                    .unwrap_or_else(|| format!("Максимальное значение: {max}")),
            );
        }
    }

    FieldCheck::pass()
}

fn check_length(value: &str, rule: &FieldRule) -> FieldCheck {
    if let Some(min) = rule.min_length {
        if !value.validate_length(Some(min), None, None) {
            return FieldCheck::fail(format!("Минимум {min} символа(ов)"));
        }
    }
    if let Some(max) = rule.max_length {
        if !value.validate_length(None, Some(max), None) {
            return FieldCheck::fail(format!("Максимум {max} символа(ов)"));
        }
    }

    FieldCheck::pass()
}

/// Parse a whole number, accepting forms like `7`, `+7` and `7.0`.
///
/// Fractional, non-finite and non-numeric input yields `None`.
pub fn parse_integer(value: &str) -> Option<i64> {
    if let Ok(number) = value.parse::<i64>() {
        return Some(number);
    }

    let number = value.parse::<f64>().ok()?;
    if !number.is_finite() || number.fract() != 0.0 {
        return None;
    }
    if number < i64::MIN as f64 || number > i64::MAX as f64 {
        return None;
    }
    Some(number as i64)
}
