use regex::Regex;
use std::sync::LazyLock;

use super::{ContactForm, FieldKind};

pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const EMAIL_MESSAGE: &str = "Please enter a valid email address";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// local@domain.tld with no whitespace and a single `@`.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValidationState {
    pub field: String,
    pub valid: bool,
    pub message: Option<String>,
}

impl FieldValidationState {
    fn valid(field: &str) -> Self {
        Self {
            field: field.to_string(),
            valid: true,
            message: None,
        }
    }

    fn invalid(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            valid: false,
            message: Some(message.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub states: Vec<FieldValidationState>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.states.iter().all(|s| s.valid)
    }

    pub fn state(&self, field: &str) -> Option<&FieldValidationState> {
        self.states.iter().find(|s| s.field == field)
    }

    pub fn invalid_fields(&self) -> impl Iterator<Item = &FieldValidationState> {
        self.states.iter().filter(|s| !s.valid)
    }

    pub fn is_invalid(&self, field: &str) -> bool {
        self.state(field).is_some_and(|s| !s.valid)
    }
}

/// Proof that a form passed validation. Only [`check`] hands these out.
#[derive(Debug)]
pub struct Validated<'a> {
    form: &'a ContactForm,
    result: ValidationResult,
}

impl<'a> Validated<'a> {
    pub fn form(&self) -> &'a ContactForm {
        self.form
    }

    pub fn result(&self) -> &ValidationResult {
        &self.result
    }
}

/// Evaluate every required field and every filled-in email field.
pub fn validate(form: &ContactForm) -> ValidationResult {
    let mut states = Vec::new();

    for field in form.fields() {
        let value = field.value.trim();
        let is_email = field.kind == FieldKind::Email;

        if !field.required && !(is_email && !value.is_empty()) {
            continue;
        }

        let state = if value.is_empty() {
            FieldValidationState::invalid(&field.name, REQUIRED_MESSAGE)
        } else if is_email && !is_valid_email(value) {
            FieldValidationState::invalid(&field.name, EMAIL_MESSAGE)
        } else {
            FieldValidationState::valid(&field.name)
        };
        states.push(state);
    }

    ValidationResult { states }
}

pub fn check(form: &ContactForm) -> Result<Validated<'_>, ValidationResult> {
    let result = validate(form);
    if result.is_valid() {
        Ok(Validated { form, result })
    } else {
        Err(result)
    }
}
