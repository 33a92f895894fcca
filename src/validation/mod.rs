//! Client-side form validation.
//!
//! Pre-submission checks shared by the login and profile forms: a failing
//! form never reaches the wire, and every field failure is reported, not
//! just the first.

use crate::error::{ApiError, ApiResult, FieldError};

/// A validation rule applicable to one field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Value must be non-empty after trimming.
    Required,

    /// Minimum length in characters.
    MinLen(usize),

    /// Maximum length in characters.
    MaxLen(usize),

    /// Must look like an email address.
    Email,

    /// Must look like a phone number.
    Phone,

    /// Minimum password strength (length plus letter and digit).
    Password,
}

/// Collects per-field rules and evaluates them all at once.
#[derive(Debug, Default)]
pub struct FormValidator {
    fields: Vec<(String, String, Vec<Rule>)>,
}

impl FormValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field with its rules.
    pub fn field(mut self, name: &str, value: &str, rules: &[Rule]) -> Self {
        self.fields
            .push((name.to_string(), value.to_string(), rules.to_vec()));
        self
    }

    /// Evaluate every rule, returning all failures together.
    pub fn validate(self) -> ApiResult<()> {
        let mut errors = Vec::new();

        for (name, value, rules) in &self.fields {
            for rule in rules {
                if let Some(message) = check(value, *rule) {
                    errors.push(FieldError {
                        field: name.clone(),
                        message: message.to_string(),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

fn check(value: &str, rule: Rule) -> Option<&'static str> {
    match rule {
        Rule::Required if value.trim().is_empty() => Some("is required"),
        Rule::MinLen(min) if value.chars().count() < min => Some("is too short"),
        Rule::MaxLen(max) if value.chars().count() > max => Some("is too long"),
        Rule::Email if !value.is_empty() && !is_valid_email(value) => {
            Some("is not a valid email address")
        }
        Rule::Phone if !value.is_empty() && !is_valid_phone(value) => {
            Some("is not a valid phone number")
        }
        Rule::Password if !is_strong_password(value) => {
            Some("must be at least 8 characters with a letter and a digit")
        }
        _ => None,
    }
}

fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    // Domain needs an interior dot.
    match domain.split_once('.') {
        Some((head, tail)) => !head.is_empty() && !tail.is_empty(),
        None => false,
    }
}

fn is_valid_phone(value: &str) -> bool {
    let trimmed = value.strip_prefix('+').unwrap_or(value);
    let digits: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_strong_password(value: &str) -> bool {
    value.chars().count() >= 8
        && value.chars().any(|c| c.is_ascii_alphabetic())
        && value.chars().any(|c| c.is_ascii_digit())
}
