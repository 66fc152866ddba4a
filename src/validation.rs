use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Field-level validation failures, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn push(&mut self, field: &'static str, message: &'static str) {
        self.0.push(FieldError { field, message });
    }

    pub fn require(&mut self, ok: bool, field: &'static str, message: &'static str) {
        if !ok {
            self.push(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first_message(&self) -> Option<&'static str> {
        self.0.first().map(|f| f.message)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    #[cfg(test)]
    pub fn messages(&self) -> Vec<&'static str> {
        self.0.iter().map(|f| f.message).collect()
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

/// Normalization and field checks for an incoming payload.
pub trait Validate: Sized {
    fn normalize(self) -> Self;

    fn validate(&self) -> FieldErrors;

    /// Normalizes, then rejects the payload if any field check fails.
    fn prepare(self) -> Result<Self, ApiError> {
        let normalized = self.normalize();
        normalized.validate().into_result()?;
        Ok(normalized)
    }
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

const ENTITIES: [&str; 5] = ["&amp;", "&lt;", "&gt;", "&quot;", "&#39;"];

/// Trims and HTML-escapes free text. Applying it twice gives the same result
/// as applying it once: an `&` that already opens one of our entities is kept.
pub fn normalize_text(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len());
    for (i, c) in trimmed.char_indices() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '&' if ENTITIES.iter().any(|e| trimmed[i..].starts_with(e)) => out.push('&'),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn normalize_email(raw: &str) -> String {
    normalize_text(raw).to_lowercase()
}
