//! Field-level input validation shared by the intake endpoints

use std::collections::BTreeMap;

use crate::constants::{ERR_INVALID_EMAIL, ERR_REQUIRED, ERR_TOO_LONG, MAX_FIELD_LEN};
use crate::error::AppError;
use crate::models::normalize_email;

/// Basic shape check: one `@`, non-empty local part, dotted domain, no spaces
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() || email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

/// Accumulates per-field errors so a client sees every problem at once
#[derive(Debug, Default)]
pub struct FieldErrors {
    fields: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Returns the trimmed value, or records the field as missing
    pub fn required(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        self.required_text(field, value, MAX_FIELD_LEN)
    }

    /// Like [`FieldErrors::required`] with a caller-chosen length limit
    pub fn required_text(&mut self, field: &str, value: Option<&str>, max_len: usize) -> Option<String> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) if v.len() > max_len => {
                self.add(field, ERR_TOO_LONG);
                None
            }
            Some(v) => Some(v.to_string()),
            None => {
                self.add(field, ERR_REQUIRED);
                None
            }
        }
    }

    /// Trimmed value if present; blank counts as absent
    pub fn optional(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        let value = value.map(str::trim).filter(|v| !v.is_empty())?;
        if value.len() > MAX_FIELD_LEN {
            self.add(field, ERR_TOO_LONG);
            return None;
        }
        Some(value.to_string())
    }

    /// Required email, normalized for use as a key
    pub fn email(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        let value = self.required(field, value)?;
        if !is_valid_email(&value) {
            self.add(field, ERR_INVALID_EMAIL);
            return None;
        }
        Some(normalize_email(&value))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `Ok(())` if nothing was recorded, otherwise a validation error
    pub fn finish(self) -> Result<(), AppError> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation {
                fields: self.fields,
            })
        }
    }
}
