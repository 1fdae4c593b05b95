//! # Tokenization Request Validation
//!
//! Parses the untyped tokenization payload into a strongly-typed
//! [`TokenizeRequest`] before anything touches the store. Validation is a
//! pure function: on failure it produces a [`VaultError::Validation`] naming
//! the field and reason, with no side effects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{MAX_EXPIRATION_YEAR, MIN_EXPIRATION_YEAR};
use crate::error::{VaultError, VaultResult};

/// A validated tokenization request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizeRequest {
    pub card_number: String,
    pub email: String,
    pub expiration_month: u8,
    pub expiration_year: u16,
}

impl TokenizeRequest {
    /// Validates an untyped JSON payload against the tokenization schema.
    ///
    /// Checks, in order:
    /// - `card_number`: present, string, non-empty
    /// - `email`: present, string, well-formed
    /// - `expiration_month`: present, integer 1–12
    /// - `expiration_year`: present, integer within the plausible range
    pub fn parse(payload: &Value) -> VaultResult<Self> {
        let card_number = require_string(payload, "card_number")?;
        if card_number.is_empty() {
            return Err(VaultError::Validation(
                "card_number: must be a non-empty string".into(),
            ));
        }

        let email = require_string(payload, "email")?;
        if !is_valid_email(&email) {
            return Err(VaultError::Validation(
                "email: must be a valid email address".into(),
            ));
        }

        let month = require_integer(payload, "expiration_month")?;
        if !(1..=12).contains(&month) {
            return Err(VaultError::Validation(
                "expiration_month: must be an integer between 1 and 12".into(),
            ));
        }

        let year = require_integer(payload, "expiration_year")?;
        if !(MIN_EXPIRATION_YEAR as i64..=MAX_EXPIRATION_YEAR as i64).contains(&year) {
            return Err(VaultError::Validation(format!(
                "expiration_year: must be an integer between {} and {}",
                MIN_EXPIRATION_YEAR, MAX_EXPIRATION_YEAR
            )));
        }

        Ok(Self {
            card_number,
            email,
            expiration_month: month as u8,
            expiration_year: year as u16,
        })
    }
}

/// Extracts a required string field from the payload.
fn require_string(payload: &Value, field: &str) -> VaultResult<String> {
    match payload.get(field) {
        None | Some(Value::Null) => Err(VaultError::Validation(format!("{field}: is required"))),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(VaultError::Validation(format!("{field}: must be a string"))),
    }
}

/// Extracts a required integer field from the payload.
///
/// JSON has no integer type, so a number with a fractional part (e.g.
/// `12.5`) is rejected rather than truncated.
fn require_integer(payload: &Value, field: &str) -> VaultResult<i64> {
    match payload.get(field) {
        None | Some(Value::Null) => Err(VaultError::Validation(format!("{field}: is required"))),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| VaultError::Validation(format!("{field}: must be an integer"))),
        Some(_) => Err(VaultError::Validation(format!(
            "{field}: must be an integer"
        ))),
    }
}

/// Minimal structural email check: a single `@` with a non-empty local
/// part, a domain containing a dot, and no whitespace anywhere.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = match parts.next() {
        Some(d) => d,
        None => return false,
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Domain needs at least one interior dot.
    domain.len() >= 3 && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
