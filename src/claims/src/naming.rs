//! Identifier naming restrictions

use crate::error::{ClaimsError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Message returned alongside identifier validation failures
pub const INVALID_NAMING_MESSAGE: &str =
    "A valid string conforms with the following regex: ^[a-zA-Z0-9_-]+$";

fn naming_regex() -> &'static Regex {
    static NAMING: OnceLock<Regex> = OnceLock::new();
    NAMING.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("static naming regex"))
}

/// Returns whether `input` is a non-empty string of letters, digits, `-` and `_`
pub fn is_valid_naming_string(input: &str) -> bool {
    naming_regex().is_match(input)
}

/// Rejects `value` with [`ClaimsError::InvalidIdentifier`] unless it is a valid naming string
pub fn require_valid(field: &'static str, value: &str) -> Result<()> {
    if is_valid_naming_string(value) {
        Ok(())
    } else {
        Err(ClaimsError::InvalidIdentifier {
            field,
            value: value.to_string(),
        })
    }
}

/// Normalizes an optional identifier for record writes.
///
/// Blank or whitespace-only values become `None`; anything else must pass
/// [`is_valid_naming_string`].
pub fn normalize_optional(field: &'static str, value: Option<&str>) -> Result<Option<String>> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => {
            require_valid(field, v)?;
            Ok(Some(v.to_string()))
        }
    }
}
