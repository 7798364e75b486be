//! Field checks applied to request bodies before they reach the database.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

pub fn require_non_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError(format!("{field} must not be empty")));
    }
    Ok(())
}

pub fn require_min_len(field: &str, value: &str, min: usize) -> Result<(), ValidationError> {
    if value.chars().count() < min {
        return Err(ValidationError(format!(
            "{field} must be at least {min} characters"
        )));
    }
    Ok(())
}

pub fn require_email(value: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError(format!("'{value}' is not a valid email address"));
    if value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

/// At least one id must be given.
pub fn require_ids(field: &str, ids: &[i64]) -> Result<(), ValidationError> {
    if ids.is_empty() {
        return Err(ValidationError(format!("{field} must contain at least one id")));
    }
    Ok(())
}
