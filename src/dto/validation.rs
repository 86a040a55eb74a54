//! Validation helpers for DTOs.

use std::collections::HashSet;

use validator::ValidationError;

/// Upper bound on participants of any mode.
pub const MAX_PARTICIPANTS: usize = 4;

/// Validates that a participant list holds 1..=4 distinct, non-blank names.
///
/// Names are compared case-insensitively since votes may address participants by name.
///
/// # Examples
///
/// ```ignore
/// validate_participants(&["Adam".into(), "Beata".into()]) // Ok
/// validate_participants(&["Adam".into(), "adam".into()])  // Err - duplicate
/// validate_participants(&[" ".into()])                     // Err - blank
/// ```
pub fn validate_participants(names: &[String]) -> Result<(), ValidationError> {
    if names.is_empty() || names.len() > MAX_PARTICIPANTS {
        let mut err = ValidationError::new("participants_count");
        err.message = Some(
            format!(
                "Between 1 and {MAX_PARTICIPANTS} participants are required (got {})",
                names.len()
            )
            .into(),
        );
        return Err(err);
    }

    if names.iter().any(|name| name.trim().is_empty()) {
        let mut err = ValidationError::new("participant_blank");
        err.message = Some("Participant names must not be blank".into());
        return Err(err);
    }

    let mut seen = HashSet::new();
    if let Some(duplicate) = names
        .iter()
        .find(|name| !seen.insert(name.trim().to_lowercase()))
    {
        let mut err = ValidationError::new("participant_duplicate");
        err.message = Some(format!("Participant `{duplicate}` is listed twice").into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a free-text field holds more than whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}
