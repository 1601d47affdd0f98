//! Field validators shared by the create/update handlers.
//!
//! Enum membership checks live next to their vocabularies in
//! [`crate::production`] and [`crate::roles`]; this module covers free-form
//! fields.

use rust_decimal::Decimal;

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::{Date, Money};

/// Minimum password length for registration and password changes.
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 255;
pub const MAX_TITLE_LEN: usize = 255;
pub const MAX_TASK_NAME_LEN: usize = 255;
pub const MAX_CATEGORY_LEN: usize = 100;

/// Require a non-blank value of at most `max` characters.
pub fn validate_required_text(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max {
        return Err(CoreError::Validation(format!(
            "{field} must not exceed {max} characters"
        )));
    }
    Ok(())
}

/// Minimal shape check: one `@`, a non-empty local part, and a dotted domain.
pub fn validate_email(email: &str) -> Result<(), CoreError> {
    let invalid = || CoreError::Validation(format!("Invalid email address '{email}'"));

    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

pub fn validate_role(value: &str) -> Result<Role, CoreError> {
    value.parse::<Role>().map_err(CoreError::Validation)
}

pub fn validate_non_negative_money(field: &str, amount: Money) -> Result<(), CoreError> {
    if amount < Decimal::ZERO {
        return Err(CoreError::Validation(format!("{field} must not be negative")));
    }
    Ok(())
}

/// Amounts on finance transactions must be strictly positive.
pub fn validate_positive_money(field: &str, amount: Money) -> Result<(), CoreError> {
    if amount <= Decimal::ZERO {
        return Err(CoreError::Validation(format!("{field} must be greater than 0")));
    }
    Ok(())
}

/// A deadline may not fall before the start date. Missing dates always pass.
pub fn validate_date_order(start: Option<Date>, deadline: Option<Date>) -> Result<(), CoreError> {
    match (start, deadline) {
        (Some(start), Some(deadline)) if deadline < start => Err(CoreError::Validation(
            "Deadline date must not be before start date".to_string(),
        )),
        _ => Ok(()),
    }
}

pub fn validate_episode_number(number: i32) -> Result<(), CoreError> {
    if number < 1 {
        return Err(CoreError::Validation(
            "Episode number must be at least 1".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}
