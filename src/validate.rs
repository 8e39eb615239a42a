//! Local pre-flight validation.
//!
//! Rules and messages mirror the board's input forms, so a locally
//! rejected value reads the same to the user as a server-side 422.
//! Anything rejected here never produces a network request.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::errors::ApiError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").unwrap());

pub fn category_title(title: &str) -> Result<(), ApiError> {
    if title.is_empty() {
        return Err(ApiError::validation(
            Some("title"),
            "Please enter a category title",
        ));
    }
    if title.chars().count() > 50 {
        return Err(ApiError::validation(
            Some("title"),
            "Title must be between 1 and 50 characters",
        ));
    }
    Ok(())
}

pub fn label_title(title: &str) -> Result<(), ApiError> {
    if title.is_empty() {
        return Err(ApiError::validation(
            Some("title"),
            "Please enter a label title",
        ));
    }
    if title.chars().count() > 50 {
        return Err(ApiError::validation(
            Some("title"),
            "Title must be between 1 and 50 characters",
        ));
    }
    Ok(())
}

pub fn ticket_title(title: &str) -> Result<(), ApiError> {
    if title.is_empty() {
        return Err(ApiError::validation(
            Some("title"),
            "Please enter a ticket title",
        ));
    }
    if title.trim().is_empty() {
        return Err(ApiError::validation(Some("title"), "Title cannot be empty"));
    }
    if title.chars().count() > 100 {
        return Err(ApiError::validation(
            Some("title"),
            "Title must be between 1 and 100 characters",
        ));
    }
    Ok(())
}

pub fn ticket_description(description: &str) -> Result<(), ApiError> {
    if description.is_empty() {
        return Err(ApiError::validation(
            Some("description"),
            "Please enter a description",
        ));
    }
    if description.trim().is_empty() {
        return Err(ApiError::validation(
            Some("description"),
            "Description cannot be empty",
        ));
    }
    if description.chars().count() > 500 {
        return Err(ApiError::validation(
            Some("description"),
            "Description must be between 1 and 500 characters",
        ));
    }
    Ok(())
}

/// An expiry date is optional, but when given it may not lie before the
/// start of the current day.
pub fn expiry_date(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<(), ApiError> {
    if let Some(at) = expires_at {
        if at.date_naive() < now.date_naive() {
            return Err(ApiError::validation(
                Some("expiresAt"),
                "Expiry date cannot be in the past",
            ));
        }
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::validation(
            Some("email"),
            "Please input your email!",
        ));
    }
    if !EMAIL_RE.is_match(value) {
        return Err(ApiError::validation(
            Some("email"),
            "Please enter a valid email!",
        ));
    }
    Ok(())
}

pub fn login_password(value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::validation(
            Some("password"),
            "Please input your password!",
        ));
    }
    if value.chars().count() < 6 {
        return Err(ApiError::validation(
            Some("password"),
            "Password must be at least 6 characters.",
        ));
    }
    Ok(())
}

/// Registration requires the login rules plus at least one lowercase,
/// one uppercase, and one special character.
pub fn registration_password(value: &str) -> Result<(), ApiError> {
    login_password(value)?;
    let has_lower = value.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = value.chars().any(|c| c.is_ascii_uppercase());
    let has_special = value.chars().any(|c| !c.is_ascii_alphanumeric());
    if !(has_lower && has_upper && has_special) {
        return Err(ApiError::validation(
            Some("password"),
            "Password must contain upper, lower, and special character.",
        ));
    }
    Ok(())
}

pub fn password_confirmation(password: &str, confirm: &str) -> Result<(), ApiError> {
    if password != confirm {
        return Err(ApiError::validation(
            Some("confirm"),
            "Passwords do not match.",
        ));
    }
    Ok(())
}
