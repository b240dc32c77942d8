//! Input checks shared by the admin handlers and the form pipeline.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// An input problem whose message is safe to show to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Returns the user-facing message if `err` wraps a [`ValidationError`].
pub fn user_message(err: &anyhow::Error) -> Option<String> {
    err.downcast_ref::<ValidationError>().map(|e| e.0.clone())
}

const MAX_EMAIL_LENGTH: usize = 254;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::new("Email is required."));
    }
    if email.len() > MAX_EMAIL_LENGTH || !EMAIL_RE.is_match(email) {
        return Err(ValidationError::new("Please enter a valid email address."));
    }
    Ok(())
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::new("Date must be in YYYY-MM-DD format."))
}

pub fn validate_http_url(value: &str, field: &str) -> Result<(), ValidationError> {
    match url::Url::parse(value.trim()) {
        Ok(u) if u.scheme() == "http" || u.scheme() == "https" => Ok(()),
        _ => Err(ValidationError::new(format!("{} must be an http(s) URL.", field))),
    }
}

/// Image URLs may be absolute or point at a local upload under `/media/`.
pub fn validate_image_url(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.trim().starts_with("/media/") {
        return Ok(());
    }
    validate_http_url(value, field)
}

pub fn require_non_empty(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(format!("{} is required.", field)));
    }
    Ok(())
}
