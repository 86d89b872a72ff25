//! Form state and validation. Each form collects raw text input, validates it into per-field
//! messages keyed by the dotted field path and converts it into the request body the backend
//! expects.

pub mod booking;
pub mod branch;
pub mod car;
pub mod change_password;
pub mod login;
pub mod profile;
pub mod quick_search;
pub mod register;
pub mod user;

use common::error::{CrError, CrResult, FieldErrors};
use lazy_regex::{regex, Lazy, Regex};

/// Loose email shape: something, `@`, something, `.`, something, without whitespace
static EMAIL_REGEX: &Lazy<Regex, fn() -> Regex> = regex!(r"^[^\s@]+@[^\s@]+\.[^\s@]+$");

pub(crate) fn is_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value.trim())
}

/// Record `message` for `field` unless the field already has an error. The first failing rule
/// of a field wins.
pub(crate) fn reject(errors: &mut FieldErrors, field: &'static str, message: &str) {
    errors
        .entry(field)
        .or_insert_with(|| message.to_owned());
}

/// Reject `value` when it is blank
pub(crate) fn require(errors: &mut FieldErrors, field: &'static str, value: &str, message: &str) {
    if value.trim().is_empty() {
        reject(errors, field, message);
    }
}

/// Reject `value` when it has fewer than `min` characters
pub(crate) fn min_chars(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &str,
    min: usize,
    message: &str,
) {
    if value.chars().count() < min {
        reject(errors, field, message);
    }
}

/// Reject `value` when it is not an email address
pub(crate) fn email(errors: &mut FieldErrors, field: &'static str, value: &str, message: &str) {
    if !is_email(value) {
        reject(errors, field, message);
    }
}

/// [None] for blank input, otherwise the trimmed text
pub(crate) fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// Convert collected `errors` into a result
/// # Errors
/// This function will return [CrError::Validation] if `errors` is not empty
pub fn into_result(errors: FieldErrors) -> CrResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CrError::Validation(errors))
    }
}
