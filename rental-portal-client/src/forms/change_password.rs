use common::error::{CrResult, FieldErrors};
use lazy_regex::{regex, Lazy, Regex};
use rental_portal_common::user::ChangePasswordRequest;

use super::{into_result, min_chars, reject, require};
use crate::{context::AppContext, queries, toast::Toast};

static LOWERCASE_REGEX: &Lazy<Regex, fn() -> Regex> = regex!(r"[a-z]");
static UPPERCASE_REGEX: &Lazy<Regex, fn() -> Regex> = regex!(r"[A-Z]");
static DIGIT_REGEX: &Lazy<Regex, fn() -> Regex> = regex!(r"[0-9]");

/// Returns true if `password` mixes lower case, upper case and digits
pub fn is_strong(password: &str) -> bool {
    LOWERCASE_REGEX.is_match(password)
        && UPPERCASE_REGEX.is_match(password)
        && DIGIT_REGEX.is_match(password)
}

/// Password change form of the profile page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl ChangePasswordForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(
            &mut errors,
            "currentPassword",
            &self.current_password,
            "Current password is required",
        );
        min_chars(
            &mut errors,
            "newPassword",
            &self.new_password,
            8,
            "Password must be at least 8 characters",
        );
        if !is_strong(&self.new_password) {
            reject(
                &mut errors,
                "newPassword",
                "Password must contain at least one uppercase letter, one lowercase letter, and one number",
            );
        }
        require(
            &mut errors,
            "confirmPassword",
            &self.confirm_password,
            "Please confirm your new password",
        );
        if self.new_password != self.confirm_password {
            reject(&mut errors, "confirmPassword", "Passwords don't match");
        }
        errors
    }

    /// Validated request body
    /// # Errors
    /// This function will return an error if the form does not validate
    pub fn request(&self) -> CrResult<ChangePasswordRequest> {
        into_result(self.validate())?;
        Ok(ChangePasswordRequest {
            current_password: self.current_password.clone(),
            new_password: self.new_password.clone(),
            confirm_password: self.confirm_password.clone(),
        })
    }

    /// Send the change and describe the outcome. The form is cleared on success.
    pub async fn submit(&mut self, context: &AppContext) -> Toast {
        let result = match self.request() {
            Ok(request) => queries::users::change_password(context, &request).await,
            Err(error) => Err(error),
        };
        match result {
            Ok(message) => {
                *self = Self::default();
                Toast::confirmed("Password changed", &message)
            }
            Err(error) => Toast::from_error("Failed to change password", "change your password", &error),
        }
    }
}
