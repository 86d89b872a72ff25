use common::error::{CrResult, FieldErrors};
use rental_portal_common::user::Credentials;

use super::{email, into_result, min_chars};

/// Sign in form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        email(&mut errors, "email", &self.email, "Invalid email");
        min_chars(&mut errors, "password", &self.password, 6, "Password is required");
        errors
    }

    /// Validated request body
    /// # Errors
    /// This function will return an error if any field is invalid
    pub fn credentials(&self) -> CrResult<Credentials> {
        into_result(self.validate())?;
        Ok(Credentials {
            email: self.email.trim().to_owned(),
            password: self.password.clone(),
        })
    }
}
