use common::error::{CrResult, FieldErrors};
use rental_portal_common::user::{Address, DriverLicense, RegisterRequest};

use super::{email, min_chars, require};
use crate::wizard::{StepForm, Wizard};

/// Steps of the sign up wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterStep {
    Account,
    Security,
    License,
    Address,
}

/// Raw input of the sign up wizard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone: String,
    pub date_of_birth: String,
    pub license_number: String,
    pub license_expiry: String,
    pub license_country: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl StepForm for RegisterForm {
    type Step = RegisterStep;

    fn steps() -> &'static [RegisterStep] {
        &[
            RegisterStep::Account,
            RegisterStep::Security,
            RegisterStep::License,
            RegisterStep::Address,
        ]
    }

    fn validate_step(&self, step: RegisterStep) -> FieldErrors {
        let mut errors = FieldErrors::new();
        match step {
            RegisterStep::Account => {
                min_chars(&mut errors, "firstName", self.first_name.trim(), 2, "First name is required");
                min_chars(&mut errors, "lastName", self.last_name.trim(), 2, "Last name is required");
                email(&mut errors, "email", &self.email, "Invalid email");
            }
            RegisterStep::Security => {
                min_chars(
                    &mut errors,
                    "password",
                    &self.password,
                    6,
                    "Password must be at least 6 characters",
                );
                if self.password != self.confirm_password {
                    errors.insert("confirmPassword", "Passwords do not match".to_owned());
                }
                min_chars(&mut errors, "phone", self.phone.trim(), 6, "Phone is required");
            }
            RegisterStep::License => {
                require(
                    &mut errors,
                    "driverLicense.number",
                    &self.license_number,
                    "License number is required",
                );
                require(
                    &mut errors,
                    "driverLicense.expiryDate",
                    &self.license_expiry,
                    "Expiry date is required",
                );
                require(
                    &mut errors,
                    "driverLicense.issuingCountry",
                    &self.license_country,
                    "Issuing country is required",
                );
            }
            RegisterStep::Address => {
                require(&mut errors, "address.street", &self.street, "Street address is required");
                require(&mut errors, "address.city", &self.city, "City is required");
                require(&mut errors, "address.state", &self.state, "State is required");
                require(&mut errors, "address.zipCode", &self.zip_code, "ZIP code is required");
                require(&mut errors, "address.country", &self.country, "Country is required");
            }
        }
        errors
    }
}

impl RegisterForm {
    fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            email: self.email.trim().to_owned(),
            password: self.password.clone(),
            confirm_password: self.confirm_password.clone(),
            phone: self.phone.trim().to_owned(),
            date_of_birth: self.date_of_birth.trim().to_owned(),
            driver_license: DriverLicense {
                number: self.license_number.trim().to_owned(),
                expiry_date: self.license_expiry.trim().to_owned(),
                issuing_country: self.license_country.trim().to_owned(),
            },
            address: Address {
                street: self.street.trim().to_owned(),
                city: self.city.trim().to_owned(),
                state: self.state.trim().to_owned(),
                zip_code: self.zip_code.trim().to_owned(),
                country: self.country.trim().to_owned(),
            },
        }
    }
}

/// Sign up wizard
pub type RegisterWizard = Wizard<RegisterForm>;

impl Wizard<RegisterForm> {
    /// Validated registration body. Moves back to the first invalid step on failure.
    /// # Errors
    /// This function will return an error if any step does not validate
    pub fn request(&mut self) -> CrResult<RegisterRequest> {
        self.ensure_submittable()?;
        Ok(self.form().to_request())
    }
}

#[cfg(test)]
pub(crate) mod test {
    use common::error::CrError;

    use super::{RegisterForm, RegisterStep, RegisterWizard};

    pub(crate) fn complete_form() -> RegisterForm {
        RegisterForm {
            first_name: "John".to_owned(),
            last_name: "Smith".to_owned(),
            email: "john@example.com".to_owned(),
            password: "secret1".to_owned(),
            confirm_password: "secret1".to_owned(),
            phone: "5550101".to_owned(),
            date_of_birth: "1990-04-01".to_owned(),
            license_number: "D1234".to_owned(),
            license_expiry: "2030-01-01".to_owned(),
            license_country: "USA".to_owned(),
            street: "1 Main St".to_owned(),
            city: "Miami".to_owned(),
            state: "FL".to_owned(),
            zip_code: "33101".to_owned(),
            country: "USA".to_owned(),
        }
    }

    #[test]
    fn security_step_should_require_matching_passwords() {
        let mut form = complete_form();
        form.confirm_password = "secret2".to_owned();
        let mut wizard = RegisterWizard::new(form);

        assert_eq!(wizard.next().expect("Account should validate"), RegisterStep::Security);
        let result = wizard.next();

        assert!(matches!(result, Err(CrError::Validation(_))));
        assert_eq!(
            wizard.errors().get("confirmPassword").map(String::as_str),
            Some("Passwords do not match")
        );
        assert_eq!(wizard.step(), RegisterStep::Security);
    }

    #[test]
    fn wizard_should_walk_all_four_steps() {
        let mut wizard = RegisterWizard::new(complete_form());

        assert_eq!(wizard.next().expect("Step 1"), RegisterStep::Security);
        assert_eq!(wizard.next().expect("Step 2"), RegisterStep::License);
        assert_eq!(wizard.next().expect("Step 3"), RegisterStep::Address);
        assert!(wizard.is_last());

        let request = wizard.request().expect("Form should validate");
        assert_eq!(request.driver_license.number, "D1234");
        assert_eq!(request.address.zip_code, "33101");
    }

    #[test]
    fn request_should_jump_back_to_first_invalid_step() {
        let mut form = complete_form();
        form.license_number.clear();
        form.city.clear();
        let mut wizard = RegisterWizard::new(form);

        let Err(CrError::Validation(errors)) = wizard.request() else {
            panic!("Expected validation errors");
        };

        assert_eq!(wizard.step(), RegisterStep::License);
        assert!(errors.contains_key("driverLicense.number"));
        assert!(errors.contains_key("address.city"));
    }
}
