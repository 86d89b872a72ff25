use common::error::{CrResult, FieldErrors};
use rental_portal_common::user::{Address, DriverLicense, Preferences, ProfileUpdate, User};

use super::{email, into_result, min_chars, non_blank};
use crate::{context::AppContext, queries, toast::Toast};

/// Editable profile of the signed in user
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub profile_image: String,
    pub driver_license: DriverLicense,
    pub address: Address,
    pub preferences: Preferences,
}

impl From<&User> for ProfileForm {
    fn from(value: &User) -> Self {
        Self {
            first_name: value.first_name.clone(),
            last_name: value.last_name.clone(),
            email: value.email.clone(),
            phone: value.phone.clone(),
            date_of_birth: value.date_of_birth.clone().unwrap_or_default(),
            profile_image: value.profile_image.clone().unwrap_or_default(),
            driver_license: value.driver_license.clone(),
            address: value.address.clone(),
            preferences: value.preferences.clone(),
        }
    }
}

impl ProfileForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        min_chars(
            &mut errors,
            "firstName",
            self.first_name.trim(),
            2,
            "First name must be at least 2 characters",
        );
        min_chars(
            &mut errors,
            "lastName",
            self.last_name.trim(),
            2,
            "Last name must be at least 2 characters",
        );
        email(&mut errors, "email", &self.email, "Invalid email address");
        errors
    }

    /// Validated sparse update. Names and email are always sent; optional blocks only when the
    /// user filled them in.
    /// # Errors
    /// This function will return an error if the form does not validate
    pub fn update(&self) -> CrResult<ProfileUpdate> {
        into_result(self.validate())?;
        Ok(ProfileUpdate {
            first_name: Some(self.first_name.trim().to_owned()),
            last_name: Some(self.last_name.trim().to_owned()),
            email: Some(self.email.trim().to_owned()),
            phone: non_blank(&self.phone),
            date_of_birth: non_blank(&self.date_of_birth),
            profile_image: non_blank(&self.profile_image),
            driver_license: (!self.driver_license.number.trim().is_empty())
                .then(|| self.driver_license.clone()),
            address: (!self.address.street.trim().is_empty()).then(|| self.address.clone()),
            preferences: (!self.preferences.preferred_car_types.is_empty())
                .then(|| self.preferences.clone()),
        })
    }

    /// Save the profile. The stored session user is refreshed with the backend's copy.
    pub async fn submit(&self, context: &AppContext) -> Toast {
        let result = match self.update() {
            Ok(update) => queries::users::update_profile(context, &update).await,
            Err(error) => Err(error),
        };
        match result {
            Ok(_) => Toast::success("Profile updated successfully!"),
            Err(error) => {
                let toast = Toast::from_error("Profile update failed", "update your profile", &error);
                if error.is_auth_required() {
                    toast
                } else {
                    toast.description("Failed to update profile. Please try again.")
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use rental_portal_common::user::{Address, Role};
    use serde_json::json;

    use super::ProfileForm;
    use crate::{
        api::{test::transport_once, Method},
        context::test::signed_in,
        session::test::session_for,
        toast::ToastKind,
    };

    #[test]
    fn update_should_skip_blank_optionals() {
        let form = ProfileForm {
            first_name: "John".to_owned(),
            last_name: "Smith".to_owned(),
            email: "john@example.com".to_owned(),
            phone: "  ".to_owned(),
            address: Address {
                city: "Miami".to_owned(),
                ..Address::default()
            },
            ..ProfileForm::default()
        };

        let update = form.update().expect("Form should validate");
        let wire = serde_json::to_value(&update).expect("Failed to serialize");

        assert_eq!(
            wire,
            json!({"firstName": "John", "lastName": "Smith", "email": "john@example.com"})
        );
    }

    #[test]
    fn update_should_send_address_with_street() {
        let mut form = ProfileForm::from(&session_for(Role::User).user);
        form.address.street = "1 Main St".to_owned();

        let update = form.update().expect("Form should validate");

        assert_eq!(update.address.map(|address| address.street).as_deref(), Some("1 Main St"));
        assert_eq!(update.driver_license, None);
    }

    #[test]
    fn validate_should_check_name_length_and_email() {
        let form = ProfileForm {
            first_name: "J".to_owned(),
            last_name: "Smith".to_owned(),
            email: "john".to_owned(),
            ..ProfileForm::default()
        };

        let errors = form.validate();

        assert_eq!(
            errors.get("firstName").map(String::as_str),
            Some("First name must be at least 2 characters")
        );
        assert_eq!(errors.get("email").map(String::as_str), Some("Invalid email address"));
    }

    #[tokio::test]
    async fn submit_failure_should_ask_to_retry() {
        let context = signed_in(
            transport_once(
                Method::Put,
                "/api/users/profile",
                500,
                json!({"message": "Database unavailable"}),
            ),
            Role::User,
        )
        .await;
        let form = ProfileForm::from(&session_for(Role::User).user);

        let toast = form.submit(&context).await;

        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(
            toast.description.as_deref(),
            Some("Failed to update profile. Please try again.")
        );
    }
}
