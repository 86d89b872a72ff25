use common::error::{CrResult, FieldErrors};
use rental_portal_common::user::{AdminUserUpdate, Role, User};

use super::{into_result, is_email, reject, require};
use crate::{context::AppContext, queries, toast::Toast};

/// Admin edit form of any user account
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserForm {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub is_active: bool,
    pub is_email_verified: bool,
}

impl From<&User> for UserForm {
    fn from(value: &User) -> Self {
        Self {
            user_id: value.id.clone(),
            first_name: value.first_name.clone(),
            last_name: value.last_name.clone(),
            email: value.email.clone(),
            phone: value.phone.clone(),
            role: value.role,
            is_active: value.is_active,
            is_email_verified: value.is_email_verified,
        }
    }
}

impl UserForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(&mut errors, "firstName", &self.first_name, "First name is required");
        require(&mut errors, "lastName", &self.last_name, "Last name is required");
        require(&mut errors, "email", &self.email, "Email is required");
        if !is_email(&self.email) {
            reject(&mut errors, "email", "Email is invalid");
        }
        require(&mut errors, "phone", &self.phone, "Phone number is required");
        errors
    }

    /// Validated update body
    /// # Errors
    /// This function will return an error if the form does not validate
    pub fn update(&self) -> CrResult<AdminUserUpdate> {
        into_result(self.validate())?;
        Ok(AdminUserUpdate {
            first_name: Some(self.first_name.trim().to_owned()),
            last_name: Some(self.last_name.trim().to_owned()),
            email: Some(self.email.trim().to_owned()),
            phone: Some(self.phone.trim().to_owned()),
            role: Some(self.role),
            is_active: Some(self.is_active),
            is_email_verified: Some(self.is_email_verified),
        })
    }

    /// Save the account and describe the outcome
    pub async fn submit(&self, context: &AppContext) -> Toast {
        let result = match self.update() {
            Ok(update) => queries::users::update_user(context, &self.user_id, &update).await,
            Err(error) => Err(error),
        };
        match result {
            Ok(user) => Toast::confirmed("User updated", &format!("{} was saved", user.full_name())),
            Err(error) => Toast::from_error("Failed to update user", "update the user", &error),
        }
    }
}

#[cfg(test)]
mod test {
    use rental_portal_common::user::Role;
    use rstest::rstest;
    use serde_json::json;

    use super::UserForm;
    use crate::{
        api::{test::transport_once, Method},
        context::test::signed_in,
        session::test::session_for,
        toast::ToastKind,
    };

    fn form() -> UserForm {
        UserForm {
            phone: "5550101".to_owned(),
            ..UserForm::from(&session_for(Role::User).user)
        }
    }

    #[rstest]
    #[case::blank("", "Email is required")]
    #[case::malformed("john@", "Email is invalid")]
    fn validate_should_check_email(#[case] email: &str, #[case] message: &str) {
        let form = UserForm {
            email: email.to_owned(),
            ..form()
        };

        let errors = form.validate();

        assert_eq!(errors.get("email").map(String::as_str), Some(message));
    }

    #[test]
    fn update_should_send_role_and_flags() {
        let form = UserForm {
            role: Role::Manager,
            is_email_verified: true,
            ..form()
        };

        let wire = serde_json::to_value(form.update().expect("Form should validate"))
            .expect("Failed to serialize");

        assert_eq!(wire["role"], "manager");
        assert_eq!(wire["isActive"], true);
        assert_eq!(wire["isEmailVerified"], true);
    }

    #[tokio::test]
    async fn submit_should_confirm_with_name() {
        let context = signed_in(
            transport_once(
                Method::Put,
                "/api/admin/users/u1",
                200,
                json!({"success": true, "data": {"_id": "u1", "firstName": "John", "lastName": "Smith", "email": "john@example.com"}}),
            ),
            Role::Admin,
        )
        .await;

        let toast = form().submit(&context).await;

        assert_eq!(toast.kind, ToastKind::Success);
        assert_eq!(toast.description.as_deref(), Some("John Smith was saved"));
    }
}
