use std::time::Duration;

use common::error::CrError;
use log::{error, info};

/// How long a toast stays on screen unless dismissed
pub const DEFAULT_DURATION: Duration = Duration::from_secs(5);


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// Button attached to a toast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastAction {
    /// Open the login dialog
    Login,
    /// Invalidate the failed query and run it again
    Retry,
}

impl ToastAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Retry => "Retry",
        }
    }
}

/// Short lived notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    pub description: Option<String>,
    pub duration: Duration,
    pub action: Option<ToastAction>,
}

impl Toast {
    pub fn success<T: Into<String>>(title: T) -> Self {
        Self {
            kind: ToastKind::Success,
            title: title.into(),
            description: None,
            duration: DEFAULT_DURATION,
            action: None,
        }
    }

    pub fn error<T: Into<String>>(title: T) -> Self {
        Self {
            kind: ToastKind::Error,
            ..Self::success(title)
        }
    }

    #[must_use]
    pub fn description<D: Into<String>>(mut self, description: D) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn action(mut self, action: ToastAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Toast prompting the user to sign in again before they can `action`, e.g.
    /// `create a rental`
    pub fn auth_required(action: &str) -> Self {
        Self::error("Authentication Required")
            .description(format!("Please log in to {action}. Redirecting to login..."))
            .action(ToastAction::Login)
    }

    /// Toast for a failed attempt to `action`. Authentication failures always produce
    /// [Toast::auth_required]; anything else is titled `title` with the error's user message.
    pub fn from_error(title: &str, action: &str, error: &CrError) -> Self {
        error!("{title}. {error}");
        if error.is_auth_required() {
            return Self::auth_required(action);
        }
        Self::error(title).description(error.user_message())
    }

    /// Toast for a successful operation, logging the outcome
    pub fn confirmed(title: &str, description: &str) -> Self {
        info!("{title} {description}");
        Self::success(title).description(description)
    }
}

#[cfg(test)]
mod test {
    use common::error::CrError;
    use rstest::rstest;

    use super::{Toast, ToastAction, ToastKind};

    #[rstest]
    #[case::missing_token(CrError::MissingToken)]
    #[case::expired(CrError::Api { status: 401, message: "Token expired".to_owned() })]
    fn from_error_should_prompt_login_for_auth_failures(#[case] error: CrError) {
        let toast = Toast::from_error("Rental Creation Failed", "create a rental", &error);

        assert_eq!(toast.title, "Authentication Required");
        assert_eq!(
            toast.description.as_deref(),
            Some("Please log in to create a rental. Redirecting to login...")
        );
        assert_eq!(toast.action, Some(ToastAction::Login));
        assert_eq!(toast.action.map(ToastAction::label), Some("Login"));
    }

    #[test]
    fn from_error_should_keep_backend_message() {
        let error = CrError::Api {
            status: 409,
            message: "Car is already booked".to_owned(),
        };

        let toast = Toast::from_error("Rental Creation Failed", "create a rental", &error);

        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.title, "Rental Creation Failed");
        assert_eq!(toast.description.as_deref(), Some("Car is already booked"));
        assert_eq!(toast.action, None);
    }
}
