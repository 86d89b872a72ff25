use std::collections::BTreeMap;

use thiserror::Error;

/// Message shown when an authenticated call is attempted without a stored token
pub const MISSING_TOKEN_MESSAGE: &str = "Authentication token not found. Please log in again.";

/// Per-field validation messages keyed by the dotted field path (e.g. `pickup.branch`)
pub type FieldErrors = BTreeMap<&'static str, String>;

/// All possible error types that may occur during car rental portal operations
#[derive(Error, Debug)]
pub enum CrError {
    #[error("{}", MISSING_TOKEN_MESSAGE)]
    MissingToken,
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Network error\n{0}")]
    Network(String),
    #[error("Invalid response format\n{0}")]
    InvalidResponse(String),
    #[error("Form validation failed. {} invalid field(s)", .0.len())]
    Validation(FieldErrors),
    #[error("Session storage error\n{0}")]
    Storage(#[from] std::io::Error),
    #[error("JSON error\n{0}")]
    Json(#[from] serde_json::Error),
    #[error("Environment Variable error\n{0}")]
    EnvVar(#[from] std::env::VarError),
    #[error("{0}")]
    ParseInt(#[from] std::num::ParseIntError),
    #[error("Generic error\n{0}")]
    Generic(String),
}

impl CrError {
    /// Returns true when the error means the user has to log in (again) before retrying
    pub const fn is_auth_required(&self) -> bool {
        matches!(self, Self::MissingToken | Self::Api { status: 401, .. })
    }

    /// Text suitable for an inline error panel or toast description. Backend supplied messages
    /// are returned verbatim, transport failures collapse to a generic message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } | Self::Generic(message) => message.clone(),
            Self::Network(_) => "Network error".to_owned(),
            Self::InvalidResponse(_) | Self::Json(_) => "Invalid response format".to_owned(),
            _ => format!("{self}"),
        }
    }
}

impl From<&str> for CrError {
    fn from(value: &str) -> Self {
        Self::Generic(value.to_owned())
    }
}

impl From<String> for CrError {
    fn from(value: String) -> Self {
        Self::Generic(value)
    }
}

impl From<FieldErrors> for CrError {
    fn from(value: FieldErrors) -> Self {
        Self::Validation(value)
    }
}

/// Generic [Result][std::result::Result] type where the error is always [CrError]
pub type CrResult<T> = std::result::Result<T, CrError>;
