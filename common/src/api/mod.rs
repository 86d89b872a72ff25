use log::warn;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{CrError, CrResult};

/// Pagination block attached to list responses. The backend uses two different shapes depending
/// on the resource (`page`/`limit` for users, `currentPage`/`hasNext` for branches) so every
/// field is optional.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub has_next: Option<bool>,
    #[serde(default)]
    pub has_prev: Option<bool>,
}

/// Generic response envelope returned by the rental backend. A response carries a success flag,
/// an optional message for the user and, for reads and most writes, the `data` payload. List
/// endpoints add counts and pagination details.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponseBody<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub current_page: Option<u32>,
}

impl<T> ApiResponseBody<T> {
    /// Consume the envelope and return the `data` payload
    /// # Errors
    /// This function will return an error if the envelope has no `data` entry
    pub fn into_data(self) -> CrResult<T> {
        match self.data {
            Some(data) => Ok(data),
            None => Err(CrError::InvalidResponse(
                self.message
                    .unwrap_or_else(|| "Response did not contain any data".to_owned()),
            )),
        }
    }

    /// Message sent by the backend or the `fallback` text when none was provided
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_owned())
    }
}

/// Body of an unsuccessful response. The backend is inconsistent about which key holds the
/// human readable text so both are captured.
#[derive(Deserialize, Debug, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Attempt to decode an [ErrorBody] from raw response bytes. Bodies that are not JSON objects
    /// decode to an empty [ErrorBody].
    pub fn from_bytes(bytes: &[u8]) -> Self {
        serde_json::from_slice(bytes).unwrap_or_default()
    }

    /// Text to show for resource operations: `message`, then `error`, then `fallback`
    pub fn message_or(self, fallback: &str) -> String {
        non_empty(self.message)
            .or_else(|| non_empty(self.error))
            .unwrap_or_else(|| fallback.to_owned())
    }

    /// Text to show for login and registration: `error`, then `message`, then `fallback`
    pub fn auth_message_or(self, fallback: &str) -> String {
        non_empty(self.error)
            .or_else(|| non_empty(self.message))
            .unwrap_or_else(|| fallback.to_owned())
    }
}

/// Filter out empty strings so they fall through to the next candidate message
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Returns true for 2xx status codes
pub const fn is_success(status: u16) -> bool {
    status >= 200 && status < 300
}

/// Build the [CrError::Api] for a non-2xx response, extracting the message from the `body`
pub fn parse_error(status: u16, body: &[u8], fallback: &str) -> CrError {
    let message = ErrorBody::from_bytes(body).message_or(fallback);
    warn!("API request failed with status {status}. {message}");
    CrError::Api { status, message }
}

/// Decode a raw backend response into an [ApiResponseBody]. Non-2xx statuses and envelopes that
/// carry `success: false` are converted into [CrError::Api] using the body's message or the
/// `fallback` text.
/// # Errors
/// This function will return an error if the status is not successful, the envelope reports a
/// failure or the body cannot be decoded as the expected type
pub fn parse_body<T>(status: u16, body: &[u8], fallback: &str) -> CrResult<ApiResponseBody<T>>
where
    T: DeserializeOwned,
{
    if !is_success(status) {
        return Err(parse_error(status, body, fallback));
    }
    let envelope: ApiResponseBody<T> = serde_json::from_slice(body)
        .map_err(|error| CrError::InvalidResponse(format!("{error}")))?;
    if envelope.success == Some(false) {
        let message = envelope.message_or(fallback);
        warn!("API reported failure. {message}");
        return Err(CrError::Api { status, message });
    }
    Ok(envelope)
}
