use std::{
    env::{self, VarError},
    path::PathBuf,
    time::Duration,
};

use common::error::CrResult;

/// Backend used when `CAR_RENTAL_API_BASE_URL` is not set
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
/// Session file used when `CAR_RENTAL_SESSION_FILE` is not set
pub const DEFAULT_SESSION_FILE: &str = "car_rental_auth.json";
/// Debounce window of search inputs when `CAR_RENTAL_SEARCH_DEBOUNCE_MS` is not set
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;

/// Runtime configuration of the portal client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the REST backend without a trailing slash
    pub api_base_url: String,
    /// Location of the persisted session record
    pub session_file: PathBuf,
    /// Quiet period before a search input is sent to the backend
    pub search_debounce: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
        }
    }
}

impl ClientConfig {
    /// Build the configuration from the process environment. Unset variables fall back to the
    /// defaults.
    /// # Errors
    /// This function will return an error if a variable is not valid unicode or the debounce
    /// window is not an integer
    pub fn from_env() -> CrResult<Self> {
        Self::from_lookup(|key| env::var(key))
    }

    /// Build the configuration using `lookup` to resolve each variable
    fn from_lookup<F>(lookup: F) -> CrResult<Self>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let api_base_url = optional_var(&lookup, "CAR_RENTAL_API_BASE_URL")?
            .map_or_else(
                || DEFAULT_API_BASE_URL.to_owned(),
                |url| url.trim_end_matches('/').to_owned(),
            );
        let session_file = optional_var(&lookup, "CAR_RENTAL_SESSION_FILE")?
            .map_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from);
        let debounce_ms = match optional_var(&lookup, "CAR_RENTAL_SEARCH_DEBOUNCE_MS")? {
            Some(value) => value.trim().parse()?,
            None => DEFAULT_SEARCH_DEBOUNCE_MS,
        };
        Ok(Self {
            api_base_url,
            session_file,
            search_debounce: Duration::from_millis(debounce_ms),
        })
    }
}

/// Resolve `key`, treating a missing or blank variable as [None]
fn optional_var<F>(lookup: &F, key: &str) -> CrResult<Option<String>>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    match lookup(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(error) => Err(error.into()),
    }
}
