//! Client-side data model of the car rental portal. The backend owns every record; these types
//! only mirror the JSON shapes it sends and accepts.

pub mod branch;
pub mod car;
pub mod rental;
pub mod user;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Types that can be rendered as URL query pairs. Unset optional filters are omitted.
pub trait QueryParams {
    /// Produce the ordered list of `(key, value)` query pairs
    fn to_query(&self) -> Vec<(&'static str, String)>;

    /// Returns true if at least one query pair would be sent
    fn has_any(&self) -> bool {
        !self.to_query().is_empty()
    }
}

/// Direction of a sorted listing
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Flip the direction, used when a column header is clicked twice
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Push `key=value` onto `query` when `value` is set
pub(crate) fn push_opt<T: ToString>(
    query: &mut Vec<(&'static str, String)>,
    key: &'static str,
    value: Option<&T>,
) {
    if let Some(value) = value {
        query.push((key, value.to_string()));
    }
}

/// Push `key=value` onto `query` when `value` is a non-blank string
pub(crate) fn push_text(query: &mut Vec<(&'static str, String)>, key: &'static str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        query.push((key, value.to_owned()));
    }
}
