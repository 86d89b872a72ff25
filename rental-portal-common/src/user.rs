use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{push_opt, push_text, QueryParams, SortOrder};

/// Access level of a [User]
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    Manager,
}

/// Postal address of a [User]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub country: String,
}

/// Driver licence of a [User]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DriverLicense {
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub expiry_date: String,
    #[serde(default)]
    pub issuing_country: String,
}

/// Rental preferences of a [User]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub preferred_car_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_fuel_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_daily_budget: Option<f64>,
}

/// Car summary of a rental history entry
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct HistoryCar {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
}

/// Summary of a past rental embedded in the user record
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RentalHistoryEntry {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "carId", default)]
    pub car: Option<HistoryCar>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub status: String,
}

/// Customer or staff account
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_email_verified: bool,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub driver_license: DriverLicense,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub rental_history: Vec<RentalHistoryEntry>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub age: Option<u32>,
}

impl User {
    /// First name and last name separated by a space
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authenticated identity held by the client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Login request body
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Registration request body
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone: String,
    pub date_of_birth: String,
    pub driver_license: DriverLicense,
    pub address: Address,
}

/// Sparse update of the current user's profile. Only set fields are sent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_license: Option<DriverLicense>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}

impl ProfileUpdate {
    /// Returns true if nothing would be changed by sending this update
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Password change request body
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Sparse admin update of any user
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_email_verified: Option<bool>,
}

/// Sortable columns of the admin user listing
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum UserSortField {
    #[default]
    CreatedAt,
    FirstName,
    LastName,
    Email,
    Role,
}

/// Query of the paginated admin user listing
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct AdminUsersParams {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub is_email_verified: Option<bool>,
    pub sort_by: UserSortField,
    pub sort_order: SortOrder,
}

impl Default for AdminUsersParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: None,
            role: None,
            is_active: None,
            is_email_verified: None,
            sort_by: UserSortField::CreatedAt,
            sort_order: SortOrder::Desc,
        }
    }
}

impl QueryParams for AdminUsersParams {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("sortBy", self.sort_by.to_string()),
            ("sortOrder", self.sort_order.to_string()),
        ];
        push_text(&mut query, "search", self.search.as_deref().unwrap_or_default());
        push_opt(&mut query, "role", self.role.as_ref());
        push_opt(&mut query, "isActive", self.is_active.as_ref());
        push_opt(&mut query, "isEmailVerified", self.is_email_verified.as_ref());
        query
    }
}

/// Query of the admin user search endpoint
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchParams {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl QueryParams for UserSearchParams {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        push_text(&mut query, "name", self.name.as_deref().unwrap_or_default());
        push_text(&mut query, "email", self.email.as_deref().unwrap_or_default());
        push_opt(&mut query, "role", self.role.as_ref());
        push_opt(&mut query, "isActive", self.is_active.as_ref());
        query
    }
}

/// Aggregated user figures for the dashboard
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub verified: u64,
    pub unverified: u64,
    pub admins: u64,
    pub users: u64,
    pub new_this_month: u64,
}
