use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{push_opt, push_text, QueryParams, SortOrder};

/// Lifecycle state of a [Rental]. Transitions are owned by the backend; the client only reads it.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RentalStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
    Overdue,
    #[serde(other)]
    Unknown,
}

/// Badge colour used when listing rentals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Green,
    Blue,
    Yellow,
    Red,
    Orange,
    Gray,
}

impl RentalStatus {
    /// Display colour of the status badge
    pub const fn color(self) -> StatusColor {
        match self {
            Self::Active => StatusColor::Green,
            Self::Completed => StatusColor::Blue,
            Self::Pending => StatusColor::Yellow,
            Self::Cancelled => StatusColor::Red,
            Self::Overdue => StatusColor::Orange,
            Self::Confirmed | Self::Unknown => StatusColor::Gray,
        }
    }
}

/// Payment options offered at checkout
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
    Cash,
}

impl PaymentMethod {
    pub const ALL: [Self; 4] = [Self::CreditCard, Self::DebitCard, Self::Paypal, Self::Cash];

    /// Human readable label of the option
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreditCard => "Credit Card",
            Self::DebitCard => "Debit Card",
            Self::Paypal => "PayPal",
            Self::Cash => "Cash",
        }
    }
}

/// Settlement state of a rental payment
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Completed,
    Failed,
    Refunded,
    #[serde(other)]
    Unknown,
}

/// Renter summary populated into a [Rental]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RentalUser {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub age: Option<u32>,
}

/// Car summary populated into a [Rental]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RentalCar {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Branch summary populated into pickup and return details
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BranchSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
}

/// Branch reference of a pickup or return. The backend sends either the populated branch or its
/// bare id depending on the endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum BranchRef {
    Populated(BranchSummary),
    Id(String),
}

impl BranchRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Populated(summary) => &summary.id,
            Self::Id(id) => id,
        }
    }

    /// Branch name when populated, otherwise the id
    pub fn label(&self) -> &str {
        match self {
            Self::Populated(summary) => &summary.name,
            Self::Id(id) => id,
        }
    }
}

/// Pickup details of a [Rental]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PickupInfo {
    #[serde(default)]
    pub location: String,
    pub branch: BranchRef,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
}

/// Return details of a [Rental]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReturnInfo {
    #[serde(default)]
    pub location: String,
    pub branch: BranchRef,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub actual_return_time: Option<DateTime<Utc>>,
}

/// Extra charges added by the backend on top of the daily price
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalFees {
    #[serde(default)]
    pub insurance: f64,
    #[serde(default)]
    pub fuel: f64,
    #[serde(default)]
    pub cleaning: f64,
    #[serde(default)]
    pub late_return: f64,
}

impl AdditionalFees {
    pub fn total(&self) -> f64 {
        self.insurance + self.fuel + self.cleaning + self.late_return
    }
}

/// Payment details of a [Rental]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

/// Driver details of a [Rental]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DriverInfo {
    #[serde(default)]
    pub license_number: String,
    #[serde(default)]
    pub license_expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub additional_drivers: Vec<String>,
}

/// Booking record linking a user, a car, a date range and pickup/return branches
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "userId")]
    pub user: RentalUser,
    #[serde(rename = "carId")]
    pub car: RentalCar,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub price_per_day: f64,
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub additional_fees: AdditionalFees,
    #[serde(default)]
    pub final_amount: f64,
    pub status: RentalStatus,
    #[serde(default)]
    pub payment: Payment,
    pub pickup: PickupInfo,
    #[serde(rename = "return")]
    pub return_info: ReturnInfo,
    #[serde(default)]
    pub driver_info: DriverInfo,
    #[serde(default)]
    pub special_requests: String,
    #[serde(default)]
    pub admin_notes: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_overdue: bool,
    #[serde(default)]
    pub can_cancel: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Pickup or return leg of a [CreateRentalRequest]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RentalLeg {
    pub location: String,
    pub branch: String,
    pub time: DateTime<Utc>,
}

/// Driver block of a [CreateRentalRequest]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DriverRequest {
    pub license_number: String,
    pub license_expiry: DateTime<Utc>,
}

/// Odometer reading taken at pickup
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MileageReading {
    pub mileage: u32,
}

/// Car condition block of a [CreateRentalRequest]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionRequest {
    pub pickup: MileageReading,
}

/// Payment block of a [CreateRentalRequest]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentRequest {
    pub method: PaymentMethod,
}

/// Body of `POST /api/rentals`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateRentalRequest {
    pub car_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub pickup: RentalLeg,
    #[serde(rename = "return")]
    pub return_leg: RentalLeg,
    pub driver_info: DriverRequest,
    pub car_condition: ConditionRequest,
    pub special_requests: String,
    pub payment: PaymentRequest,
}

/// Body of the admin status update
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RentalStatusUpdate {
    pub status: RentalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
}

/// Body of the admin cancellation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct RentalCancellation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Optional return report sent when an admin completes a rental
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RentalCompletion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_report: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Query of the admin rental listing
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct AdminRentalsParams {
    pub page: u32,
    pub limit: u32,
    pub status: Option<RentalStatus>,
    pub user_id: Option<String>,
    pub car_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sort_by: String,
    pub sort_order: SortOrder,
}

impl Default for AdminRentalsParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            status: None,
            user_id: None,
            car_id: None,
            start_date: None,
            end_date: None,
            sort_by: "createdAt".to_owned(),
            sort_order: SortOrder::Desc,
        }
    }
}

impl QueryParams for AdminRentalsParams {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("sortBy", self.sort_by.clone()),
            ("sortOrder", self.sort_order.to_string()),
        ];
        push_opt(&mut query, "status", self.status.as_ref());
        push_text(&mut query, "userId", self.user_id.as_deref().unwrap_or_default());
        push_text(&mut query, "carId", self.car_id.as_deref().unwrap_or_default());
        push_opt(&mut query, "startDate", self.start_date.as_ref());
        push_opt(&mut query, "endDate", self.end_date.as_ref());
        query
    }
}

/// Aggregated rental figures for the dashboard
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RentalStats {
    pub total: u64,
    pub active: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub pending: u64,
    pub overdue: u64,
    pub total_revenue: f64,
    pub monthly_revenue: f64,
}
