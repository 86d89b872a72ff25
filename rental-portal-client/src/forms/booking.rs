use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use common::error::{CrResult, FieldErrors};
use rental_portal_common::{
    branch::Branch,
    rental::{
        ConditionRequest, CreateRentalRequest, DriverRequest, MileageReading, PaymentMethod,
        PaymentRequest, RentalLeg,
    },
};

use super::{reject, require};
use crate::{
    context::AppContext,
    queries,
    toast::Toast,
    wizard::{StepForm, Wizard},
};

/// Shown when a booking succeeds and the backend sent no message
const BOOKING_CONFIRMED: &str = "Your car rental has been confirmed.";

/// Steps of the booking wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingStep {
    /// Start and end dates
    Dates,
    /// Pickup and return branches and times plus driver details
    Logistics,
    /// Car condition, special requests and payment
    Checkout,
}

/// Raw input of a pickup or return
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegInput {
    /// Branch name shown to the user
    pub location: String,
    /// Branch id sent to the backend
    pub branch: String,
    /// Time of day as `HH:MM`
    pub time: String,
}

impl LegInput {
    /// Select `branch_id` from `branches`. The location label follows the branch name and is
    /// blank for an unknown id.
    fn select(&mut self, branches: &[Branch], branch_id: &str) {
        self.location = branches
            .iter()
            .find(|branch| branch.id == branch_id)
            .map(|branch| branch.name.clone())
            .unwrap_or_default();
        self.branch = branch_id.to_owned();
    }

    fn validate(&self, errors: &mut FieldErrors, fields: [&'static str; 3], label: &str) {
        require(errors, fields[0], &self.location, &format!("{label} location is required"));
        require(errors, fields[1], &self.branch, &format!("{label} branch is required"));
        require(errors, fields[2], &self.time, &format!("{label} time is required"));
        if !self.time.trim().is_empty() && parse_time(&self.time).is_none() {
            reject(errors, fields[2], &format!("{label} time is invalid"));
        }
    }
}

/// Raw input of the booking wizard for a single car
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingForm {
    pub car_id: String,
    /// Start date as `YYYY-MM-DD`
    pub start_date: String,
    /// End date as `YYYY-MM-DD`
    pub end_date: String,
    pub pickup: LegInput,
    pub return_leg: LegInput,
    pub license_number: String,
    /// Licence expiry as `YYYY-MM-DD`
    pub license_expiry: String,
    /// Odometer reading at pickup
    pub mileage: String,
    pub special_requests: String,
    pub payment_method: Option<PaymentMethod>,
}

impl BookingForm {
    pub fn new<C: Into<String>>(car_id: C) -> Self {
        Self {
            car_id: car_id.into(),
            ..Self::default()
        }
    }

    pub fn select_pickup_branch(&mut self, branches: &[Branch], branch_id: &str) {
        self.pickup.select(branches, branch_id);
    }

    pub fn select_return_branch(&mut self, branches: &[Branch], branch_id: &str) {
        self.return_leg.select(branches, branch_id);
    }

    /// Convert the validated input into the create request. Dates are midnight UTC and leg
    /// times are the leg's date plus its time of day, in UTC.
    fn to_request(&self) -> Option<CreateRentalRequest> {
        let start_date = parse_date(&self.start_date)?;
        let end_date = parse_date(&self.end_date)?;
        Some(CreateRentalRequest {
            car_id: self.car_id.clone(),
            start_date: midnight(start_date)?,
            end_date: midnight(end_date)?,
            pickup: RentalLeg {
                location: self.pickup.location.trim().to_owned(),
                branch: self.pickup.branch.clone(),
                time: at_time(start_date, parse_time(&self.pickup.time)?),
            },
            return_leg: RentalLeg {
                location: self.return_leg.location.trim().to_owned(),
                branch: self.return_leg.branch.clone(),
                time: at_time(end_date, parse_time(&self.return_leg.time)?),
            },
            driver_info: DriverRequest {
                license_number: self.license_number.trim().to_owned(),
                license_expiry: midnight(parse_date(&self.license_expiry)?)?,
            },
            car_condition: ConditionRequest {
                pickup: MileageReading {
                    mileage: self.mileage.trim().parse().ok()?,
                },
            },
            special_requests: self.special_requests.trim().to_owned(),
            payment: PaymentRequest {
                method: self.payment_method?,
            },
        })
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

fn at_time(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(time))
}

fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|value| Utc.from_utc_datetime(&value))
}

/// Record an error for a required date field that is blank or malformed
fn validate_date(errors: &mut FieldErrors, field: &'static str, value: &str, label: &str) {
    require(errors, field, value, &format!("{label} is required"));
    if parse_date(value).is_none() {
        reject(errors, field, &format!("{label} is invalid"));
    }
}

impl StepForm for BookingForm {
    type Step = BookingStep;

    fn steps() -> &'static [BookingStep] {
        &[BookingStep::Dates, BookingStep::Logistics, BookingStep::Checkout]
    }

    fn validate_step(&self, step: BookingStep) -> FieldErrors {
        let mut errors = FieldErrors::new();
        match step {
            BookingStep::Dates => {
                validate_date(&mut errors, "startDate", &self.start_date, "Start date");
                validate_date(&mut errors, "endDate", &self.end_date, "End date");
            }
            BookingStep::Logistics => {
                self.pickup.validate(
                    &mut errors,
                    ["pickup.location", "pickup.branch", "pickup.time"],
                    "Pickup",
                );
                self.return_leg.validate(
                    &mut errors,
                    ["return.location", "return.branch", "return.time"],
                    "Return",
                );
                require(
                    &mut errors,
                    "driverInfo.licenseNumber",
                    &self.license_number,
                    "License number is required",
                );
                validate_date(
                    &mut errors,
                    "driverInfo.licenseExpiry",
                    &self.license_expiry,
                    "License expiry",
                );
            }
            BookingStep::Checkout => {
                require(
                    &mut errors,
                    "carCondition.pickup.mileage",
                    &self.mileage,
                    "Mileage is required",
                );
                if self.mileage.trim().parse::<u32>().is_err() {
                    reject(
                        &mut errors,
                        "carCondition.pickup.mileage",
                        "Mileage must be a whole number",
                    );
                }
                if self.payment_method.is_none() {
                    reject(&mut errors, "payment.method", "Payment method is required");
                }
            }
        }
        errors
    }

    fn validate_across_steps(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        let pickup = self.pickup.branch.trim();
        if !pickup.is_empty() && pickup == self.return_leg.branch.trim() {
            reject(
                &mut errors,
                "return.branch",
                "Return branch must differ from pickup branch",
            );
        }
        errors
    }
}

/// Booking wizard for a single car
pub type BookingWizard = Wizard<BookingForm>;

impl Wizard<BookingForm> {
    /// Validated create request. Moves back to the first invalid step on failure.
    /// # Errors
    /// This function will return an error if any step does not validate or the pickup and
    /// return branches are the same
    pub fn request(&mut self) -> CrResult<CreateRentalRequest> {
        self.ensure_submittable()?;
        self.form()
            .to_request()
            .ok_or_else(|| "Booking details could not be converted".into())
    }

    /// Create the rental and describe the outcome as a toast. A missing or expired session
    /// produces the sign in prompt.
    pub async fn submit(&mut self, context: &AppContext) -> Toast {
        let result = match self.request() {
            Ok(request) => queries::rentals::create_rental(context, &request).await,
            Err(error) => Err(error),
        };
        match result {
            Ok(confirmed) => {
                let description = if confirmed.message.trim().is_empty() {
                    BOOKING_CONFIRMED
                } else {
                    confirmed.message.as_str()
                };
                Toast::confirmed("Rental Created Successfully!", description)
            }
            Err(error) => Toast::from_error("Rental Creation Failed", "create a rental", &error),
        }
    }
}
