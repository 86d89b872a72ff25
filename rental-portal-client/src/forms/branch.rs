use std::collections::HashMap;

use common::error::{CrResult, FieldErrors};
use once_cell::sync::Lazy;
use rental_portal_common::branch::{Branch, BranchData, Coordinates, GeoPoint};

use super::{into_result, require};
use crate::{context::AppContext, queries, toast::Toast};

/// Coordinates filled in automatically when one of these cities is picked
static CITY_COORDINATES: Lazy<HashMap<&'static str, Coordinates>> = Lazy::new(|| {
    HashMap::from([
        ("New York", Coordinates::new(-74.0059, 40.7128)),
        ("Los Angeles", Coordinates::new(-118.2437, 34.0522)),
        ("London", Coordinates::new(-0.1276, 51.5074)),
        ("Paris", Coordinates::new(2.3522, 48.8566)),
        ("Tokyo", Coordinates::new(139.6917, 35.6895)),
        ("Dubai", Coordinates::new(55.2708, 25.1972)),
        ("Cairo", Coordinates::new(31.2357, 30.0444)),
        ("Miami", Coordinates::new(-80.1918, 25.7617)),
        ("Chicago", Coordinates::new(-87.6298, 41.8781)),
        ("Toronto", Coordinates::new(-79.3832, 43.6532)),
    ])
});

/// Known coordinates of `city`, `[0, 0]` for any other city
pub fn city_coordinates(city: &str) -> Coordinates {
    CITY_COORDINATES
        .get(city.trim())
        .copied()
        .unwrap_or_default()
}

/// Cities with known coordinates, sorted for the city picker
pub fn known_cities() -> Vec<&'static str> {
    let mut cities: Vec<&'static str> = CITY_COORDINATES.keys().copied().collect();
    cities.sort_unstable();
    cities
}

/// Create or edit form of a branch
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BranchForm {
    /// Id of the edited branch, [None] when creating
    branch_id: Option<String>,
    pub name: String,
    pub address: String,
    city: String,
    pub country: String,
    coordinates: Coordinates,
}

impl From<&Branch> for BranchForm {
    fn from(value: &Branch) -> Self {
        Self {
            branch_id: Some(value.id.clone()),
            name: value.name.clone(),
            address: value.address.clone(),
            city: value.city.clone(),
            country: value.country.clone(),
            coordinates: value.location.coordinates,
        }
    }
}

impl BranchForm {
    pub fn branch_id(&self) -> Option<&str> {
        self.branch_id.as_deref()
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub const fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    /// Change the city and replace the coordinates with the city's known location
    pub fn set_city<C: Into<String>>(&mut self, city: C) {
        self.city = city.into();
        self.coordinates = city_coordinates(&self.city);
    }

    pub fn set_longitude(&mut self, longitude: f64) {
        self.coordinates.longitude = longitude;
    }

    pub fn set_latitude(&mut self, latitude: f64) {
        self.coordinates.latitude = latitude;
    }

    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name, "Name is required");
        require(&mut errors, "address", &self.address, "Address is required");
        require(&mut errors, "city", &self.city, "City is required");
        require(&mut errors, "country", &self.country, "Country is required");
        errors
    }

    /// Validated create or update body
    /// # Errors
    /// This function will return an error if a required field is blank
    pub fn to_data(&self) -> CrResult<BranchData> {
        into_result(self.validate())?;
        Ok(BranchData {
            name: self.name.trim().to_owned(),
            address: self.address.trim().to_owned(),
            city: self.city.trim().to_owned(),
            country: self.country.trim().to_owned(),
            location: GeoPoint::new(self.coordinates),
        })
    }

    /// Create the branch, or update it when the form was opened on an existing one
    pub async fn submit(&self, context: &AppContext) -> Toast {
        let result = match (self.to_data(), &self.branch_id) {
            (Ok(data), Some(branch_id)) => {
                queries::branches::update_branch(context, branch_id, &data).await
            }
            (Ok(data), None) => queries::branches::create_branch(context, &data).await,
            (Err(error), _) => Err(error),
        };
        match result {
            Ok(branch) if self.branch_id.is_some() => {
                Toast::confirmed("Branch updated", &format!("{} was saved", branch.name))
            }
            Ok(branch) => Toast::confirmed("Branch created", &format!("{} was added", branch.name)),
            Err(error) => Toast::from_error("Failed to save branch", "save the branch", &error),
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use rental_portal_common::{
        branch::{Branch, Coordinates},
        user::Role,
    };
    use rstest::rstest;
    use serde_json::json;

    use super::{city_coordinates, BranchForm};
    use crate::{
        api::{test::transport_once, Method, MockTransport},
        context::test::{context_with, signed_in},
        toast::ToastAction,
    };

    #[rstest]
    #[case::new_york("New York", Coordinates::new(-74.0059, 40.7128))]
    #[case::cairo("Cairo", Coordinates::new(31.2357, 30.0444))]
    #[case::unknown("Springfield", Coordinates::new(0.0, 0.0))]
    fn city_coordinates_should_use_known_table(#[case] city: &str, #[case] expected: Coordinates) {
        assert_eq!(city_coordinates(city), expected);
    }

    #[test]
    fn city_change_should_move_coordinates_when_editing() {
        let mut form = BranchForm {
            name: "Midtown".to_owned(),
            address: "5th Avenue".to_owned(),
            country: "USA".to_owned(),
            ..BranchForm::default()
        };
        form.set_city("New York");

        let created = form.to_data().expect("Form should validate");
        assert_eq!(created.location.coordinates, Coordinates::new(-74.0059, 40.7128));

        let branch: Branch = serde_json::from_value(json!({
            "_id": "b1",
            "name": created.name,
            "address": created.address,
            "city": created.city,
            "country": created.country,
            "location": created.location
        }))
        .expect("Failed to build branch");
        let mut edit = BranchForm::from(&branch);
        assert_eq!(edit.branch_id(), Some("b1"));
        edit.set_city("Tokyo");

        let updated = edit.to_data().expect("Form should validate");
        assert_eq!(updated.location.coordinates, Coordinates::new(139.6917, 35.6895));
        let wire = serde_json::to_value(&updated).expect("Failed to serialize");
        assert_eq!(wire["location"], json!({"type": "Point", "coordinates": [139.6917, 35.6895]}));
    }

    #[test]
    fn coordinates_should_be_editable_individually() {
        let mut form = BranchForm::default();
        form.set_city("Paris");

        form.set_latitude(48.9);

        assert_eq!(form.coordinates(), Coordinates::new(2.3522, 48.9));
    }

    #[tokio::test]
    async fn submit_should_create_new_branch() {
        let context = signed_in(
            transport_once(
                Method::Post,
                "/api/admin/branches",
                201,
                json!({"success": true, "data": {
                    "_id": "b9", "name": "Midtown", "address": "5th Avenue", "city": "New York", "country": "USA",
                    "location": {"type": "Point", "coordinates": [-74.0059, 40.7128]}
                }}),
            ),
            Role::Admin,
        )
        .await;
        let mut form = BranchForm {
            name: "Midtown".to_owned(),
            address: "5th Avenue".to_owned(),
            country: "USA".to_owned(),
            ..BranchForm::default()
        };
        form.set_city("New York");

        let toast = form.submit(&context).await;

        assert_eq!(toast.title, "Branch created");
        assert_eq!(form.branch_id(), None);
    }

    #[tokio::test]
    async fn submit_without_session_should_ask_to_log_in_for_branch() {
        let context = context_with(Arc::new(MockTransport::new()));
        let mut form = BranchForm {
            name: "Midtown".to_owned(),
            address: "5th Avenue".to_owned(),
            country: "USA".to_owned(),
            ..BranchForm::default()
        };
        form.set_city("New York");

        let toast = form.submit(&context).await;

        assert_eq!(toast.title, "Authentication Required");
        assert_eq!(
            toast.description.as_deref(),
            Some("Please log in to save the branch. Redirecting to login...")
        );
        assert_eq!(toast.action, Some(ToastAction::Login));
    }

    #[test]
    fn blank_fields_should_fail_validation() {
        let errors = BranchForm::default().validate();

        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get("city").map(String::as_str), Some("City is required"));
    }
}
