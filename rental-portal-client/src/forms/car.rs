use common::error::{CrResult, FieldErrors};
use rental_portal_common::car::{Car, CarData, CarImage, CarUpdate, Equipment, TechnicalSpecs};

use super::{into_result, non_blank, reject, require};
use crate::{context::AppContext, queries, toast::Toast};

/// Admin create or edit form of a car
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CarForm {
    /// Id of the edited car, [None] when creating
    car_id: Option<String>,
    pub name: String,
    pub brand: String,
    pub price_per_day: String,
    pub gear_box: String,
    pub fuel: String,
    pub doors: String,
    pub seats: String,
    pub air_conditioner: bool,
    pub distance: String,
    pub equipment: Equipment,
    pub description: String,
    pub is_available: bool,
    /// New image files, only sent on creation
    pub images: Vec<CarImage>,
}

impl From<&Car> for CarForm {
    fn from(value: &Car) -> Self {
        Self {
            car_id: Some(value.id.clone()),
            name: value.name.clone(),
            brand: value.brand.clone(),
            price_per_day: value.price_per_day.to_string(),
            gear_box: value.technical_specs.gear_box.clone(),
            fuel: value.technical_specs.fuel.clone(),
            doors: value.technical_specs.doors.to_string(),
            seats: value.technical_specs.seats.to_string(),
            air_conditioner: value.technical_specs.air_conditioner,
            distance: value.technical_specs.distance.clone(),
            equipment: value.equipment,
            description: value.description.clone().unwrap_or_default(),
            is_available: value.is_available,
            images: Vec::new(),
        }
    }
}

/// Parse a strictly positive count such as seats or doors
fn positive_count(value: &str) -> Option<u8> {
    value.trim().parse::<u8>().ok().filter(|count| *count > 0)
}

fn positive_price(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price > 0.0)
}

impl CarForm {
    /// Empty form for a new, available car
    pub fn new() -> Self {
        Self {
            is_available: true,
            ..Self::default()
        }
    }

    pub fn car_id(&self) -> Option<&str> {
        self.car_id.as_deref()
    }

    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name, "Name is required");
        require(&mut errors, "brand", &self.brand, "Brand is required");
        if positive_price(&self.price_per_day).is_none() {
            reject(&mut errors, "pricePerDay", "Price must be greater than 0");
        }
        if positive_count(&self.seats).is_none() {
            reject(&mut errors, "technicalSpecs.seats", "Seats must be greater than 0");
        }
        if positive_count(&self.doors).is_none() {
            reject(&mut errors, "technicalSpecs.doors", "Doors must be greater than 0");
        }
        errors
    }

    fn technical_specs(&self) -> TechnicalSpecs {
        TechnicalSpecs {
            gear_box: self.gear_box.trim().to_owned(),
            fuel: self.fuel.trim().to_owned(),
            doors: positive_count(&self.doors).unwrap_or_default(),
            seats: positive_count(&self.seats).unwrap_or_default(),
            air_conditioner: self.air_conditioner,
            distance: self.distance.trim().to_owned(),
        }
    }

    /// Validated creation body, images included
    /// # Errors
    /// This function will return an error if the form does not validate
    pub fn to_data(&self) -> CrResult<CarData> {
        into_result(self.validate())?;
        Ok(CarData {
            name: self.name.trim().to_owned(),
            brand: self.brand.trim().to_owned(),
            price_per_day: positive_price(&self.price_per_day).unwrap_or_default(),
            technical_specs: self.technical_specs(),
            equipment: self.equipment,
            images: self.images.clone(),
            description: non_blank(&self.description),
            is_available: Some(self.is_available),
        })
    }

    /// Validated update body. Images are managed separately and never sent here.
    /// # Errors
    /// This function will return an error if the form does not validate
    pub fn to_update(&self) -> CrResult<CarUpdate> {
        into_result(self.validate())?;
        Ok(CarUpdate {
            name: Some(self.name.trim().to_owned()),
            brand: Some(self.brand.trim().to_owned()),
            price_per_day: positive_price(&self.price_per_day),
            technical_specs: Some(self.technical_specs()),
            equipment: Some(self.equipment),
            description: non_blank(&self.description),
            is_available: Some(self.is_available),
        })
    }

    /// Create the car with its images, or update it when the form was opened on an existing one
    pub async fn submit(&self, context: &AppContext) -> Toast {
        let result = match &self.car_id {
            Some(car_id) => match self.to_update() {
                Ok(update) => queries::cars::update_car(context, car_id, &update).await,
                Err(error) => Err(error),
            },
            None => match self.to_data() {
                Ok(data) => queries::cars::create_car(context, data).await,
                Err(error) => Err(error),
            },
        };
        match result {
            Ok(car) if self.car_id.is_some() => {
                Toast::confirmed("Car updated", &format!("{} was saved", car.display_name()))
            }
            Ok(car) => Toast::confirmed("Car created", &format!("{} was added", car.display_name())),
            Err(error) => Toast::from_error("Failed to save car", "save the car", &error),
        }
    }
}

#[cfg(test)]
mod test {
    use common::error::CrError;
    use rental_portal_common::{car::Car, user::Role};
    use rstest::rstest;
    use serde_json::json;

    use super::CarForm;
    use crate::{
        api::{test::transport_once, Method},
        context::test::signed_in,
        toast::ToastKind,
    };

    fn valid_form() -> CarForm {
        CarForm {
            name: "X5".to_owned(),
            brand: "BMW".to_owned(),
            price_per_day: "120.5".to_owned(),
            gear_box: "Automatic".to_owned(),
            fuel: "Diesel".to_owned(),
            doors: "5".to_owned(),
            seats: "5".to_owned(),
            ..CarForm::new()
        }
    }

    #[rstest]
    #[case::zero_price("pricePerDay", |form: &mut CarForm| form.price_per_day = "0".to_owned())]
    #[case::text_price("pricePerDay", |form: &mut CarForm| form.price_per_day = "cheap".to_owned())]
    #[case::zero_seats("technicalSpecs.seats", |form: &mut CarForm| form.seats = "0".to_owned())]
    #[case::no_doors("technicalSpecs.doors", |form: &mut CarForm| form.doors.clear())]
    #[case::no_brand("brand", |form: &mut CarForm| form.brand = " ".to_owned())]
    fn validate_should_flag_field(#[case] field: &str, #[case] edit: fn(&mut CarForm)) {
        let mut form = valid_form();
        edit(&mut form);

        let errors = form.validate();

        assert!(errors.contains_key(field), "{errors:?}");
    }

    #[test]
    fn to_data_should_allow_missing_images() {
        let data = valid_form().to_data().expect("Form should validate");

        assert!(data.images.is_empty());
        assert_eq!(data.technical_specs.seats, 5);
        assert_eq!(data.is_available, Some(true));
        assert_eq!(data.description, None);
    }

    #[test]
    fn to_update_should_reject_invalid_form() {
        let form = CarForm::new();

        assert!(matches!(form.to_update(), Err(CrError::Validation(_))));
    }

    #[tokio::test]
    async fn submit_should_update_existing_car() {
        let car_json = json!({
            "_id": "c1",
            "name": "X5",
            "brand": "BMW",
            "pricePerDay": 99.0,
            "technicalSpecs": {"gearBox": "Automatic", "fuel": "Diesel", "doors": 5, "seats": 5, "airConditioner": true},
            "equipment": {"ABS": true, "airBags": true, "airConditioning": true, "cruiseControl": true}
        });
        let car: Car = serde_json::from_value(car_json.clone()).expect("Failed to build car");
        let context = signed_in(
            transport_once(
                Method::Put,
                "/api/cars/c1",
                200,
                json!({"success": true, "data": car_json}),
            ),
            Role::Admin,
        )
        .await;
        let form = CarForm::from(&car);

        let toast = form.submit(&context).await;

        assert_eq!(form.car_id(), Some("c1"));
        assert_eq!(toast.kind, ToastKind::Success);
        assert_eq!(toast.description.as_deref(), Some("BMW X5 was saved"));
    }
}
