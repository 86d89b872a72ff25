use serde::{Deserialize, Serialize};

use crate::{push_opt, push_text, QueryParams};

/// Technical specification block of a [Car]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalSpecs {
    pub gear_box: String,
    pub fuel: String,
    pub doors: u8,
    pub seats: u8,
    pub air_conditioner: bool,
    #[serde(default)]
    pub distance: String,
}

/// Equipment flags of a [Car]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    #[serde(rename = "ABS")]
    pub abs: bool,
    pub air_bags: bool,
    pub air_conditioning: bool,
    pub cruise_control: bool,
}

/// Vehicle offered for rent
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub brand: String,
    pub price_per_day: f64,
    #[serde(default = "available_by_default")]
    pub is_available: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub technical_specs: TechnicalSpecs,
    pub equipment: Equipment,
}

/// Cars without an explicit flag are bookable
const fn available_by_default() -> bool {
    true
}

impl Car {
    /// Display name combining brand and model, e.g. `BMW X5`
    pub fn display_name(&self) -> String {
        format!("{} {}", self.brand, self.name)
    }

    /// First image path, used as the card thumbnail
    pub fn thumbnail(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Filters accepted by the public car search endpoint
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CarSearchParams {
    pub brand: Option<String>,
    pub gear_box: Option<String>,
    pub fuel: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl QueryParams for CarSearchParams {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        push_text(&mut query, "brand", self.brand.as_deref().unwrap_or_default());
        push_text(&mut query, "gearBox", self.gear_box.as_deref().unwrap_or_default());
        push_text(&mut query, "fuel", self.fuel.as_deref().unwrap_or_default());
        push_opt(&mut query, "minPrice", self.min_price.as_ref());
        push_opt(&mut query, "maxPrice", self.max_price.as_ref());
        query
    }
}

/// Image file attached to a car creation request. Sent as one multipart part each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Body of an admin car creation. Serialized as multipart form fields by the HTTP layer since
/// image files travel with it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CarData {
    pub name: String,
    pub brand: String,
    pub price_per_day: f64,
    pub technical_specs: TechnicalSpecs,
    pub equipment: Equipment,
    pub images: Vec<CarImage>,
    pub description: Option<String>,
    pub is_available: Option<bool>,
}

/// Sparse JSON body of an admin car update. Unset fields are left untouched by the backend.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CarUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_day: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_specs: Option<TechnicalSpecs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment: Option<Equipment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::{Car, CarSearchParams};
    use crate::QueryParams;

    #[test]
    fn car_should_deserialize_backend_shape() {
        let value = json!({
            "_id": "64f1",
            "name": "X5",
            "brand": "BMW",
            "pricePerDay": 120.5,
            "images": ["uploads/x5.png"],
            "technicalSpecs": {
                "gearBox": "Automatic",
                "fuel": "Diesel",
                "doors": 5,
                "seats": 5,
                "airConditioner": true,
                "distance": "500km"
            },
            "equipment": {"ABS": true, "airBags": true, "airConditioning": true, "cruiseControl": false},
            "__v": 0
        });

        let car: Car = serde_json::from_value(value).expect("Failed to deserialize car");

        assert_eq!(car.display_name(), "BMW X5");
        assert!(car.is_available);
        assert!(car.equipment.abs);
        assert_eq!(car.thumbnail(), Some("uploads/x5.png"));
    }

    #[test]
    fn search_params_should_skip_unset_filters() {
        let params = CarSearchParams {
            brand: Some("Toyota".to_owned()),
            fuel: Some("  ".to_owned()),
            max_price: Some(80.0),
            ..CarSearchParams::default()
        };

        assert_eq!(
            params.to_query(),
            vec![("brand", "Toyota".to_owned()), ("maxPrice", "80".to_owned())]
        );
        assert!(!CarSearchParams::default().has_any());
    }
}
