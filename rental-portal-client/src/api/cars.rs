use common::error::CrResult;
use rental_portal_common::{
    car::{Car, CarData, CarSearchParams, CarUpdate},
    QueryParams,
};

use super::{acknowledge, fetch, ApiRequest, AuthorizedApi, MultipartField, UnauthorizedApi};

impl UnauthorizedApi {
    /// Fetch every car in the fleet
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn cars(&self) -> CrResult<Vec<Car>> {
        fetch(&*self.transport, ApiRequest::get("/api/cars"), "Failed to fetch cars").await
    }

    /// Fetch the cars matching every filter set in `params`
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn search_cars(&self, params: &CarSearchParams) -> CrResult<Vec<Car>> {
        let request = ApiRequest::get("/api/cars/search").query(params.to_query());
        fetch(&*self.transport, request, "Failed to search cars").await
    }

    /// Fetch a single car
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn car(&self, car_id: &str) -> CrResult<Car> {
        let request = ApiRequest::get(format!("/api/cars/{car_id}"));
        fetch(&*self.transport, request, "Failed to fetch car").await
    }

    /// Fetch the cars the backend considers similar to `car_id`
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn similar_cars(&self, car_id: &str) -> CrResult<Vec<Car>> {
        let request = ApiRequest::get(format!("/api/cars/{car_id}/similar"));
        fetch(&*self.transport, request, "Failed to fetch similar cars").await
    }
}

/// Flatten `car` into multipart fields. Nested objects use bracket keys
/// (`technicalSpecs[gearBox]`) and every image is sent as an `images` file part.
pub fn car_multipart(car: CarData) -> Vec<MultipartField> {
    let specs = &car.technical_specs;
    let equipment = &car.equipment;
    let mut fields = vec![
        MultipartField::text("name", &car.name),
        MultipartField::text("brand", &car.brand),
        MultipartField::text("pricePerDay", car.price_per_day),
        MultipartField::text("technicalSpecs[gearBox]", &specs.gear_box),
        MultipartField::text("technicalSpecs[fuel]", &specs.fuel),
        MultipartField::text("technicalSpecs[doors]", specs.doors),
        MultipartField::text("technicalSpecs[seats]", specs.seats),
        MultipartField::text("technicalSpecs[airConditioner]", specs.air_conditioner),
        MultipartField::text("technicalSpecs[distance]", &specs.distance),
        MultipartField::text("equipment[ABS]", equipment.abs),
        MultipartField::text("equipment[airBags]", equipment.air_bags),
        MultipartField::text("equipment[airConditioning]", equipment.air_conditioning),
        MultipartField::text("equipment[cruiseControl]", equipment.cruise_control),
    ];
    if let Some(description) = &car.description {
        fields.push(MultipartField::text("description", description));
    }
    if let Some(is_available) = car.is_available {
        fields.push(MultipartField::text("isAvailable", is_available));
    }
    fields.extend(car.images.into_iter().map(|image| MultipartField::File {
        name: "images".to_owned(),
        file_name: image.file_name,
        content_type: image.content_type,
        bytes: image.bytes,
    }));
    fields
}

impl AuthorizedApi {
    /// Create a car. Images are uploaded in the same multipart request.
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn create_car(&self, car: CarData) -> CrResult<Car> {
        let request = self.authorized(ApiRequest::post("/api/cars").multipart(car_multipart(car)));
        fetch(&*self.transport, request, "Failed to create car").await
    }

    /// Apply the sparse `update` to the car specified by `car_id`
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn update_car(&self, car_id: &str, update: &CarUpdate) -> CrResult<Car> {
        let request = self.authorized(ApiRequest::put(format!("/api/cars/{car_id}")).json(update)?);
        fetch(&*self.transport, request, "Failed to update car").await
    }

    /// Delete the car specified by `car_id`
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn delete_car(&self, car_id: &str) -> CrResult<String> {
        let request = self.authorized(ApiRequest::delete(format!("/api/cars/{car_id}")));
        acknowledge(
            &*self.transport,
            request,
            "Failed to delete car",
            "Car deleted successfully",
        )
        .await
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use common::error::CrResult;
    use rental_portal_common::car::{CarData, CarImage, CarSearchParams};
    use serde_json::json;

    use super::car_multipart;
    use crate::api::{
        test::transport_once, ApiRequest, Method, MockTransport, MultipartField, RawResponse,
        RequestBody, UnauthorizedApi,
    };

    fn car_json(id: &str, brand: &str) -> serde_json::Value {
        json!({
            "_id": id,
            "name": "Model",
            "brand": brand,
            "pricePerDay": 50,
            "technicalSpecs": {"gearBox": "Manual", "fuel": "Petrol", "doors": 4, "seats": 5, "airConditioner": true},
            "equipment": {"ABS": true, "airBags": true, "airConditioning": true, "cruiseControl": false}
        })
    }

    #[tokio::test]
    async fn search_cars_should_send_only_set_filters() -> CrResult<()> {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|request: &ApiRequest| {
                request.path == "/api/cars/search"
                    && request.bearer.is_none()
                    && request.query == vec![("brand", "Toyota".to_owned())]
            })
            .times(1)
            .returning(|_| {
                Ok(RawResponse::json(
                    200,
                    &json!({"success": true, "count": 1, "data": [car_json("c1", "Toyota")]}),
                ))
            });
        let api = UnauthorizedApi::new(Arc::new(transport));
        let params = CarSearchParams {
            brand: Some("Toyota".to_owned()),
            ..CarSearchParams::default()
        };

        let cars = api.search_cars(&params).await?;

        assert_eq!(cars.len(), 1);
        assert_eq!(cars[0].brand, "Toyota");
        Ok(())
    }

    #[tokio::test]
    async fn car_should_use_fallback_when_body_has_no_message() {
        let api = UnauthorizedApi::new(transport_once(
            Method::Get,
            "/api/cars/missing",
            404,
            json!({"success": false}),
        ));

        let error = api.car("missing").await.expect_err("Fetch should fail");

        assert_eq!(error.user_message(), "Failed to fetch car");
    }

    #[tokio::test]
    async fn create_car_should_upload_images_as_multipart() -> CrResult<()> {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|request: &ApiRequest| match &request.body {
                RequestBody::Multipart(fields) => {
                    request.method == Method::Post
                        && fields.iter().any(|field| {
                            matches!(field, MultipartField::File { name, file_name, .. }
                                if name == "images" && file_name == "front.png")
                        })
                }
                _ => false,
            })
            .times(1)
            .returning(|_| {
                Ok(RawResponse::json(
                    201,
                    &json!({"success": true, "message": "Car created", "data": car_json("c9", "Kia")}),
                ))
            });
        let api = UnauthorizedApi::new(Arc::new(transport)).authorize("admin-token");
        let car = CarData {
            name: "Rio".to_owned(),
            brand: "Kia".to_owned(),
            price_per_day: 35.0,
            images: vec![CarImage {
                file_name: "front.png".to_owned(),
                content_type: "image/png".to_owned(),
                bytes: vec![1, 2, 3],
            }],
            ..CarData::default()
        };

        let created = api.create_car(car).await?;

        assert_eq!(created.id, "c9");
        Ok(())
    }

    #[test]
    fn car_multipart_should_flatten_nested_fields() {
        let car = CarData {
            name: "Rio".to_owned(),
            brand: "Kia".to_owned(),
            price_per_day: 35.5,
            description: Some("Compact".to_owned()),
            ..CarData::default()
        };

        let fields = car_multipart(car);

        assert!(fields.contains(&MultipartField::text("pricePerDay", 35.5)));
        assert!(fields.contains(&MultipartField::text("technicalSpecs[doors]", 0)));
        assert!(fields.contains(&MultipartField::text("equipment[ABS]", false)));
        assert!(fields.contains(&MultipartField::text("description", "Compact")));
        assert!(!fields.iter().any(|f| matches!(f, MultipartField::File { .. })));
    }
}
