use common::error::CrResult;
use rental_portal_common::{
    car::{Car, CarData, CarSearchParams, CarUpdate},
    QueryParams,
};

use super::{invalidate_roots, query_segment, CARS_STALE_TIME};
use crate::{cache::QueryKey, context::AppContext};

/// Roots touched by any car write
const CAR_ROOTS: [&str; 3] = ["cars", "searchCars", "similarCars"];

/// Every car. Never served stale, so each call asks the backend.
/// # Errors
/// This function will return an error if the request fails
pub async fn cars(context: &AppContext) -> CrResult<Vec<Car>> {
    context
        .cache()
        .fetch(QueryKey::root("cars"), CARS_STALE_TIME, || context.api().cars())
        .await
}

/// Search when any filter is set, otherwise the full listing
/// # Errors
/// This function will return an error if the request fails
pub async fn search_cars(context: &AppContext, params: &CarSearchParams) -> CrResult<Vec<Car>> {
    if !params.has_any() {
        return cars(context).await;
    }
    let key = QueryKey::root("searchCars").with(query_segment(params));
    context
        .cache()
        .fetch(key, CARS_STALE_TIME, || context.api().search_cars(params))
        .await
}

/// One car by id
/// # Errors
/// This function will return an error if the request fails
pub async fn car(context: &AppContext, car_id: &str) -> CrResult<Car> {
    context
        .cache()
        .fetch(QueryKey::root("cars").with(car_id), CARS_STALE_TIME, || {
            context.api().car(car_id)
        })
        .await
}

/// Cars similar to `car_id`
/// # Errors
/// This function will return an error if the request fails
pub async fn similar_cars(context: &AppContext, car_id: &str) -> CrResult<Vec<Car>> {
    context
        .cache()
        .fetch(
            QueryKey::root("similarCars").with(car_id),
            CARS_STALE_TIME,
            || context.api().similar_cars(car_id),
        )
        .await
}

/// Create a car with its images and refresh every car listing
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn create_car(context: &AppContext, car: CarData) -> CrResult<Car> {
    let created = context.authorized().await?.create_car(car).await?;
    invalidate_roots(context, &CAR_ROOTS).await;
    Ok(created)
}

/// Save a car and refresh every car listing
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn update_car(context: &AppContext, car_id: &str, update: &CarUpdate) -> CrResult<Car> {
    let updated = context.authorized().await?.update_car(car_id, update).await?;
    invalidate_roots(context, &CAR_ROOTS).await;
    Ok(updated)
}

/// Delete a car and refresh every car listing
/// # Errors
/// This function will return an error if nobody is signed in or the request fails
pub async fn delete_car(context: &AppContext, car_id: &str) -> CrResult<String> {
    let message = context.authorized().await?.delete_car(car_id).await?;
    context.cache().remove(&QueryKey::root("cars").with(car_id)).await;
    invalidate_roots(context, &CAR_ROOTS).await;
    Ok(message)
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use common::error::CrResult;
    use rental_portal_common::{car::CarSearchParams, user::Role};
    use serde_json::json;

    use super::{car, search_cars, update_car};
    use crate::{
        api::{test::transport_once, ApiRequest, Method, MockTransport, RawResponse},
        cache::{QueryKey, QueryState},
        context::test::{context_with, signed_in},
        queries::USER_STALE_TIME,
    };

    fn car_json(id: &str) -> serde_json::Value {
        json!({
            "_id": id,
            "name": "X5",
            "brand": "BMW",
            "pricePerDay": 120.0,
            "technicalSpecs": {"gearBox": "Automatic", "fuel": "Diesel", "doors": 5, "seats": 5, "airConditioner": true},
            "equipment": {"ABS": true, "airBags": true, "airConditioning": true, "cruiseControl": true}
        })
    }

    #[tokio::test]
    async fn search_without_filters_should_list_all_cars() -> CrResult<()> {
        let context = context_with(transport_once(
            Method::Get,
            "/api/cars",
            200,
            json!({"success": true, "data": [car_json("c1")]}),
        ));

        let cars = search_cars(&context, &CarSearchParams::default()).await?;

        assert_eq!(cars.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn search_with_filter_should_call_search_endpoint() -> CrResult<()> {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|request: &ApiRequest| {
                request.path == "/api/cars/search"
                    && request.query == vec![("brand", "BMW".to_owned())]
            })
            .times(1)
            .returning(|_| Ok(RawResponse::json(200, &json!({"success": true, "data": []}))));
        let context = context_with(Arc::new(transport));
        let params = CarSearchParams {
            brand: Some("BMW".to_owned()),
            ..CarSearchParams::default()
        };

        let cars = search_cars(&context, &params).await?;

        assert!(cars.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn update_should_invalidate_car_queries() -> CrResult<()> {
        let context = signed_in(
            transport_once(
                Method::Put,
                "/api/cars/c1",
                200,
                json!({"success": true, "data": car_json("c1")}),
            ),
            Role::Admin,
        )
        .await;
        let key = QueryKey::root("cars").with("c1");
        context.cache().set(key.clone(), 0_u8).await;

        update_car(&context, "c1", &Default::default()).await?;

        assert_eq!(context.cache().state(&key, USER_STALE_TIME).await, QueryState::Stale);
        Ok(())
    }

    #[tokio::test]
    async fn car_should_surface_not_found() {
        let context = context_with(transport_once(
            Method::Get,
            "/api/cars/missing",
            404,
            json!({"success": false, "message": "Car not found"}),
        ));

        let result = car(&context, "missing").await;

        assert_eq!(result.map_err(|error| error.user_message()).err().as_deref(), Some("Car not found"));
    }
}
