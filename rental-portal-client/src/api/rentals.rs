use common::error::CrResult;
use rental_portal_common::{
    rental::{
        AdminRentalsParams, CreateRentalRequest, Rental, RentalCancellation, RentalCompletion,
        RentalStats, RentalStatusUpdate,
    },
    QueryParams,
};

use super::{acknowledge, fetch, send, ApiRequest, AuthorizedApi, Confirmed, Page};

impl AuthorizedApi {
    /// Book a car for the current user. Returns the created rental along with the backend's
    /// confirmation text.
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn create_rental(&self, request: &CreateRentalRequest) -> CrResult<Confirmed<Rental>> {
        let request = self.authorized(ApiRequest::post("/api/rentals").json(request)?);
        let envelope = send(&*self.transport, request, "Failed to create rental").await?;
        let message = envelope.message_or("Rental created successfully");
        Ok(Confirmed {
            data: envelope.into_data()?,
            message,
        })
    }

    /// Fetch a page of the current user's rentals
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn user_rentals(&self, page: u32, limit: u32) -> CrResult<Page<Rental>> {
        let request = self.authorized(
            ApiRequest::get("/api/rentals")
                .query(vec![("page", page.to_string()), ("limit", limit.to_string())]),
        );
        let envelope = send(&*self.transport, request, "Failed to fetch rentals").await?;
        Page::from_envelope(envelope, page, limit)
    }

    /// Mark a confirmed rental as picked up
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn activate_rental(&self, rental_id: &str) -> CrResult<Rental> {
        let request =
            self.authorized(ApiRequest::patch(format!("/api/rentals/{rental_id}/activate")));
        fetch(&*self.transport, request, "Failed to activate rental").await
    }

    /// Fetch a page of every rental for the admin dashboard
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn admin_rentals(&self, params: &AdminRentalsParams) -> CrResult<Page<Rental>> {
        let request =
            self.authorized(ApiRequest::get("/api/admin/rentals").query(params.to_query()));
        let envelope = send(&*self.transport, request, "Failed to fetch rentals").await?;
        Page::from_envelope(envelope, params.page, params.limit)
    }

    /// Fetch the dashboard rental figures
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn rental_stats(&self) -> CrResult<RentalStats> {
        let request = self.authorized(ApiRequest::get("/api/admin/rentals/stats"));
        fetch(&*self.transport, request, "Failed to fetch rental statistics").await
    }

    /// Fetch a single rental
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn admin_rental(&self, rental_id: &str) -> CrResult<Rental> {
        let request = self.authorized(ApiRequest::get(format!("/api/admin/rentals/{rental_id}")));
        fetch(&*self.transport, request, "Failed to fetch rental").await
    }

    /// Set the status (and optional admin notes) of the rental specified by `rental_id`
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn update_rental_status(
        &self,
        rental_id: &str,
        update: &RentalStatusUpdate,
    ) -> CrResult<Rental> {
        let request = self.authorized(
            ApiRequest::patch(format!("/api/admin/rentals/{rental_id}/status")).json(update)?,
        );
        fetch(&*self.transport, request, "Failed to update rental status").await
    }

    /// Close the rental specified by `rental_id` with the optional return report
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn complete_rental(
        &self,
        rental_id: &str,
        completion: &RentalCompletion,
    ) -> CrResult<Rental> {
        let request = self.authorized(
            ApiRequest::patch(format!("/api/admin/rentals/{rental_id}/complete"))
                .json(completion)?,
        );
        fetch(&*self.transport, request, "Failed to complete rental").await
    }

    /// Cancel the rental specified by `rental_id`
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn cancel_rental(
        &self,
        rental_id: &str,
        cancellation: &RentalCancellation,
    ) -> CrResult<Rental> {
        let request = self.authorized(
            ApiRequest::patch(format!("/api/admin/rentals/{rental_id}/cancel"))
                .json(cancellation)?,
        );
        fetch(&*self.transport, request, "Failed to cancel rental").await
    }

    /// Delete the rental specified by `rental_id`
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn delete_rental(&self, rental_id: &str) -> CrResult<String> {
        let request =
            self.authorized(ApiRequest::delete(format!("/api/admin/rentals/{rental_id}")));
        acknowledge(
            &*self.transport,
            request,
            "Failed to delete rental",
            "Rental deleted successfully",
        )
        .await
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::sync::Arc;

    use common::error::CrResult;
    use rental_portal_common::rental::{RentalStatus, RentalStatusUpdate};
    use serde_json::json;

    use crate::api::{
        test::transport_once, ApiRequest, Method, MockTransport, RawResponse, UnauthorizedApi,
    };

    /// Minimal rental document as sent by the backend
    pub(crate) fn rental_json(id: &str, status: &str) -> serde_json::Value {
        json!({
            "_id": id,
            "userId": {"_id": "u1", "firstName": "Jane", "lastName": "Doe", "email": "jane@example.com"},
            "carId": {"_id": "c1", "name": "Corolla", "brand": "Toyota"},
            "startDate": "2024-06-01T00:00:00.000Z",
            "endDate": "2024-06-05T00:00:00.000Z",
            "status": status,
            "pickup": {"location": "Downtown", "branch": "b1"},
            "return": {"location": "Airport", "branch": "b2"}
        })
    }

    #[tokio::test]
    async fn user_rentals_should_send_paging() -> CrResult<()> {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|request: &ApiRequest| {
                request.path == "/api/rentals"
                    && request.query == vec![("page", "2".to_owned()), ("limit", "5".to_owned())]
            })
            .times(1)
            .returning(|_| {
                Ok(RawResponse::json(
                    200,
                    &json!({
                        "success": true,
                        "data": [rental_json("r1", "active")],
                        "totalPages": 2,
                        "currentPage": 2
                    }),
                ))
            });
        let api = UnauthorizedApi::new(Arc::new(transport)).authorize("token");

        let page = api.user_rentals(2, 5).await?;

        assert_eq!(page.items[0].status, RentalStatus::Active);
        assert!(!page.has_next());
        Ok(())
    }

    #[tokio::test]
    async fn create_rental_error_should_use_message_then_error() {
        let api = UnauthorizedApi::new(transport_once(
            Method::Post,
            "/api/rentals",
            400,
            json!({"error": "Car is not available for the selected dates"}),
        ))
        .authorize("token");
        let request = serde_json::from_value(json!({
            "carId": "c1",
            "startDate": "2024-06-01T00:00:00Z",
            "endDate": "2024-06-05T00:00:00Z",
            "pickup": {"location": "Downtown", "branch": "b1", "time": "2024-06-01T09:00:00Z"},
            "return": {"location": "Airport", "branch": "b2", "time": "2024-06-05T17:00:00Z"},
            "driverInfo": {"licenseNumber": "D123", "licenseExpiry": "2030-01-01T00:00:00Z"},
            "carCondition": {"pickup": {"mileage": 1200}},
            "specialRequests": "",
            "payment": {"method": "cash"}
        }))
        .expect("Failed to build request");

        let error = api
            .create_rental(&request)
            .await
            .expect_err("Create should fail");

        assert_eq!(
            error.user_message(),
            "Car is not available for the selected dates"
        );
    }

    #[tokio::test]
    async fn update_rental_status_should_patch_status_path() -> CrResult<()> {
        let api = UnauthorizedApi::new(transport_once(
            Method::Patch,
            "/api/admin/rentals/r1/status",
            200,
            json!({"success": true, "data": rental_json("r1", "confirmed")}),
        ))
        .authorize("token");
        let update = RentalStatusUpdate {
            status: RentalStatus::Confirmed,
            admin_notes: None,
        };

        let rental = api.update_rental_status("r1", &update).await?;

        assert_eq!(rental.status, RentalStatus::Confirmed);
        Ok(())
    }
}
