use common::{
    api::{is_success, ErrorBody},
    error::{CrError, CrResult},
};
use log::{debug, warn};
use rental_portal_common::{
    user::{
        AdminUserUpdate, AdminUsersParams, ChangePasswordRequest, Credentials, ProfileUpdate,
        RegisterRequest, Session, User, UserSearchParams, UserStats,
    },
    QueryParams,
};
use serde::{Deserialize, Serialize};

use super::{acknowledge, fetch, send, ApiRequest, AuthorizedApi, Page, UnauthorizedApi};

/// Shown when a successful login or registration response lacks the user or the token
pub const INVALID_AUTH_RESPONSE: &str = "Invalid response format";

/// Body of a login or registration response. The user arrives under `data` or `user` depending
/// on the backend version.
#[derive(Deserialize, Debug, Default)]
struct AuthResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<User>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    token: Option<String>,
}

impl UnauthorizedApi {
    /// Exchange `credentials` for a [Session]
    /// # Errors
    /// This function will return an error if the backend rejects the credentials, cannot be
    /// reached or answers without a user and token
    pub async fn login(&self, credentials: &Credentials) -> CrResult<Session> {
        self.authenticate("/api/users/login", credentials, "Login failed")
            .await
    }

    /// Create an account and return its [Session]
    /// # Errors
    /// This function will return an error if the backend rejects the request, cannot be reached
    /// or answers without a user and token
    pub async fn register(&self, request: &RegisterRequest) -> CrResult<Session> {
        self.authenticate("/api/users/register", request, "Registration failed")
            .await
    }

    /// Shared flow of login and registration. Error text prefers the body's `error` key over
    /// `message`.
    async fn authenticate<B>(&self, path: &str, body: &B, fallback: &str) -> CrResult<Session>
    where
        B: Serialize + Sync,
    {
        debug!("POST {path}");
        let request = ApiRequest::post(path).json(body)?;
        let response = self.transport.execute(request).await?;
        if !is_success(response.status) {
            let message = ErrorBody::from_bytes(&response.body).auth_message_or(fallback);
            warn!("{fallback} with status {}. {message}", response.status);
            return Err(CrError::Api {
                status: response.status,
                message,
            });
        }
        let body: AuthResponse = serde_json::from_slice(&response.body).map_err(|error| {
            warn!("Could not decode authentication response. {error}");
            CrError::InvalidResponse(INVALID_AUTH_RESPONSE.to_owned())
        })?;
        if body.success == Some(false) {
            return Err(CrError::Api {
                status: response.status,
                message: body.message.unwrap_or_else(|| fallback.to_owned()),
            });
        }
        match (body.data.or(body.user), body.token) {
            (Some(user), Some(token)) => Ok(Session { user, token }),
            _ => {
                warn!("Authentication response did not contain a user and token");
                Err(CrError::InvalidResponse(INVALID_AUTH_RESPONSE.to_owned()))
            }
        }
    }
}

impl AuthorizedApi {
    /// Tell the backend the session ends. The local session is cleared regardless of the result.
    /// # Errors
    /// This function will return an error if the backend rejects the call or cannot be reached
    pub async fn logout(&self) -> CrResult<String> {
        let request = self.authorized(ApiRequest::post("/api/users/logout"));
        acknowledge(&*self.transport, request, "Failed to logout", "Logged out").await
    }

    /// Fetch the current user's profile
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn profile(&self) -> CrResult<User> {
        let request = self.authorized(ApiRequest::get("/api/users/profile"));
        fetch(&*self.transport, request, "Failed to fetch profile").await
    }

    /// Apply the sparse `update` to the current user's profile
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn update_profile(&self, update: &ProfileUpdate) -> CrResult<User> {
        let request = self.authorized(ApiRequest::put("/api/users/profile").json(update)?);
        fetch(&*self.transport, request, "Failed to update profile").await
    }

    /// Change the current user's password
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn change_password(&self, request: &ChangePasswordRequest) -> CrResult<String> {
        let request = self.authorized(ApiRequest::put("/api/users/change-password").json(request)?);
        acknowledge(
            &*self.transport,
            request,
            "Failed to change password",
            "Password changed successfully",
        )
        .await
    }

    /// Fetch a page of users for the admin dashboard
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn admin_users(&self, params: &AdminUsersParams) -> CrResult<Page<User>> {
        let request = self.authorized(ApiRequest::get("/api/admin/users").query(params.to_query()));
        let envelope = send(&*self.transport, request, "Failed to fetch users").await?;
        Page::from_envelope(envelope, params.page, params.limit)
    }

    /// Search users by name, email, role or status
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn search_users(&self, params: &UserSearchParams) -> CrResult<Vec<User>> {
        let request =
            self.authorized(ApiRequest::get("/api/admin/users/search").query(params.to_query()));
        fetch(&*self.transport, request, "Failed to search users").await
    }

    /// Fetch the dashboard user figures
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn user_stats(&self) -> CrResult<UserStats> {
        let request = self.authorized(ApiRequest::get("/api/admin/users/stats"));
        fetch(&*self.transport, request, "Failed to fetch user statistics").await
    }

    /// Fetch a single user
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn user(&self, user_id: &str) -> CrResult<User> {
        let request = self.authorized(ApiRequest::get(format!("/api/admin/users/{user_id}")));
        fetch(&*self.transport, request, "Failed to fetch user").await
    }

    /// Apply the admin `update` to the user specified by `user_id`
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn update_user(&self, user_id: &str, update: &AdminUserUpdate) -> CrResult<User> {
        let request =
            self.authorized(ApiRequest::put(format!("/api/admin/users/{user_id}")).json(update)?);
        fetch(&*self.transport, request, "Failed to update user").await
    }

    /// Delete the user specified by `user_id`
    /// # Errors
    /// This function will return an error if the request fails
    pub async fn delete_user(&self, user_id: &str) -> CrResult<String> {
        let request = self.authorized(ApiRequest::delete(format!("/api/admin/users/{user_id}")));
        acknowledge(
            &*self.transport,
            request,
            "Failed to delete user",
            "User deleted successfully",
        )
        .await
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use common::error::{CrError, CrResult};
    use rental_portal_common::user::{AdminUsersParams, Credentials, Role};
    use rstest::rstest;
    use serde_json::json;

    use crate::api::{
        test::transport_once, ApiRequest, Method, MockTransport, UnauthorizedApi,
    };

    fn credentials() -> Credentials {
        Credentials {
            email: "john@example.com".to_owned(),
            password: "secret1".to_owned(),
        }
    }

    fn user_json() -> serde_json::Value {
        json!({
            "_id": "u1",
            "firstName": "John",
            "lastName": "Smith",
            "email": "john@example.com",
            "role": "user",
            "isActive": true
        })
    }

    #[rstest]
    #[case::message_only(json!({"message": "Invalid credentials"}), "Invalid credentials")]
    #[case::error_wins(json!({"message": "Bad request", "error": "Account locked"}), "Account locked")]
    #[case::empty(json!({}), "Login failed")]
    #[tokio::test]
    async fn login_should_surface_backend_error_text(
        #[case] body: serde_json::Value,
        #[case] expected: &str,
    ) {
        let api = UnauthorizedApi::new(transport_once(Method::Post, "/api/users/login", 401, body));

        let error = api.login(&credentials()).await.expect_err("Login should fail");

        assert_eq!(error.user_message(), expected);
        assert!(error.is_auth_required());
    }

    #[rstest]
    #[case::data_key("data")]
    #[case::user_key("user")]
    #[tokio::test]
    async fn login_should_accept_either_user_key(#[case] key: &str) -> CrResult<()> {
        let mut body = json!({"success": true, "token": "jwt-token"});
        body[key] = user_json();
        let api = UnauthorizedApi::new(transport_once(Method::Post, "/api/users/login", 200, body));

        let session = api.login(&credentials()).await?;

        assert_eq!(session.token, "jwt-token");
        assert_eq!(session.user.role, Role::User);
        Ok(())
    }

    #[tokio::test]
    async fn login_should_reject_response_without_token() {
        let body = json!({"success": true, "data": user_json()});
        let api = UnauthorizedApi::new(transport_once(Method::Post, "/api/users/login", 200, body));

        let error = api.login(&credentials()).await.expect_err("Login should fail");

        assert_eq!(error.user_message(), "Invalid response format");
    }

    #[tokio::test]
    async fn login_should_report_network_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .returning(|_| Err(CrError::Network("connection refused".to_owned())));
        let api = UnauthorizedApi::new(Arc::new(transport));

        let error = api.login(&credentials()).await.expect_err("Login should fail");

        assert_eq!(error.user_message(), "Network error");
    }

    #[tokio::test]
    async fn register_should_fallback_to_registration_failed() {
        let api = UnauthorizedApi::new(transport_once(
            Method::Post,
            "/api/users/register",
            500,
            json!({"success": false}),
        ));

        let error = api
            .register(&Default::default())
            .await
            .expect_err("Registration should fail");

        assert_eq!(error.user_message(), "Registration failed");
    }

    #[tokio::test]
    async fn admin_users_should_send_token_and_paging() -> CrResult<()> {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|request: &ApiRequest| {
                request.path == "/api/admin/users"
                    && request.bearer.as_deref() == Some("admin-token")
                    && request.query.contains(&("page", "1".to_owned()))
                    && request.query.contains(&("sortOrder", "desc".to_owned()))
            })
            .times(1)
            .returning(move |_| {
                Ok(crate::api::RawResponse::json(
                    200,
                    &json!({
                        "success": true,
                        "data": [user_json()],
                        "pagination": {"page": 1, "limit": 10, "totalPages": 3, "totalCount": 21}
                    }),
                ))
            });
        let api = UnauthorizedApi::new(Arc::new(transport)).authorize("admin-token");

        let page = api.admin_users(&AdminUsersParams::default()).await?;

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_count, Some(21));
        Ok(())
    }

    #[tokio::test]
    async fn delete_user_should_use_message_key_for_errors() {
        let api = UnauthorizedApi::new(transport_once(
            Method::Delete,
            "/api/admin/users/u9",
            404,
            json!({"message": "User not found"}),
        ))
        .authorize("admin-token");

        let error = api.delete_user("u9").await.expect_err("Delete should fail");

        assert_eq!(error.user_message(), "User not found");
    }
}
