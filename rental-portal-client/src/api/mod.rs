//! HTTP layer of the portal. Every backend call goes through a [Transport] so the request
//! building and response decoding can be exercised without a running backend.

pub mod branches;
pub mod cars;
pub mod rentals;
pub mod users;

use std::{fmt::Display, sync::Arc};

use common::{
    api::{parse_body, ApiResponseBody},
    error::{CrError, CrResult},
};
use log::{debug, error};
use reqwest::multipart::{Form, Part};
use serde::{de::DeserializeOwned, Serialize};
use strum::Display as StrumDisplay;

/// HTTP verbs used by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// Single part of a multipart request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

impl MultipartField {
    pub fn text<N: Into<String>, V: Display>(name: N, value: V) -> Self {
        Self::Text {
            name: name.into(),
            value: value.to_string(),
        }
    }
}

/// Payload of an [ApiRequest]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<MultipartField>),
}

/// Transport independent description of a backend call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the backend base URL, e.g. `/api/cars`
    pub path: String,
    pub bearer: Option<String>,
    pub query: Vec<(&'static str, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new<P: Into<String>>(method: Method, path: P) -> Self {
        Self {
            method,
            path: path.into(),
            bearer: None,
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get<P: Into<String>>(path: P) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post<P: Into<String>>(path: P) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put<P: Into<String>>(path: P) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch<P: Into<String>>(path: P) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete<P: Into<String>>(path: P) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Attach the `Authorization: Bearer` token
    #[must_use]
    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_owned());
        self
    }

    #[must_use]
    pub fn query(mut self, query: Vec<(&'static str, String)>) -> Self {
        self.query = query;
        self
    }

    /// Serialize `body` as the JSON payload
    /// # Errors
    /// This function will return an error if `body` cannot be serialized
    pub fn json<B: Serialize>(mut self, body: &B) -> CrResult<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    #[must_use]
    pub fn multipart(mut self, fields: Vec<MultipartField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }
}

/// Status and body of a backend response, before any decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Build a response with a JSON `body`
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
        }
    }
}

/// Executes [ApiRequest]s against the backend
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send the `request` and collect the full response. Non-2xx statuses are not errors at this
    /// level; only failures to reach the backend are.
    async fn execute(&self, request: ApiRequest) -> CrResult<RawResponse>;
}

/// [Transport] backed by a [reqwest::Client]
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new<U: Into<String>>(base_url: U) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Convert the multipart `fields` into a [Form]
    fn multipart_form(fields: Vec<MultipartField>) -> CrResult<Form> {
        let mut form = Form::new();
        for field in fields {
            form = match field {
                MultipartField::Text { name, value } => form.text(name, value),
                MultipartField::File {
                    name,
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let part = Part::bytes(bytes)
                        .file_name(file_name)
                        .mime_str(&content_type)
                        .map_err(|error| {
                            CrError::Generic(format!("Invalid content type '{content_type}'. {error}"))
                        })?;
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> CrResult<RawResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(fields) => builder.multipart(Self::multipart_form(fields)?),
        };
        let response = builder.send().await.map_err(|error| {
            error!("Could not reach {url}. {error}");
            CrError::Network(format!("{error}"))
        })?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|error| CrError::Network(format!("{error}")))?;
        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Shared handle to the [Transport] used by every API struct
pub type SharedTransport = Arc<dyn Transport>;

/// Paged slice of a listing endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: Option<u64>,
}

impl<T> Page<T> {
    /// Collect the page details from the envelope. The backend reports them either at the top
    /// level or inside `pagination`. Endpoints that only send `count` get their page total from
    /// the requested `limit`.
    /// # Errors
    /// This function will return an error if the envelope has no `data` entry
    pub fn from_envelope(
        envelope: ApiResponseBody<Vec<T>>,
        requested_page: u32,
        limit: u32,
    ) -> CrResult<Self> {
        let pagination = envelope.pagination.clone().unwrap_or_default();
        let current_page = envelope
            .current_page
            .or(pagination.current_page)
            .or(pagination.page)
            .unwrap_or(requested_page);
        let total_count = pagination.total_count.or(envelope.count);
        let total_pages = envelope
            .total_pages
            .or(pagination.total_pages)
            .or_else(|| total_count.map(|count| pages_for(count, limit)))
            .unwrap_or(1)
            .max(1);
        Ok(Self {
            items: envelope.into_data()?,
            current_page,
            total_pages,
            total_count,
        })
    }

    pub const fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub const fn has_prev(&self) -> bool {
        self.current_page > 1
    }
}

/// Number of pages needed to show `count` entries, `limit` at a time
fn pages_for(count: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 1;
    }
    let limit = u64::from(limit);
    u32::try_from((count + limit - 1) / limit).unwrap_or(u32::MAX)
}

/// Successful write along with the confirmation text sent by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmed<T> {
    pub data: T,
    pub message: String,
}

/// Execute the `request` and decode the envelope. Failures are logged and converted into
/// [CrError] with `fallback` as the message when the backend does not supply one.
async fn send<T>(
    transport: &dyn Transport,
    request: ApiRequest,
    fallback: &str,
) -> CrResult<ApiResponseBody<T>>
where
    T: DeserializeOwned,
{
    debug!("{} {}", request.method, request.path);
    let response = transport.execute(request).await?;
    parse_body(response.status, &response.body, fallback).map_err(|error| {
        error!("{fallback}. {error}");
        error
    })
}

/// Execute the `request` and return only the `data` payload
async fn fetch<T>(transport: &dyn Transport, request: ApiRequest, fallback: &str) -> CrResult<T>
where
    T: DeserializeOwned,
{
    send(transport, request, fallback).await?.into_data()
}

/// Execute the `request` and return the confirmation message, ignoring any payload
async fn acknowledge(
    transport: &dyn Transport,
    request: ApiRequest,
    fallback: &str,
    success: &str,
) -> CrResult<String> {
    let envelope = send::<serde_json::Value>(transport, request, fallback).await?;
    Ok(envelope.message_or(success))
}

/// Endpoints that do not need a token
#[derive(Clone)]
pub struct UnauthorizedApi {
    transport: SharedTransport,
}

impl UnauthorizedApi {
    pub fn new(transport: SharedTransport) -> Self {
        Self { transport }
    }

    /// Upgrade to an [AuthorizedApi] using the session `token`
    pub fn authorize<T: Into<String>>(&self, token: T) -> AuthorizedApi {
        AuthorizedApi::new(self.transport.clone(), token.into())
    }
}

/// Endpoints that send the bearer token
#[derive(Clone)]
pub struct AuthorizedApi {
    transport: SharedTransport,
    token: String,
}

impl AuthorizedApi {
    pub fn new(transport: SharedTransport, token: String) -> Self {
        Self { transport, token }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Attach the bearer token to the `request`
    fn authorized(&self, request: ApiRequest) -> ApiRequest {
        request.bearer(&self.token)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::sync::Arc;

    use mockall::predicate::function;
    use rstest::rstest;
    use serde_json::json;

    use super::{ApiRequest, Method, MockTransport, Page, RawResponse, SharedTransport};
    use common::api::ApiResponseBody;

    /// Build a transport expecting one request matching `method` and `path` and answering with
    /// `status` and `body`
    pub(crate) fn transport_once(
        method: Method,
        path: &'static str,
        status: u16,
        body: serde_json::Value,
    ) -> SharedTransport {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .with(function(move |request: &ApiRequest| {
                request.method == method && request.path == path
            }))
            .times(1)
            .returning(move |_| Ok(RawResponse::json(status, &body)));
        Arc::new(transport)
    }

    #[test]
    fn request_builder_should_attach_token_and_query() {
        let request = ApiRequest::get("/api/rentals")
            .bearer("abc")
            .query(vec![("page", "2".to_owned())]);

        assert_eq!(request.method.to_string(), "GET");
        assert_eq!(request.bearer.as_deref(), Some("abc"));
        assert_eq!(request.query, vec![("page", "2".to_owned())]);
    }

    #[test]
    fn page_should_prefer_top_level_details() {
        let envelope: ApiResponseBody<Vec<u8>> = serde_json::from_value(json!({
            "success": true,
            "data": [1, 2, 3],
            "totalPages": 4,
            "currentPage": 2,
            "pagination": {"currentPage": 9, "totalPages": 9, "totalCount": 31}
        }))
        .expect("Failed to deserialize envelope");

        let page = Page::from_envelope(envelope, 1, 10).expect("Failed to build page");

        assert_eq!(page.current_page, 2);
        assert_eq!(page.total_pages, 4);
        assert_eq!(page.total_count, Some(31));
        assert!(page.has_next());
        assert!(page.has_prev());
    }

    #[test]
    fn page_should_default_to_requested_page() {
        let envelope: ApiResponseBody<Vec<u8>> =
            serde_json::from_value(json!({"success": true, "data": []}))
                .expect("Failed to deserialize envelope");

        let page = Page::from_envelope(envelope, 3, 10).expect("Failed to build page");

        assert_eq!(page.current_page, 3);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next());
    }

    #[rstest]
    #[case::partial_last_page(25, 10, 3)]
    #[case::exact(20, 10, 2)]
    #[case::empty(0, 10, 1)]
    fn page_should_derive_total_pages_from_count(
        #[case] count: u64,
        #[case] limit: u32,
        #[case] expected: u32,
    ) {
        let envelope: ApiResponseBody<Vec<u8>> =
            serde_json::from_value(json!({"success": true, "count": count, "data": [1, 2]}))
                .expect("Failed to deserialize envelope");

        let page = Page::from_envelope(envelope, 1, limit).expect("Failed to build page");

        assert_eq!(page.total_pages, expected);
        assert_eq!(page.total_count, Some(count));
        assert_eq!(page.has_next(), expected > 1);
    }
}
