//! Authenticated request construction and response interpretation.
//!
//! # Design
//! `ApiClient` splits every call into three steps: `build_request` produces
//! an `HttpRequest` from a path, options and the resolved token;
//! the `Transport` executes it; `parse_response` turns the `HttpResponse`
//! into a JSON value or an `ApiError`. The build and parse steps are pure,
//! so most behavior is tested without any I/O.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{AdminApi, AppointmentsApi, AuthApi, ResourceApi};
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::session::Session;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::transport::{Transport, UreqTransport};

/// Method, extra headers and pre-serialized body for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(HttpMethod::Get)
    }
}

impl RequestOptions {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get() -> Self {
        Self::new(HttpMethod::Get)
    }

    pub fn delete() -> Self {
        Self::new(HttpMethod::Delete)
    }

    /// Request with `payload` serialized as the JSON body.
    pub fn json(method: HttpMethod, payload: &impl Serialize) -> ApiResult<Self> {
        let body =
            serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(Self::new(method).body(body))
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Client for the clinic REST API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>, session: Session) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            session,
        }
    }

    /// Client using the `ureq` transport. The persistent tier is file-backed
    /// when the configuration names a storage directory.
    pub fn from_config(config: &ClientConfig) -> Self {
        let persistent: Arc<dyn KeyValueStore> = match &config.storage_dir {
            Some(dir) => Arc::new(FileStore::in_dir(dir)),
            None => Arc::new(MemoryStore::new()),
        };
        let session = Session::new(persistent, Arc::new(MemoryStore::new()));
        Self::new(&config.base_url, Arc::new(UreqTransport::new()), session)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn patients(&self) -> ResourceApi<'_> {
        ResourceApi::new(self, "/api/patients")
    }

    pub fn inventory(&self) -> ResourceApi<'_> {
        ResourceApi::new(self, "/api/inventory")
    }

    pub fn appointments(&self) -> AppointmentsApi<'_> {
        AppointmentsApi::new(self)
    }

    pub fn admin(&self) -> AdminApi<'_> {
        AdminApi::new(self)
    }

    /// Absolute URLs are used verbatim; anything else is appended to the
    /// base origin.
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Build the outgoing request. Default JSON headers come first, caller
    /// headers replace them by name, and the bearer header is applied last
    /// so it cannot be overridden.
    pub fn build_request(
        &self,
        path: &str,
        options: RequestOptions,
        token: Option<&str>,
    ) -> HttpRequest {
        let mut headers: Vec<(String, String)> = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        for (key, value) in options.headers {
            upsert_header(&mut headers, key, value);
        }
        if let Some(token) = token {
            upsert_header(
                &mut headers,
                "Authorization".to_string(),
                format!("Bearer {token}"),
            );
        }

        HttpRequest {
            method: options.method,
            url: self.resolve_url(path),
            headers,
            body: options.body,
        }
    }

    /// Interpret a response. The body is decoded first (only when it is
    /// declared as JSON), then the status decides success.
    pub fn parse_response(&self, response: HttpResponse) -> ApiResult<Value> {
        let body = if response.is_json() && !response.body.trim().is_empty() {
            serde_json::from_str::<Value>(&response.body)
                .map_err(|e| ApiError::MalformedResponse(e.to_string()))?
        } else {
            Value::Null
        };

        if response.is_success() {
            return Ok(body);
        }

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed with status {}", response.status));
        Err(ApiError::RequestFailed {
            status: Some(response.status),
            message,
        })
    }

    /// Authenticated call. Fails with `AuthenticationRequired` before any
    /// I/O when no token is stored.
    pub fn request(&self, path: &str, options: RequestOptions) -> ApiResult<Value> {
        let token = match self.session.get_token()? {
            Some(token) => token,
            None => {
                warn!(path, "request attempted without a session token");
                return Err(ApiError::AuthenticationRequired);
            }
        };
        let request = self.build_request(path, options, Some(&token));
        self.execute(request)
    }

    /// Call without the token precondition or bearer header, for pre-session
    /// flows such as login and registration.
    pub fn public_request(&self, path: &str, options: RequestOptions) -> ApiResult<Value> {
        let request = self.build_request(path, options, None);
        self.execute(request)
    }

    fn execute(&self, request: HttpRequest) -> ApiResult<Value> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let method = request.method;
        let url = request.url.clone();

        let result = self
            .transport
            .execute(&request)
            .and_then(|response| self.parse_response(response));

        if let Err(e) = &result {
            warn!(method = method.as_str(), %url, status = ?e.status(), "API request failed: {e}");
        }
        result
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn upsert_header(headers: &mut Vec<(String, String)>, key: String, value: String) {
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
        Some(existing) => *existing = (key, value),
        None => headers.push((key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoNetwork;

    impl Transport for NoNetwork {
        fn execute(&self, _request: &HttpRequest) -> ApiResult<HttpResponse> {
            panic!("no network expected in unit tests");
        }
    }

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:5000", Arc::new(NoNetwork), Session::in_memory())
    }

    fn json_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string(),
        }
    }

    #[test]
    fn build_request_adds_default_and_bearer_headers() {
        let req = client().build_request("/api/patients", RequestOptions::get(), Some("tok"));
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:5000/api/patients");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("authorization"), Some("Bearer tok"));
        assert!(req.body.is_none());
    }

    #[test]
    fn caller_cannot_override_bearer_header() {
        let options = RequestOptions::get().header("authorization", "Bearer forged");
        let req = client().build_request("/api/patients", options, Some("real"));
        assert_eq!(req.header("Authorization"), Some("Bearer real"));
        let count = req
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("authorization"))
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn caller_headers_replace_defaults() {
        let options = RequestOptions::get()
            .header("Accept", "text/csv")
            .header("X-Request-Id", "42");
        let req = client().build_request("/api/admin/audit-logs", options, Some("t"));
        assert_eq!(req.header("accept"), Some("text/csv"));
        assert_eq!(req.header("x-request-id"), Some("42"));
        assert_eq!(req.headers.len(), 4);
    }

    #[test]
    fn public_build_has_no_authorization() {
        let req = client().build_request("/api/auth/login", RequestOptions::get(), None);
        assert_eq!(req.header("authorization"), None);
    }

    #[test]
    fn absolute_url_is_used_verbatim() {
        let req = client().build_request(
            "https://files.example.edu/x",
            RequestOptions::get(),
            None,
        );
        assert_eq!(req.url, "https://files.example.edu/x");
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = ApiClient::new(
            "http://localhost:5000/",
            Arc::new(NoNetwork),
            Session::in_memory(),
        );
        assert_eq!(
            client.resolve_url("/api/inventory"),
            "http://localhost:5000/api/inventory"
        );
    }

    #[test]
    fn from_config_uses_configured_origin() {
        let config = ClientConfig {
            base_url: "https://clinic.example.edu".to_string(),
            storage_dir: None,
        };
        let client = ApiClient::from_config(&config);
        assert_eq!(client.base_url(), "https://clinic.example.edu");
        assert!(!client.session().is_authenticated().unwrap());
    }

    #[test]
    fn json_options_serialize_body() {
        let payload = serde_json::json!({"name": "Paracetamol"});
        let options = RequestOptions::json(HttpMethod::Post, &payload).unwrap();
        assert_eq!(options.method, HttpMethod::Post);
        assert_eq!(options.body.as_deref(), Some(r#"{"name":"Paracetamol"}"#));
    }

    #[test]
    fn parse_success_returns_json() {
        let value = client()
            .parse_response(json_response(200, r#"{"data":[1,2]}"#))
            .unwrap();
        assert_eq!(value["data"][1], 2);
    }

    #[test]
    fn parse_success_without_json_is_null() {
        let response = HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: String::new(),
        };
        assert_eq!(client().parse_response(response).unwrap(), Value::Null);
    }

    #[test]
    fn parse_empty_json_body_is_null() {
        assert_eq!(client().parse_response(json_response(200, "")).unwrap(), Value::Null);
    }

    #[test]
    fn parse_failure_uses_server_message() {
        let err = client()
            .parse_response(json_response(404, r#"{"message":"Not found"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::RequestFailed { status: Some(404), .. }));
        assert_eq!(err.to_string(), "Not found");
    }

    #[test]
    fn parse_failure_without_message_mentions_status() {
        let response = HttpResponse {
            status: 500,
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: "<h1>oops</h1>".to_string(),
        };
        let err = client().parse_response(response).unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn parse_declared_json_that_does_not_parse_is_malformed() {
        let err = client().parse_response(json_response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn request_without_token_fails_before_transport() {
        let err = client().request("/api/patients", RequestOptions::get()).unwrap_err();
        assert!(matches!(err, ApiError::AuthenticationRequired));
    }
}
