//! The I/O seam between the client and the network.
//!
//! `ApiClient` never touches sockets itself; it hands a fully built
//! `HttpRequest` to a `Transport` and interprets the `HttpResponse` it gets
//! back. Tests substitute a fake transport to observe outgoing requests.

use crate::error::{ApiError, ApiResult};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Largest response body read before giving up.
pub const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Executes one HTTP round-trip.
///
/// Non-2xx statuses are returned as data, not as errors; only failures to
/// reach the server at all map to `ApiError::RequestFailed` with no status.
/// A body that cannot be read in full is `ApiError::MalformedResponse`.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> ApiResult<HttpResponse>;
}

/// Blocking transport backed by a `ureq` agent.
///
/// The agent keeps a cookie jar, so session cookies set by the server are
/// sent back alongside the bearer header on later calls.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (key, value) in headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> ApiResult<HttpResponse> {
        let url = request.url.as_str();
        let headers = &request.headers;
        let body = request.body.as_deref();

        let result = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(url), headers).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(url), headers).call(),
            HttpMethod::Post => send(with_headers(self.agent.post(url), headers), body),
            HttpMethod::Put => send(with_headers(self.agent.put(url), headers), body),
            HttpMethod::Patch => send(with_headers(self.agent.patch(url), headers), body),
        };

        let mut response = result.map_err(|e| ApiError::RequestFailed {
            status: None,
            message: format!("{} {} failed: {e}", request.method.as_str(), request.url),
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let bytes = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(|e| {
                ApiError::MalformedResponse(format!(
                    "could not read body of {} {} (status {status}): {e}",
                    request.method.as_str(),
                    request.url
                ))
            })?;
        let body = String::from_utf8(bytes).map_err(|e| {
            ApiError::MalformedResponse(format!(
                "body of {} {} (status {status}) is not UTF-8: {e}",
                request.method.as_str(),
                request.url
            ))
        })?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn send(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<&str>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}
