//! HTTP request and response envelopes as plain data.
//!
//! # Design
//! `ApiClient` builds `HttpRequest` values and parses `HttpResponse` values;
//! executing the round-trip is the job of a [`Transport`](crate::Transport).
//! Keeping the envelopes as plain owned data lets tests hand-craft responses
//! and inspect outgoing requests without a network.

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An outgoing request: method, fully resolved URL, headers and an optional
/// pre-serialized body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A response as returned by a transport.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True when the content-type declares a JSON body (`application/json`,
    /// optionally with parameters, or a `+json` suffix type).
    pub fn is_json(&self) -> bool {
        self.header("content-type")
            .map(|ct| {
                let mime = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
                mime == "application/json" || mime.ends_with("+json")
            })
            .unwrap_or(false)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(content_type: Option<&str>) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: content_type
                .map(|ct| vec![("Content-Type".to_string(), ct.to_string())])
                .unwrap_or_default(),
            body: String::new(),
        }
    }

    #[test]
    fn json_content_type_with_charset_is_json() {
        assert!(response(Some("application/json; charset=utf-8")).is_json());
        assert!(response(Some("application/problem+json")).is_json());
    }

    #[test]
    fn other_content_types_are_not_json() {
        assert!(!response(Some("text/html")).is_json());
        assert!(!response(None).is_json());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            url: "http://localhost/api".to_string(),
            headers: vec![("Authorization".to_string(), "Bearer t".to_string())],
            body: None,
        };
        assert_eq!(req.header("authorization"), Some("Bearer t"));
        assert_eq!(req.header("accept"), None);
    }

    #[test]
    fn success_range_is_2xx() {
        let mut resp = response(None);
        assert!(resp.is_success());
        resp.status = 204;
        assert!(resp.is_success());
        resp.status = 302;
        assert!(!resp.is_success());
        resp.status = 404;
        assert!(!resp.is_success());
    }
}
