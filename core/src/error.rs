//! Error types for the clinic API client.
//!
//! # Design
//! `AuthenticationRequired` is raised before any I/O when no session token
//! exists. Everything the server rejects, and every transport failure, lands
//! in `RequestFailed` whose `Display` is exactly the message callers show to
//! users. A body that claims JSON but does not parse is `MalformedResponse`.

use thiserror::Error;

/// Errors returned by the session client, facades and storage tiers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No token was stored when an authenticated request was attempted.
    #[error("authentication required")]
    AuthenticationRequired,

    /// The server returned a non-2xx status, or the transport failed
    /// (`status` is `None` in that case).
    #[error("{message}")]
    RequestFailed { status: Option<u16>, message: String },

    /// The response declared a JSON content-type but the body did not parse.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A storage tier could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// A resource id cannot be used as a single path segment.
    #[error("invalid resource id: {0:?}")]
    InvalidId(String),

    /// Client configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status carried by a `RequestFailed`, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RequestFailed { status, .. } => *status,
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
