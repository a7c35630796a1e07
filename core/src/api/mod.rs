//! Per-domain facades over `ApiClient`.
//!
//! Each facade method maps one business operation onto a single request with
//! a fixed path and method. Facades borrow the client and are cheap to make.

mod admin;
mod appointments;
mod auth;
mod resource;

pub use admin::{AdminApi, FeedbackStatus};
pub use appointments::AppointmentsApi;
pub use auth::AuthApi;
pub use resource::ResourceApi;

use crate::error::{ApiError, ApiResult};

/// `base/id`, refusing ids that would escape their path segment.
pub(crate) fn item_path(base: &str, id: &str) -> ApiResult<String> {
    if id.is_empty() || id.contains(['/', '?', '#', '%']) || id == "." || id == ".." {
        return Err(ApiError::InvalidId(id.to_string()));
    }
    Ok(format!("{base}/{id}"))
}
