use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::client::{ApiClient, RequestOptions};
use crate::error::{ApiError, ApiResult};
use crate::http::HttpMethod;
use crate::types::{AuthResponse, LoginRequest, RegisterRequest, VerifyEmailRequest};

/// `/api/auth` endpoints plus the session side effects that go with them.
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Logs in and stores the returned token in the tier chosen by
    /// `remember`. The returned user, if any, replaces the cached profile.
    pub fn login(&self, credentials: &LoginRequest, remember: bool) -> ApiResult<AuthResponse> {
        let options = RequestOptions::json(HttpMethod::Post, credentials)?;
        let response = decode(self.client.public_request("/api/auth/login", options)?)?;
        let token = response
            .token
            .as_deref()
            .ok_or_else(|| ApiError::MalformedResponse("login response has no token".to_string()))?;
        self.store_session(token, &response, remember)?;
        info!(email = %credentials.email, "logged in");
        Ok(response)
    }

    pub fn register(&self, registration: &RegisterRequest) -> ApiResult<Value> {
        let options = RequestOptions::json(HttpMethod::Post, registration)?;
        self.client.public_request("/api/auth/register", options)
    }

    /// Confirms a registration. When the server answers with a token the
    /// user is signed in straight away.
    pub fn verify_email(
        &self,
        verification: &VerifyEmailRequest,
        remember: bool,
    ) -> ApiResult<AuthResponse> {
        let options = RequestOptions::json(HttpMethod::Post, verification)?;
        let response = decode(self.client.public_request("/api/auth/verify-email", options)?)?;
        if let Some(token) = response.token.as_deref() {
            self.store_session(token, &response, remember)?;
        }
        Ok(response)
    }

    pub fn resend_verification(&self, email: &str) -> ApiResult<Value> {
        let options = RequestOptions::json(HttpMethod::Post, &json!({ "email": email }))?;
        self.client.public_request("/api/auth/resend-verification", options)
    }

    /// Checks the current token with the server.
    pub fn verify(&self) -> ApiResult<AuthResponse> {
        decode(self.client.request("/api/auth/verify", RequestOptions::get())?)
    }

    /// Sends profile changes; the acknowledged user replaces the cache.
    pub fn update_profile(&self, changes: &impl Serialize) -> ApiResult<AuthResponse> {
        let options = RequestOptions::json(HttpMethod::Put, changes)?;
        let response = decode(self.client.request("/api/auth/profile", options)?)?;
        if let Some(user) = &response.user {
            self.client.session().cache_user(user)?;
        }
        Ok(response)
    }

    /// Tells the server to end the session, then clears local state no
    /// matter how that call went.
    pub fn logout(&self) -> ApiResult<()> {
        let options = RequestOptions::new(HttpMethod::Post);
        if let Err(e) = self.client.request("/api/auth/logout", options) {
            warn!("server logout failed, clearing local session anyway: {e}");
        }
        self.client.session().clear_token()
    }

    fn store_session(&self, token: &str, response: &AuthResponse, remember: bool) -> ApiResult<()> {
        let session = self.client.session();
        session.set_token(token, remember)?;
        if let Some(user) = &response.user {
            session.cache_user(user)?;
        }
        Ok(())
    }
}

fn decode(value: Value) -> ApiResult<AuthResponse> {
    if value.is_null() {
        return Ok(AuthResponse::default());
    }
    serde_json::from_value(value).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}
