//! Client configuration loaded from the environment.

use std::env;
use std::path::PathBuf;

use tracing::info;

use crate::error::{ApiError, ApiResult};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Origin every relative request path is appended to.
    pub base_url: String,
    /// Directory for the persistent session tier. `None` keeps both tiers in
    /// memory.
    pub storage_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            storage_dir: None,
        }
    }
}

impl ClientConfig {
    /// Reads `CLINIC_API_URL` and `CLINIC_STORAGE_DIR`.
    pub fn from_env() -> ApiResult<Self> {
        Self::from_vars(
            env::var("CLINIC_API_URL").ok(),
            env::var("CLINIC_STORAGE_DIR").ok(),
        )
    }

    fn from_vars(base_url: Option<String>, storage_dir: Option<String>) -> ApiResult<Self> {
        let base_url = base_url
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                info!("CLINIC_API_URL not set, using default: {DEFAULT_BASE_URL}");
                DEFAULT_BASE_URL.to_string()
            });

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::Config(format!(
                "CLINIC_API_URL must be an http(s) URL, got {base_url:?}"
            )));
        }

        let storage_dir = storage_dir
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        if storage_dir.is_none() {
            info!("CLINIC_STORAGE_DIR not set, persistent session tier kept in memory");
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            storage_dir,
        })
    }
}
