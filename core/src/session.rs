//! Bearer token and cached profile lifecycle.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::storage::{KeyValueStore, MemoryStore};
use crate::types::UserProfile;

const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";

/// Which storage tier a token lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageTier {
    Persistent,
    Ephemeral,
}

/// Session state over two storage tiers.
///
/// Cloning shares the underlying tiers.
#[derive(Clone)]
pub struct Session {
    persistent: Arc<dyn KeyValueStore>,
    ephemeral: Arc<dyn KeyValueStore>,
}

impl Session {
    pub fn new(persistent: Arc<dyn KeyValueStore>, ephemeral: Arc<dyn KeyValueStore>) -> Self {
        Self {
            persistent,
            ephemeral,
        }
    }

    /// Session with both tiers held in memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    fn tier(&self, tier: StorageTier) -> &dyn KeyValueStore {
        match tier {
            StorageTier::Persistent => self.persistent.as_ref(),
            StorageTier::Ephemeral => self.ephemeral.as_ref(),
        }
    }

    /// Token from the persistent tier, falling back to the ephemeral tier.
    pub fn get_token(&self) -> ApiResult<Option<String>> {
        if let Some(token) = self.persistent.get(TOKEN_KEY)? {
            return Ok(Some(token));
        }
        self.ephemeral.get(TOKEN_KEY)
    }

    /// Stores the token in the persistent tier when `remember` is set,
    /// otherwise in the ephemeral tier. The other tier is left untouched.
    pub fn set_token(&self, token: &str, remember: bool) -> ApiResult<()> {
        let tier = if remember {
            StorageTier::Persistent
        } else {
            StorageTier::Ephemeral
        };
        debug!(?tier, "storing session token");
        self.tier(tier).set(TOKEN_KEY, token)
    }

    /// Token stored in one specific tier.
    pub fn token_in(&self, tier: StorageTier) -> ApiResult<Option<String>> {
        self.tier(tier).get(TOKEN_KEY)
    }

    /// Removes the token from both tiers and the cached profile.
    ///
    /// Every removal is attempted even when an earlier one fails; the first
    /// failure is returned afterwards.
    pub fn clear_token(&self) -> ApiResult<()> {
        let removals = [
            (self.persistent.as_ref(), TOKEN_KEY),
            (self.ephemeral.as_ref(), TOKEN_KEY),
            (self.persistent.as_ref(), USER_KEY),
        ];
        let mut first_error = None;
        for (store, key) in removals {
            if let Err(e) = store.remove(key) {
                warn!(key, "failed to clear session entry: {e}");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => {
                debug!("session cleared");
                Ok(())
            }
        }
    }

    pub fn is_authenticated(&self) -> ApiResult<bool> {
        Ok(self.get_token()?.is_some())
    }

    /// Cached profile, if one was stored. An unreadable entry is treated as
    /// absent.
    pub fn cached_user(&self) -> ApiResult<Option<UserProfile>> {
        let Some(raw) = self.persistent.get(USER_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!("ignoring unreadable cached user profile: {e}");
                Ok(None)
            }
        }
    }

    /// Replaces the cached profile wholesale.
    pub fn cache_user(&self, user: &UserProfile) -> ApiResult<()> {
        let raw = serde_json::to_string(user).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.persistent.set(USER_KEY, &raw)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}
