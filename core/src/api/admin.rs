use std::thread;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::{ApiClient, RequestOptions};
use crate::error::ApiResult;
use crate::http::HttpMethod;
use crate::types::DashboardSnapshot;

use super::ResourceApi;

const FEEDBACK: &str = "/api/admin/feedback";

/// Moderation state of a feedback entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    Pending,
    Approved,
    Rejected,
    Hidden,
}

/// `/api/admin`: analytics, audit logs, user management, feedback
/// moderation and system backup.
pub struct AdminApi<'a> {
    client: &'a ApiClient,
    users: ResourceApi<'a>,
}

impl<'a> AdminApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            users: ResourceApi::new(client, "/api/admin/users"),
        }
    }

    pub fn analytics(&self) -> ApiResult<Value> {
        self.client.request("/api/admin/analytics", RequestOptions::get())
    }

    pub fn audit_logs(&self, page: u32, limit: u32) -> ApiResult<Value> {
        let path = format!("/api/admin/audit-logs?page={page}&limit={limit}");
        self.client.request(&path, RequestOptions::get())
    }

    pub fn audit_stats(&self) -> ApiResult<Value> {
        self.client.request("/api/admin/audit-logs/stats", RequestOptions::get())
    }

    /// Fetches analytics and audit statistics concurrently. Both calls run
    /// to completion; the snapshot fails if either does.
    pub fn dashboard(&self) -> ApiResult<DashboardSnapshot> {
        let (analytics, audit_stats) = thread::scope(|s| {
            let analytics = s.spawn(|| self.analytics());
            let audit_stats = s.spawn(|| self.audit_stats());
            (join(analytics), join(audit_stats))
        });
        Ok(DashboardSnapshot {
            analytics: analytics?,
            audit_stats: audit_stats?,
        })
    }

    pub fn list_users(&self) -> ApiResult<Value> {
        self.users.list()
    }

    pub fn create_user(&self, user: &impl Serialize) -> ApiResult<Value> {
        self.users.create(user)
    }

    pub fn update_user(&self, id: &str, changes: &impl Serialize) -> ApiResult<Value> {
        self.users.update(id, changes)
    }

    pub fn delete_user(&self, id: &str) -> ApiResult<Value> {
        self.users.delete(id)
    }

    pub fn list_feedback(&self) -> ApiResult<Value> {
        self.client.request(FEEDBACK, RequestOptions::get())
    }

    pub fn moderate_feedback(&self, id: &str, status: FeedbackStatus) -> ApiResult<Value> {
        let path = super::item_path(FEEDBACK, id)?;
        let options = RequestOptions::json(HttpMethod::Patch, &json!({ "status": status }))?;
        self.client.request(&path, options)
    }

    pub fn delete_feedback(&self, id: &str) -> ApiResult<Value> {
        let path = super::item_path(FEEDBACK, id)?;
        self.client.request(&path, RequestOptions::delete())
    }

    pub fn backup(&self) -> ApiResult<Value> {
        self.client.request(
            "/api/admin/system/backup",
            RequestOptions::new(HttpMethod::Post),
        )
    }

    /// Restores from a backup previously returned by [`AdminApi::backup`].
    pub fn restore(&self, backup: &Value) -> ApiResult<Value> {
        let options = RequestOptions::json(HttpMethod::Post, backup)?;
        self.client.request("/api/admin/system/restore", options)
    }
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}
