//! Domain DTOs exchanged with the clinic API.
//!
//! Field names follow the server's camelCase JSON. Resource payloads for
//! patients, inventory and appointments stay as `serde_json::Value` because
//! their shape is owned by the server and the presentation layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Account role as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Faculty,
    ClinicStaff,
    Admin,
}

/// The user profile cached next to the session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration payload. Academic fields are only meaningful for students.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

/// Body returned by login, email verification and profile updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Result of creating or updating an appointment.
///
/// `meeting_link` is set when the server provisioned an online meeting; the
/// same link is also merged into `payload["data"]["meetLink"]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentOutcome {
    pub payload: Value,
    pub meeting_link: Option<String>,
}

/// Analytics and audit statistics fetched together for the admin dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub analytics: Value,
    pub audit_stats: Value,
}
