//! Client core for the university clinic REST API.
//!
//! # Overview
//! - `Session` owns the bearer token and cached profile across a persistent
//!   and an ephemeral storage tier.
//! - `ApiClient` builds requests, attaches the bearer header, hands them to a
//!   `Transport` and turns responses into JSON values or `ApiError`s.
//! - `api` holds thin per-domain facades (auth, patients, inventory,
//!   appointments, admin) over `ApiClient`.
//! - `academic` encodes and decodes the legacy course/year/section string and
//!   looks up department and course names.
//!
//! # Design
//! Request building and response parsing are pure functions on `ApiClient`;
//! only the `Transport` performs I/O, so tests substitute a fake one.

pub mod academic;
pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod storage;
pub mod transport;
pub mod types;

pub use client::{ApiClient, RequestOptions};
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::{Session, StorageTier};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use transport::{Transport, UreqTransport};
pub use types::{
    AppointmentOutcome, AuthResponse, DashboardSnapshot, LoginRequest, RegisterRequest, Role,
    UserProfile, VerifyEmailRequest,
};
