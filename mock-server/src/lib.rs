//! In-memory stand-in for the clinic REST API.
//!
//! Implements the auth, resource and admin endpoints the client core talks
//! to, with bearer-token checks and `{"message": ...}` error bodies. State
//! lives in memory and is lost when the router is dropped.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@clinic.test";
pub const ADMIN_PASSWORD: &str = "admin123";
/// Every registration is confirmed with this code.
pub const VERIFICATION_CODE: &str = "123456";

const COLLECTIONS: [&str; 3] = ["patients", "inventory", "appointments"];

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub role: String,
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

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub department: Option<String>,
    pub course: Option<String>,
    pub year_level: Option<u8>,
    pub section: Option<String>,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct EmailCode {
    pub email: String,
    pub code: String,
}

#[derive(Deserialize)]
pub struct EmailOnly {
    pub email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub department: Option<String>,
    pub course: Option<String>,
    pub year_level: Option<u8>,
    pub section: Option<String>,
}

#[derive(Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    20
}

#[derive(Default)]
pub struct Store {
    accounts: HashMap<Uuid, Account>,
    tokens: HashMap<String, Uuid>,
    records: HashMap<&'static str, HashMap<Uuid, Value>>,
    feedback: HashMap<Uuid, Value>,
    audit: Vec<Value>,
}

impl Store {
    fn seeded() -> Self {
        let mut store = Store::default();
        let admin = Account {
            id: Uuid::new_v4(),
            name: "Clinic Administrator".to_string(),
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
            role: "admin".to_string(),
            is_verified: true,
            department: None,
            course: None,
            year_level: None,
            section: None,
        };
        store.accounts.insert(admin.id, admin);
        let feedback_id = Uuid::new_v4();
        store.feedback.insert(
            feedback_id,
            json!({
                "id": feedback_id,
                "rating": 4,
                "comment": "Short waiting time, friendly staff.",
                "status": "pending",
            }),
        );
        store
    }

    fn account_by_email(&self, email: &str) -> Option<&Account> {
        self.accounts.values().find(|a| a.email == email)
    }

    fn issue_token(&mut self, account: Uuid) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), account);
        token
    }

    fn record(&mut self, actor: &str, action: &str, target: impl Into<String>) {
        let entry = json!({
            "id": self.audit.len() + 1,
            "actor": actor,
            "action": action,
            "target": target.into(),
        });
        self.audit.push(entry);
    }

    fn collection(&mut self, name: &'static str) -> &mut HashMap<Uuid, Value> {
        self.records.entry(name).or_default()
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Debug, Error)]
pub enum MockError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("Admin access required")]
    Forbidden,
    #[error("{0}")]
    NotVerified(String),
    #[error("Not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let status = match self {
            MockError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            MockError::Forbidden | MockError::NotVerified(_) => StatusCode::FORBIDDEN,
            MockError::NotFound => StatusCode::NOT_FOUND,
            MockError::BadRequest(_) => StatusCode::BAD_REQUEST,
            MockError::Conflict(_) => StatusCode::CONFLICT,
        };
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

type MockResult<T> = Result<T, MockError>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    let mut router = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/verify-email", post(verify_email))
        .route("/api/auth/resend-verification", post(resend_verification))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/verify", get(verify))
        .route("/api/auth/profile", put(update_profile))
        .route("/api/admin/analytics", get(analytics))
        .route("/api/admin/audit-logs", get(audit_logs))
        .route("/api/admin/audit-logs/stats", get(audit_stats))
        .route("/api/admin/users", get(list_users).post(create_user))
        .route("/api/admin/users/{id}", put(update_user).delete(delete_user))
        .route("/api/admin/feedback", get(list_feedback))
        .route(
            "/api/admin/feedback/{id}",
            axum::routing::patch(moderate_feedback).delete(delete_feedback),
        )
        .route("/api/admin/system/backup", post(backup))
        .route("/api/admin/system/restore", post(restore));
    for name in COLLECTIONS {
        router = collection_routes(router, name);
    }
    router.with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!("mock clinic API listening on {addr}");
    }
    axum::serve(listener, app()).await
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn authenticate(store: &Store, headers: &HeaderMap) -> MockResult<Account> {
    let token = bearer(headers)
        .ok_or_else(|| MockError::Unauthorized("Authentication required".to_string()))?;
    store
        .tokens
        .get(token)
        .and_then(|id| store.accounts.get(id))
        .cloned()
        .ok_or_else(|| MockError::Unauthorized("Invalid or expired token".to_string()))
}

fn require_admin(store: &Store, headers: &HeaderMap) -> MockResult<Account> {
    let account = authenticate(store, headers)?;
    if account.role != "admin" {
        return Err(MockError::Forbidden);
    }
    Ok(account)
}

fn parse_id(id: &str) -> MockResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| MockError::NotFound)
}

// --- auth ---

async fn register(
    State(db): State<Db>,
    Json(input): Json<Registration>,
) -> MockResult<(StatusCode, Json<Value>)> {
    let mut store = db.write().await;
    if store.account_by_email(&input.email).is_some() {
        return Err(MockError::Conflict("Email already registered".to_string()));
    }
    let account = Account {
        id: Uuid::new_v4(),
        name: input.name,
        email: input.email,
        password: input.password,
        role: input.role,
        is_verified: false,
        department: input.department,
        course: input.course,
        year_level: input.year_level,
        section: input.section,
    };
    store.record(&account.email, "register", account.id.to_string());
    store.accounts.insert(account.id, account);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Registration successful. Check your email for a verification code."
        })),
    ))
}

async fn verify_email(
    State(db): State<Db>,
    Json(input): Json<EmailCode>,
) -> MockResult<Json<Value>> {
    let mut store = db.write().await;
    let id = store
        .account_by_email(&input.email)
        .map(|a| a.id)
        .ok_or(MockError::NotFound)?;
    if input.code != VERIFICATION_CODE {
        return Err(MockError::BadRequest("Invalid verification code".to_string()));
    }
    let account = store.accounts.get_mut(&id).ok_or(MockError::NotFound)?;
    account.is_verified = true;
    let user = account.clone();
    let token = store.issue_token(id);
    store.record(&user.email, "verify-email", id.to_string());
    Ok(Json(json!({ "message": "Email verified", "token": token, "user": user })))
}

async fn resend_verification(
    State(db): State<Db>,
    Json(input): Json<EmailOnly>,
) -> MockResult<Json<Value>> {
    let store = db.read().await;
    let account = store.account_by_email(&input.email).ok_or(MockError::NotFound)?;
    if account.is_verified {
        return Err(MockError::BadRequest("Email already verified".to_string()));
    }
    Ok(Json(json!({ "message": "Verification code sent" })))
}

async fn login(State(db): State<Db>, Json(input): Json<Credentials>) -> MockResult<Json<Value>> {
    let mut store = db.write().await;
    let account = store
        .account_by_email(&input.email)
        .filter(|a| a.password == input.password)
        .cloned()
        .ok_or_else(|| MockError::Unauthorized("Invalid email or password".to_string()))?;
    if !account.is_verified {
        return Err(MockError::NotVerified("Please verify your email first".to_string()));
    }
    let token = store.issue_token(account.id);
    store.record(&account.email, "login", account.id.to_string());
    Ok(Json(json!({ "token": token, "user": account })))
}

async fn logout(State(db): State<Db>, headers: HeaderMap) -> MockResult<Json<Value>> {
    let mut store = db.write().await;
    let account = authenticate(&store, &headers)?;
    if let Some(token) = bearer(&headers) {
        store.tokens.remove(token);
    }
    store.record(&account.email, "logout", account.id.to_string());
    Ok(Json(json!({ "message": "Logged out" })))
}

async fn verify(State(db): State<Db>, headers: HeaderMap) -> MockResult<Json<Value>> {
    let store = db.read().await;
    let account = authenticate(&store, &headers)?;
    Ok(Json(json!({ "user": account })))
}

async fn update_profile(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ProfileChanges>,
) -> MockResult<Json<Value>> {
    let mut store = db.write().await;
    let id = authenticate(&store, &headers)?.id;
    let account = store.accounts.get_mut(&id).ok_or(MockError::NotFound)?;
    if let Some(name) = input.name {
        account.name = name;
    }
    if input.department.is_some() {
        account.department = input.department;
    }
    if input.course.is_some() {
        account.course = input.course;
    }
    if input.year_level.is_some() {
        account.year_level = input.year_level;
    }
    if input.section.is_some() {
        account.section = input.section;
    }
    let user = account.clone();
    store.record(&user.email, "update-profile", id.to_string());
    Ok(Json(json!({ "message": "Profile updated", "user": user })))
}

// --- patients, inventory, appointments ---

fn collection_routes(router: Router<Db>, name: &'static str) -> Router<Db> {
    let base = format!("/api/{name}");
    let item = format!("/api/{name}/{{id}}");
    router
        .route(
            &base,
            get(move |State(db): State<Db>, headers: HeaderMap| {
                list_records(db, headers, name)
            })
            .post(
                move |State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>| {
                    create_record(db, headers, name, body)
                },
            ),
        )
        .route(
            &item,
            get(
                move |State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>| {
                    get_record(db, headers, name, id)
                },
            )
            .put(
                move |State(db): State<Db>,
                      headers: HeaderMap,
                      Path(id): Path<String>,
                      Json(body): Json<Value>| { update_record(db, headers, name, id, body) },
            )
            .delete(
                move |State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>| {
                    delete_record(db, headers, name, id)
                },
            ),
        )
}

/// Strips the provisioning flag and, when set, attaches a fresh meeting
/// link. Returns the link so it can be echoed at the top level.
fn provision_meet_link(record: &mut Map<String, Value>) -> Option<String> {
    let wanted = record
        .remove("generateMeetLink")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !wanted {
        return None;
    }
    let link = format!("https://meet.example.com/{}", &Uuid::new_v4().simple().to_string()[..10]);
    record.insert("meetLink".to_string(), Value::String(link.clone()));
    Some(link)
}

fn object(body: Value) -> MockResult<Map<String, Value>> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(MockError::BadRequest("Expected a JSON object".to_string())),
    }
}

async fn list_records(db: Db, headers: HeaderMap, name: &'static str) -> MockResult<Json<Value>> {
    let mut store = db.write().await;
    authenticate(&store, &headers)?;
    let data: Vec<Value> = store.collection(name).values().cloned().collect();
    Ok(Json(json!({ "data": data })))
}

async fn create_record(
    db: Db,
    headers: HeaderMap,
    name: &'static str,
    body: Value,
) -> MockResult<(StatusCode, Json<Value>)> {
    let mut store = db.write().await;
    let actor = authenticate(&store, &headers)?;
    let mut record = object(body)?;
    let id = Uuid::new_v4();
    record.insert("id".to_string(), json!(id));
    let meet_link = provision_meet_link(&mut record);
    let record = Value::Object(record);
    store.collection(name).insert(id, record.clone());
    store.record(&actor.email, &format!("create-{name}"), id.to_string());

    let mut response = json!({ "message": "Created", "data": record });
    if let Some(link) = meet_link {
        response["meetLink"] = Value::String(link);
    }
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_record(
    db: Db,
    headers: HeaderMap,
    name: &'static str,
    id: String,
) -> MockResult<Json<Value>> {
    let mut store = db.write().await;
    authenticate(&store, &headers)?;
    let id = parse_id(&id)?;
    let record = store.collection(name).get(&id).cloned().ok_or(MockError::NotFound)?;
    Ok(Json(json!({ "data": record })))
}

async fn update_record(
    db: Db,
    headers: HeaderMap,
    name: &'static str,
    id: String,
    body: Value,
) -> MockResult<Json<Value>> {
    let mut store = db.write().await;
    let actor = authenticate(&store, &headers)?;
    let id = parse_id(&id)?;
    let mut changes = object(body)?;
    let meet_link = provision_meet_link(&mut changes);
    let record = store.collection(name).get_mut(&id).ok_or(MockError::NotFound)?;
    if let Some(fields) = record.as_object_mut() {
        for (key, value) in changes {
            if key != "id" {
                fields.insert(key, value);
            }
        }
    }
    let record = record.clone();
    store.record(&actor.email, &format!("update-{name}"), id.to_string());

    let mut response = json!({ "message": "Updated", "data": record });
    if let Some(link) = meet_link {
        response["meetLink"] = Value::String(link);
    }
    Ok(Json(response))
}

async fn delete_record(
    db: Db,
    headers: HeaderMap,
    name: &'static str,
    id: String,
) -> MockResult<Json<Value>> {
    let mut store = db.write().await;
    let actor = authenticate(&store, &headers)?;
    let id = parse_id(&id)?;
    store.collection(name).remove(&id).ok_or(MockError::NotFound)?;
    store.record(&actor.email, &format!("delete-{name}"), id.to_string());
    Ok(Json(json!({ "message": "Deleted" })))
}

// --- admin ---

async fn analytics(State(db): State<Db>, headers: HeaderMap) -> MockResult<Json<Value>> {
    let mut store = db.write().await;
    require_admin(&store, &headers)?;
    let users = store.accounts.len();
    let patients = store.collection("patients").len();
    let inventory = store.collection("inventory").len();
    let appointments = store.collection("appointments").len();
    Ok(Json(json!({
        "data": {
            "users": users,
            "patients": patients,
            "inventoryItems": inventory,
            "appointments": appointments,
        }
    })))
}

async fn audit_logs(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(page): Query<Pagination>,
) -> MockResult<Json<Value>> {
    let store = db.read().await;
    require_admin(&store, &headers)?;
    let limit = page.limit.max(1);
    let start = page.page.saturating_sub(1).saturating_mul(limit);
    let data: Vec<&Value> = store.audit.iter().rev().skip(start).take(limit).collect();
    Ok(Json(json!({
        "data": data,
        "total": store.audit.len(),
        "page": page.page,
        "limit": limit,
    })))
}

async fn audit_stats(State(db): State<Db>, headers: HeaderMap) -> MockResult<Json<Value>> {
    let store = db.read().await;
    require_admin(&store, &headers)?;
    let mut by_action: HashMap<&str, usize> = HashMap::new();
    for entry in &store.audit {
        if let Some(action) = entry["action"].as_str() {
            *by_action.entry(action).or_default() += 1;
        }
    }
    Ok(Json(json!({ "data": { "total": store.audit.len(), "byAction": by_action } })))
}

async fn list_users(State(db): State<Db>, headers: HeaderMap) -> MockResult<Json<Value>> {
    let store = db.read().await;
    require_admin(&store, &headers)?;
    let users: Vec<&Account> = store.accounts.values().collect();
    Ok(Json(json!({ "data": users })))
}

async fn create_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<Registration>,
) -> MockResult<(StatusCode, Json<Value>)> {
    let mut store = db.write().await;
    let admin = require_admin(&store, &headers)?;
    if store.account_by_email(&input.email).is_some() {
        return Err(MockError::Conflict("Email already registered".to_string()));
    }
    let account = Account {
        id: Uuid::new_v4(),
        name: input.name,
        email: input.email,
        password: input.password,
        role: input.role,
        is_verified: true,
        department: input.department,
        course: input.course,
        year_level: input.year_level,
        section: input.section,
    };
    store.record(&admin.email, "create-user", account.id.to_string());
    store.accounts.insert(account.id, account.clone());
    Ok((StatusCode::CREATED, Json(json!({ "message": "User created", "data": account }))))
}

async fn update_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<Value>,
) -> MockResult<Json<Value>> {
    let mut store = db.write().await;
    let admin = require_admin(&store, &headers)?;
    let id = parse_id(&id)?;
    let account = store.accounts.get_mut(&id).ok_or(MockError::NotFound)?;
    if let Some(name) = input["name"].as_str() {
        account.name = name.to_string();
    }
    if let Some(role) = input["role"].as_str() {
        account.role = role.to_string();
    }
    if let Some(verified) = input["isVerified"].as_bool() {
        account.is_verified = verified;
    }
    if let Some(department) = input["department"].as_str() {
        account.department = Some(department.to_string());
    }
    let account = account.clone();
    store.record(&admin.email, "update-user", id.to_string());
    Ok(Json(json!({ "message": "User updated", "data": account })))
}

async fn delete_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> MockResult<Json<Value>> {
    let mut store = db.write().await;
    let admin = require_admin(&store, &headers)?;
    let id = parse_id(&id)?;
    store.accounts.remove(&id).ok_or(MockError::NotFound)?;
    store.tokens.retain(|_, account| *account != id);
    store.record(&admin.email, "delete-user", id.to_string());
    Ok(Json(json!({ "message": "User deleted" })))
}

async fn list_feedback(State(db): State<Db>, headers: HeaderMap) -> MockResult<Json<Value>> {
    let store = db.read().await;
    require_admin(&store, &headers)?;
    let data: Vec<&Value> = store.feedback.values().collect();
    Ok(Json(json!({ "data": data })))
}

async fn moderate_feedback(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<Value>,
) -> MockResult<Json<Value>> {
    let mut store = db.write().await;
    let admin = require_admin(&store, &headers)?;
    let id = parse_id(&id)?;
    let status = input["status"]
        .as_str()
        .ok_or_else(|| MockError::BadRequest("status is required".to_string()))?
        .to_string();
    let entry = store.feedback.get_mut(&id).ok_or(MockError::NotFound)?;
    entry["status"] = Value::String(status);
    let entry = entry.clone();
    store.record(&admin.email, "moderate-feedback", id.to_string());
    Ok(Json(json!({ "message": "Feedback updated", "data": entry })))
}

async fn delete_feedback(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> MockResult<Json<Value>> {
    let mut store = db.write().await;
    let admin = require_admin(&store, &headers)?;
    let id = parse_id(&id)?;
    store.feedback.remove(&id).ok_or(MockError::NotFound)?;
    store.record(&admin.email, "delete-feedback", id.to_string());
    Ok(Json(json!({ "message": "Feedback deleted" })))
}

async fn backup(State(db): State<Db>, headers: HeaderMap) -> MockResult<Json<Value>> {
    let mut store = db.write().await;
    let admin = require_admin(&store, &headers)?;
    let mut data = Map::new();
    for name in COLLECTIONS {
        let records: Vec<Value> = store.collection(name).values().cloned().collect();
        data.insert(name.to_string(), Value::Array(records));
    }
    store.record(&admin.email, "backup", "system");
    Ok(Json(json!({ "message": "Backup created", "data": data })))
}

async fn restore(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> MockResult<Json<Value>> {
    let mut store = db.write().await;
    let admin = require_admin(&store, &headers)?;
    let data = input["data"]
        .as_object()
        .ok_or_else(|| MockError::BadRequest("Backup data is required".to_string()))?;

    let mut restored = 0;
    for name in COLLECTIONS {
        let Some(records) = data.get(name).and_then(Value::as_array) else {
            continue;
        };
        let collection = store.collection(name);
        collection.clear();
        for record in records {
            if let Some(id) = record["id"].as_str().and_then(|s| Uuid::parse_str(s).ok()) {
                collection.insert(id, record.clone());
                restored += 1;
            }
        }
    }
    store.record(&admin.email, "restore", "system");
    Ok(Json(json!({ "message": "Backup restored", "restored": restored })))
}
