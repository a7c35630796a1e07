use axum::http::{self, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, ADMIN_EMAIL, ADMIN_PASSWORD, VERIFICATION_CODE};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: Response) -> Value {
    let bytes: bytes::Bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<String> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .unwrap(),
        None => builder.body(String::new()).unwrap(),
    }
}

/// Router clones share state, so one `app()` acts as a stateful server.
async fn send(app: &Router, req: Request<String>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn admin_token(app: &Router) -> String {
    let resp = send(
        app,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD})),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await["token"].as_str().unwrap().to_string()
}

async fn student_token(app: &Router, email: &str) -> String {
    let resp = send(
        app,
        request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Student", "email": email, "password": "pw", "role": "student",
                "department": "CCS", "course": "BSIT", "yearLevel": 2, "section": "B"
            })),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let resp = send(
        app,
        request(
            "POST",
            "/api/auth/verify-email",
            None,
            Some(json!({"email": email, "code": VERIFICATION_CODE})),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await["token"].as_str().unwrap().to_string()
}

// --- auth ---

#[tokio::test]
async fn seeded_admin_can_log_in() {
    let app = app();
    let resp = send(
        &app,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD})),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn wrong_password_returns_401_with_message() {
    let app = app();
    let resp = send(
        &app,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": ADMIN_EMAIL, "password": "nope"})),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["message"], "Invalid email or password");
}

#[tokio::test]
async fn unverified_account_cannot_log_in() {
    let app = app();
    send(
        &app,
        request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"name": "N", "email": "n@uni.edu", "password": "pw", "role": "faculty"})),
        ),
    )
    .await;
    let resp = send(
        &app,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "n@uni.edu", "password": "pw"})),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = app();
    let resp = send(
        &app,
        request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"name": "A", "email": ADMIN_EMAIL, "password": "pw", "role": "student"})),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(resp).await["message"], "Email already registered");
}

#[tokio::test]
async fn wrong_verification_code_is_rejected() {
    let app = app();
    send(
        &app,
        request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"name": "V", "email": "v@uni.edu", "password": "pw", "role": "student"})),
        ),
    )
    .await;
    let resp = send(
        &app,
        request(
            "POST",
            "/api/auth/verify-email",
            None,
            Some(json!({"email": "v@uni.edu", "code": "000000"})),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verify_returns_current_user() {
    let app = app();
    let token = student_token(&app, "s@uni.edu").await;
    let resp = send(&app, request("GET", "/api/auth/verify", Some(&token), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["user"]["email"], "s@uni.edu");
    assert_eq!(body["user"]["isVerified"], true);
    assert_eq!(body["user"]["section"], "B");
}

#[tokio::test]
async fn logout_invalidates_token() {
    let app = app();
    let token = admin_token(&app).await;
    let resp = send(&app, request("POST", "/api/auth/logout", Some(&token), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send(&app, request("GET", "/api/auth/verify", Some(&token), None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_token_is_401() {
    let app = app();
    let resp = send(&app, request("GET", "/api/patients", None, None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["message"], "Authentication required");
}

// --- resources ---

#[tokio::test]
async fn patient_crud_lifecycle() {
    let app = app();
    let token = admin_token(&app).await;

    let resp = send(
        &app,
        request("POST", "/api/patients", Some(&token), Some(json!({"name": "Juan"}))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let id = body_json(resp).await["data"]["id"].as_str().unwrap().to_string();

    let resp = send(
        &app,
        request(
            "PUT",
            &format!("/api/patients/{id}"),
            Some(&token),
            Some(json!({"bloodType": "O+"})),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await;
    assert_eq!(updated["data"]["name"], "Juan");
    assert_eq!(updated["data"]["bloodType"], "O+");

    let resp = send(&app, request("GET", "/api/patients", Some(&token), None)).await;
    assert_eq!(body_json(resp).await["data"].as_array().unwrap().len(), 1);

    let resp = send(
        &app,
        request("DELETE", &format!("/api/patients/{id}"), Some(&token), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(
        &app,
        request("GET", &format!("/api/patients/{id}"), Some(&token), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["message"], "Not found");
}

#[tokio::test]
async fn online_appointment_gets_meet_link() {
    let app = app();
    let token = admin_token(&app).await;
    let resp = send(
        &app,
        request(
            "POST",
            "/api/appointments",
            Some(&token),
            Some(json!({"consultationType": "Online", "generateMeetLink": true})),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    let link = body["meetLink"].as_str().unwrap();
    assert!(link.starts_with("https://meet.example.com/"));
    assert_eq!(body["data"]["meetLink"], link);
    assert!(body["data"].get("generateMeetLink").is_none());
}

#[tokio::test]
async fn walk_in_appointment_has_no_meet_link() {
    let app = app();
    let token = admin_token(&app).await;
    let resp = send(
        &app,
        request(
            "POST",
            "/api/appointments",
            Some(&token),
            Some(json!({"consultationType": "Walk-in"})),
        ),
    )
    .await;
    let body = body_json(resp).await;
    assert!(body.get("meetLink").is_none());
}

// --- admin ---

#[tokio::test]
async fn admin_routes_reject_students() {
    let app = app();
    let token = student_token(&app, "x@uni.edu").await;
    let resp = send(&app, request("GET", "/api/admin/analytics", Some(&token), None)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["message"], "Admin access required");
}

#[tokio::test]
async fn audit_logs_are_paginated_newest_first() {
    let app = app();
    let token = admin_token(&app).await;
    for name in ["a", "b", "c"] {
        send(
            &app,
            request("POST", "/api/inventory", Some(&token), Some(json!({"name": name}))),
        )
        .await;
    }

    let resp = send(
        &app,
        request("GET", "/api/admin/audit-logs?page=1&limit=2", Some(&token), None),
    )
    .await;
    let body = body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["action"], "create-inventory");
    assert_eq!(body["total"], 4);

    let resp = send(&app, request("GET", "/api/admin/audit-logs/stats", Some(&token), None)).await;
    let stats = body_json(resp).await;
    assert_eq!(stats["data"]["byAction"]["create-inventory"], 3);
    assert_eq!(stats["data"]["byAction"]["login"], 1);
}

#[tokio::test]
async fn audit_logs_past_the_end_are_empty() {
    let app = app();
    let token = admin_token(&app).await;
    let uri = format!("/api/admin/audit-logs?page={}&limit=8", usize::MAX / 4);

    let resp = send(&app, request("GET", &uri, Some(&token), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn feedback_moderation() {
    let app = app();
    let token = admin_token(&app).await;
    let resp = send(&app, request("GET", "/api/admin/feedback", Some(&token), None)).await;
    let list = body_json(resp).await;
    let id = list["data"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(list["data"][0]["status"], "pending");

    let resp = send(
        &app,
        request(
            "PATCH",
            &format!("/api/admin/feedback/{id}"),
            Some(&token),
            Some(json!({"status": "approved"})),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["status"], "approved");

    let resp = send(
        &app,
        request("DELETE", &format!("/api/admin/feedback/{id}"), Some(&token), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send(&app, request("GET", "/api/admin/feedback", Some(&token), None)).await;
    assert!(body_json(resp).await["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn backup_and_restore() {
    let app = app();
    let token = admin_token(&app).await;
    send(
        &app,
        request("POST", "/api/patients", Some(&token), Some(json!({"name": "Kept"}))),
    )
    .await;
    let resp = send(&app, request("POST", "/api/admin/system/backup", Some(&token), None)).await;
    let backup = body_json(resp).await;
    assert_eq!(backup["data"]["patients"].as_array().unwrap().len(), 1);

    send(
        &app,
        request("POST", "/api/patients", Some(&token), Some(json!({"name": "Dropped"}))),
    )
    .await;

    let resp = send(
        &app,
        request("POST", "/api/admin/system/restore", Some(&token), Some(backup)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send(&app, request("GET", "/api/patients", Some(&token), None)).await;
    let patients = body_json(resp).await;
    assert_eq!(patients["data"].as_array().unwrap().len(), 1);
    assert_eq!(patients["data"][0]["name"], "Kept");
}

#[tokio::test]
async fn restore_without_data_is_bad_request() {
    let app = app();
    let token = admin_token(&app).await;
    let resp = send(
        &app,
        request("POST", "/api/admin/system/restore", Some(&token), Some(json!({}))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
