use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use backend::{
    AppState,
    config::{Config, StoreBackend},
    metrics::Metrics,
    router::create_router,
    store::MemoryUserStore,
};

fn test_app() -> Router {
    let config = Config {
        database_url: String::new(),
        redis_url: String::new(),
        server_host: "127.0.0.1".into(),
        server_port: 0,
        store_backend: StoreBackend::Memory,
        db_max_connections: 1,
        db_connect_timeout_secs: 1,
    };

    let state = AppState {
        store: Arc::new(MemoryUserStore::new()),
        cache: None,
        config,
        metrics: Arc::new(Metrics::new()),
    };

    create_router(state)
}

async fn request(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn create_user(app: &Router, name: &str, email: &str) -> i64 {
    let (status, body) = request(
        app,
        "POST",
        "/api/users",
        Some(json!({"name": name, "email": email})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_i64().expect("created user has an id")
}

#[tokio::test]
async fn health_reports_service_status() {
    let app = test_app();
    let (status, body) = request(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["services"]["database"], true);
    assert_eq!(body["data"]["services"]["cache"], false);
}

#[tokio::test]
async fn create_user_returns_created_record() {
    let app = test_app();
    let (status, body) = request(
        &app,
        "POST",
        "/api/users",
        Some(json!({"name": "Ann", "email": "ann@x.com"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Ann");
    assert_eq!(body["data"]["email"], "ann@x.com");
    assert!(body["data"]["id"].as_i64().is_some());
    assert!(body["data"]["created_at"].is_string());
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn create_user_requires_name_and_email() {
    let app = test_app();

    let (status, body) = request(&app, "POST", "/api/users", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Name and email are required");

    let (status, _) = request(
        &app,
        "POST",
        "/api/users",
        Some(json!({"name": "Ann", "email": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_email_is_rejected_as_conflict() {
    let app = test_app();
    create_user(&app, "Ann", "ann@x.com").await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/users",
        Some(json!({"name": "Other", "email": "ann@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    // 库里只应有一条该邮箱的记录
    let (_, list) = request(&app, "GET", "/api/users", None).await;
    let matching = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|u| u["email"] == "ann@x.com")
        .count();
    assert_eq!(matching, 1);
}

#[tokio::test]
async fn get_user_handles_invalid_and_missing_ids() {
    let app = test_app();

    let (status, body) = request(&app, "GET", "/api/users/not-a-number", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid user ID");

    let (status, body) = request(&app, "GET", "/api/users/12345", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");

    let id = create_user(&app, "Ann", "ann@x.com").await;
    let (status, body) = request(&app, "GET", &format!("/api/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "ann@x.com");
}

#[tokio::test]
async fn update_user_flow() {
    let app = test_app();
    let id = create_user(&app, "Ann", "ann@x.com").await;
    create_user(&app, "Bob", "bob@x.com").await;

    let (status, body) = request(
        &app,
        "PUT",
        &format!("/api/users/{id}"),
        Some(json!({"name": "Ann2", "email": "ann@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Ann2");

    // 改成他人邮箱要报冲突
    let (status, body) = request(
        &app,
        "PUT",
        &format!("/api/users/{id}"),
        Some(json!({"name": "Ann2", "email": "bob@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email is already taken by another user");

    let (status, _) = request(
        &app,
        "PUT",
        "/api/users/999",
        Some(json!({"name": "X", "email": "x@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/users/{id}"),
        Some(json!({"name": "", "email": "ann@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // PATCH 走同一条更新路径
    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/api/users/{id}"),
        Some(json!({"name": "Ann3", "email": "ann@x.com", "age": 30})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Ann3");
    assert_eq!(body["data"]["age"], 30);
}

#[tokio::test]
async fn delete_user_flow() {
    let app = test_app();
    let id = create_user(&app, "Ann", "ann@x.com").await;

    let (status, body) = request(&app, "DELETE", &format!("/api/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "ann@x.com");
    assert_eq!(body["message"], "User deleted successfully");

    // 再删同一 id 要 404，库保持不变
    let (status, _) = request(&app, "DELETE", &format!("/api/users/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = request(&app, "GET", "/api/users", None).await;
    assert_eq!(list["pagination"]["total"], 0);
}

#[tokio::test]
async fn pagination_slices_and_counts_pages() {
    let app = test_app();
    for i in 0..25 {
        create_user(&app, &format!("u{i}"), &format!("u{i}@x.com")).await;
    }

    let (status, body) = request(&app, "GET", "/api/users?page=2&limit=10", None).await;
    assert_eq!(status, StatusCode::OK);

    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 10);
    // 第 2 页应是第 11-20 条
    assert_eq!(users[0]["email"], "u10@x.com");
    assert_eq!(users[9]["email"], "u19@x.com");

    assert_eq!(body["pagination"]["page"], 2);
    assert_eq!(body["pagination"]["limit"], 10);
    assert_eq!(body["pagination"]["total"], 25);
    assert_eq!(body["pagination"]["totalPages"], 3);

    // 缺省参数回落到 page=1 limit=10
    let (_, body) = request(&app, "GET", "/api/users", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
    assert_eq!(body["pagination"]["page"], 1);
}

#[tokio::test]
async fn signup_and_login_flow() {
    let app = test_app();

    let (status, _) = request(&app, "POST", "/api/auth/signup", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = request(
        &app,
        "POST",
        "/api/auth/signup",
        Some(json!({"name": "Ann", "email": "ann@x.com", "password": "s3cret"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("password_hash").is_none());

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/signup",
        Some(json!({"name": "Ann", "email": "ann@x.com", "password": "other"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({"email": "ann@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = request(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({"email": "ann@x.com", "password": "s3cret"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["data"]["email"], "ann@x.com");

    let (status, body) = request(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({"email": "ann@x.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({"email": "nobody@x.com", "password": "s3cret"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn users_without_credentials_cannot_login() {
    let app = test_app();
    create_user(&app, "Ann", "ann@x.com").await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({"email": "ann@x.com", "password": "anything"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_route_returns_envelope_404() {
    let app = test_app();
    let (status, body) = request(&app, "GET", "/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Route not found");
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_text() {
    let app = test_app();

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/signup",
        Some(json!({"name": "Ann", "email": "ann@x.com", "password": "s3cret"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("user_registrations_total 1"));
    assert!(text.contains("http_requests_total"));
}

// 规约中的端到端场景：创建、读取、更新后列表反映变更
#[tokio::test]
async fn write_then_read_reflects_changes() {
    let app = test_app();

    let id = create_user(&app, "Ann", "ann@x.com").await;

    let (status, _) = request(&app, "GET", &format!("/api/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/users/{id}"),
        Some(json!({"name": "Ann2", "email": "ann@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = request(&app, "GET", "/api/users", None).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|u| u["name"].as_str())
        .collect();
    assert!(names.contains(&"Ann2"));
    assert!(!names.contains(&"Ann"));
}
