//! Registro, login y protección de rutas.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;
use softcat::utils::jwt::TokenService;
use uuid::Uuid;

#[tokio::test]
async fn register_then_login_issues_working_tokens() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    assert!(!token.is_empty());

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "admin", "password": "s3cret-pass" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let login_token = body["token"].as_str().unwrap();
    let (status, _) = app
        .request(
            "POST",
            "/api/categories",
            Some(json!({ "name": "Utilities", "description": "Small tools" })),
            Some(login_token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let app = TestApp::new();
    app.admin_token().await;

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({ "username": "admin", "password": "another-pass" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Admin already exists");
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_the_same() {
    let app = TestApp::new();
    app.admin_token().await;

    let (status, wrong_password) = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "admin", "password": "not-it" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password["message"], "Invalid credentials");

    let (status, unknown_user) = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "nobody", "password": "not-it" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user, wrong_password);
}

#[tokio::test]
async fn mutating_routes_require_a_valid_token() {
    let app = TestApp::new();
    let body = json!({ "name": "Utilities", "description": "Small tools" });

    let (status, resp) = app
        .request("POST", "/api/categories", Some(body.clone()), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp["success"], false);

    let (status, _) = app
        .request("POST", "/api/categories", Some(body.clone()), Some("garbage"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request("DELETE", &format!("/api/software/{}", Uuid::new_v4()), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_tokens_and_unknown_admins_are_rejected() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    let admin_id = app.state.tokens.verify(&token).unwrap().admin_id().unwrap();

    let expired = TokenService::new("test-secret", chrono::Duration::minutes(-5))
        .issue(admin_id)
        .unwrap();
    let (status, _) = app
        .request(
            "POST",
            "/api/categories",
            Some(json!({ "name": "Utilities", "description": "Small tools" })),
            Some(&expired),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let stranger = app.state.tokens.issue(Uuid::new_v4()).unwrap();
    let (status, _) = app
        .request(
            "POST",
            "/api/categories",
            Some(json!({ "name": "Utilities", "description": "Small tools" })),
            Some(&stranger),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_validates_input() {
    let app = TestApp::new();

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({ "username": "admin", "password": "123" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Password must be at least 6 characters");

    let (status, body) = app
        .request("POST", "/api/auth/register", Some(json!({ "password": "123456" })), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn malformed_json_gets_the_error_envelope() {
    let app = TestApp::new();
    let response = {
        use axum::{body::Body, http::Request};
        use tower::ServiceExt;
        app.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header("Content-Type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap()
    };
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let app = TestApp::new();

    let (status, body) = app.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.request("GET", "/api/nothing-here", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "message": "Not Found" }));
}
