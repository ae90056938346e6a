//! Alta, edición y borrado de categorías.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn created_category_has_slug_icon_and_zero_count() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let (status, body) = app
        .request(
            "POST",
            "/api/categories",
            Some(json!({ "name": "Security & Privacy", "description": "Antivirus and VPNs" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["slug"], "security-privacy");
    assert_eq!(body["data"]["icon"], "default-icon.png");
    assert_eq!(body["data"]["softwareCount"], 0);

    let (status, body) = app.request("GET", "/api/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_and_invalid_categories_are_rejected() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    app.create_category(&token, "Gaming").await;

    let (status, body) = app
        .request(
            "POST",
            "/api/categories",
            Some(json!({ "name": "Gaming", "description": "Again" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Category already exists");

    let (status, body) = app
        .request(
            "POST",
            "/api/categories",
            Some(json!({ "name": "x".repeat(51), "description": "Too long" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Category name cannot be more than 50 characters");
}

#[tokio::test]
async fn categories_are_listed_by_name() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    for name in ["Multimedia", "Education", "Gaming"] {
        app.create_category(&token, name).await;
    }

    let (_, body) = app.request("GET", "/api/categories", None, None).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Education", "Gaming", "Multimedia"]);
}

#[tokio::test]
async fn update_renames_and_reslugs() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    let id = app.create_category(&token, "Games").await;

    let (status, body) = app
        .request(
            "PUT",
            &format!("/api/categories/{id}"),
            Some(json!({ "name": "Game Development", "icon": "fa-gamepad" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["slug"], "game-development");
    assert_eq!(body["data"]["icon"], "fa-gamepad");
    assert_eq!(body["data"]["description"], "Games software");

    let (status, _) = app
        .request(
            "PUT",
            &format!("/api/categories/{}", Uuid::new_v4()),
            Some(json!({ "name": "Nothing" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn category_with_software_cannot_be_deleted() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    let id = app.create_category(&token, "Development").await;
    let software = app.create_software(&token, "Editor", &id).await;

    let (status, body) = app
        .request("DELETE", &format!("/api/categories/{id}"), None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot delete category with associated software");
    assert_eq!(app.category_count(&id).await, 1);

    // Sin software ya se puede borrar
    let software_id = software["_id"].as_str().unwrap();
    app.request("DELETE", &format!("/api/software/{software_id}"), None, Some(&token))
        .await;
    let (status, body) = app
        .request("DELETE", &format!("/api/categories/{id}"), None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "data": {} }));

    let (_, body) = app.request("GET", "/api/categories", None, None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_missing_category_is_not_found() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let (status, body) = app
        .request(
            "DELETE",
            &format!("/api/categories/{}", Uuid::new_v4()),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Category not found");
}
