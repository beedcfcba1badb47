//! Test creating drinks.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;

use crate::e2e_tests::helpers::*;

#[test]
fn test_create_drink() {
    let test = TestClient::new();

    let resp = test.post(
        "/drinks",
        Some(&manager_token()),
        json!({
            "title": "Test coffee",
            "recipe": [{"name": "tea", "color": "green", "parts": 5}]
        }),
    );

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.success());
    assert_eq!(resp.drinks().len(), 1);
    assert_eq!(resp.drinks()[0]["title"], json!("Test coffee"));
    assert_eq!(
        resp.drinks()[0]["recipe"],
        json!([{"name": "tea", "color": "green", "parts": 5}])
    );
}

#[test]
fn test_create_drink_is_listed() {
    let test = TestClient::new();
    let id = test.create_drink("Test coffee");

    let resp = test.get("/drinks-detail", Some(&barista_token()));
    assert_eq!(resp.drinks().len(), 1);
    assert_eq!(resp.drinks()[0]["id"], json!(id));
}

#[test]
fn test_create_drink_single_recipe_object() {
    let test = TestClient::new();

    let resp = test.post(
        "/drinks",
        Some(&manager_token()),
        json!({
            "title": "Espresso",
            "recipe": {"name": "coffee", "color": "brown", "parts": 1}
        }),
    );

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.drinks()[0]["recipe"],
        json!([{"name": "coffee", "color": "brown", "parts": 1}])
    );
}

#[test]
fn test_create_drink_missing_recipe() {
    let test = TestClient::new();

    let resp = test.post(
        "/drinks",
        Some(&manager_token()),
        json!({"title": "Test coffee"}),
    );

    assert_error(&resp, StatusCode::UNPROCESSABLE_ENTITY, "unprocessable");
    assert!(test.get("/drinks", None).drinks().is_empty());
}

#[test]
fn test_create_drink_missing_or_empty_title() {
    let test = TestClient::new();

    for body in [
        json!({"recipe": [{"name": "tea", "color": "green", "parts": 5}]}),
        json!({"title": "", "recipe": [{"name": "tea", "color": "green", "parts": 5}]}),
    ] {
        let resp = test.post("/drinks", Some(&manager_token()), body);
        assert_error(&resp, StatusCode::UNPROCESSABLE_ENTITY, "unprocessable");
    }
}

#[test]
fn test_create_drink_whitespace_title_is_kept() {
    let test = TestClient::new();

    let resp = test.post("/drinks", Some(&manager_token()), drink_body(" "));

    assert_eq!(resp.status, StatusCode::OK, "body: {:?}", resp.body);
    assert_eq!(resp.drinks()[0]["title"], json!(" "));
}

#[test]
fn test_create_drink_malformed_recipe() {
    let test = TestClient::new();

    let resp = test.post(
        "/drinks",
        Some(&manager_token()),
        json!({"title": "Test coffee", "recipe": [{"name": "tea", "parts": "lots"}]}),
    );

    assert_error(&resp, StatusCode::UNPROCESSABLE_ENTITY, "unprocessable");
}

#[test]
fn test_create_drink_non_json_body() {
    let test = TestClient::new();

    #[allow(clippy::expect_used)]
    let request = Request::builder()
        .method(Method::POST)
        .uri("/drinks")
        .header(header::AUTHORIZATION, format!("Bearer {}", manager_token()))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request");

    let resp = test.send_request(request);
    assert_error(&resp, StatusCode::UNPROCESSABLE_ENTITY, "unprocessable");
}

#[test]
fn test_create_drink_duplicate_title() {
    let test = TestClient::new();
    test.create_drink("Test coffee");

    let resp = test.post("/drinks", Some(&manager_token()), drink_body("Test coffee"));

    assert_error(&resp, StatusCode::UNPROCESSABLE_ENTITY, "unprocessable");
    assert_eq!(test.get("/drinks", None).drinks().len(), 1);
}

#[test]
fn test_create_drink_auth_checked_before_body() {
    // A bad body from an unauthenticated caller is still a 401.
    let test = TestClient::new();

    let resp = test.post("/drinks", None, json!({"title": "Test coffee"}));
    assert_error(&resp, StatusCode::UNAUTHORIZED, "unauthorized");
}
