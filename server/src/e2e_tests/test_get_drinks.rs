//! Test the public menu listing.

use axum::http::StatusCode;
use serde_json::json;

use crate::e2e_tests::helpers::*;

#[test]
fn test_get_drinks_empty() {
    let test = TestClient::new();

    let resp = test.get("/drinks", None);
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!({"success": true, "drinks": []}));
}

#[test]
fn test_get_drinks_needs_no_token() {
    let test = TestClient::new();
    test.create_drink("Latte");

    let resp = test.get("/drinks", None);
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.success());
    assert_eq!(resp.drinks().len(), 1);
}

#[test]
fn test_get_drinks_uses_short_form() {
    let test = TestClient::new();
    let id = test.create_drink("Matcha");

    let resp = test.get("/drinks", None);
    assert_eq!(
        resp.drinks()[0],
        json!({"id": id, "title": "Matcha", "recipe": [{"color": "green", "parts": 5}]})
    );
}

#[test]
fn test_get_drinks_ignores_bad_token() {
    // The public listing is not gated, so a broken token does not matter.
    let test = TestClient::new();

    let resp = test.get("/drinks", Some("not-a-token"));
    assert_eq!(resp.status, StatusCode::OK);
}
