//! Test the detailed menu listing.

use axum::http::StatusCode;
use serde_json::json;

use crate::e2e_tests::helpers::*;

#[test]
fn test_get_drinks_detail_long_form() {
    let test = TestClient::new();
    let id = test.create_drink("Matcha");

    let resp = test.get("/drinks-detail", Some(&barista_token()));
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.success());
    assert_eq!(
        resp.drinks().clone(),
        vec![json!({
            "id": id,
            "title": "Matcha",
            "recipe": [{"name": "tea", "color": "green", "parts": 5}]
        })]
    );
}

#[test]
fn test_get_drinks_detail_lists_in_id_order() {
    let test = TestClient::new();
    let first = test.create_drink("Latte");
    let second = test.create_drink("Mocha");

    let resp = test.get("/drinks-detail", Some(&barista_token()));
    let ids: Vec<i64> = resp
        .drinks()
        .iter()
        .filter_map(|drink| drink["id"].as_i64())
        .collect();
    assert_eq!(ids, vec![first, second]);
}

#[test]
fn test_get_drinks_detail_requires_token() {
    let test = TestClient::new();

    let resp = test.get("/drinks-detail", None);
    assert_error(&resp, StatusCode::UNAUTHORIZED, "unauthorized");
}
