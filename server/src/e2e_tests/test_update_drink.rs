//! Test updating drinks.

use axum::http::StatusCode;
use serde_json::json;

use crate::e2e_tests::helpers::*;

#[test]
fn test_update_drink() {
    let test = TestClient::new();
    let id = test.create_drink("Latte");

    let resp = test.patch(
        &format!("/drinks/{id}"),
        Some(&manager_token()),
        json!({
            "title": "Oat latte",
            "recipe": [
                {"name": "espresso", "color": "brown", "parts": 1},
                {"name": "oat milk", "color": "beige", "parts": 3}
            ]
        }),
    );

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.success());
    assert_eq!(
        resp.drinks().clone(),
        vec![json!({
            "id": id,
            "title": "Oat latte",
            "recipe": [
                {"name": "espresso", "color": "brown", "parts": 1},
                {"name": "oat milk", "color": "beige", "parts": 3}
            ]
        })]
    );

    // The change is visible to later reads.
    let listed = test.get("/drinks-detail", Some(&barista_token()));
    assert_eq!(listed.drinks()[0]["title"], json!("Oat latte"));
}

#[test]
fn test_update_nonexistent_drink() {
    let test = TestClient::new();

    let resp = test.patch("/drinks/300", Some(&manager_token()), drink_body("Latte"));

    assert_error(&resp, StatusCode::NOT_FOUND, "resource not found");
}

#[test]
fn test_update_nonexistent_drink_with_bad_body() {
    let test = TestClient::new();

    let resp = test.patch("/drinks/300", Some(&manager_token()), json!({}));

    assert_error(&resp, StatusCode::NOT_FOUND, "resource not found");
}

#[test]
fn test_update_drink_requires_title_and_recipe() {
    let test = TestClient::new();
    let id = test.create_drink("Latte");

    for body in [json!({"title": "Mocha"}), json!({"recipe": []})] {
        let resp = test.patch(&format!("/drinks/{id}"), Some(&manager_token()), body);
        assert_error(&resp, StatusCode::UNPROCESSABLE_ENTITY, "unprocessable");
    }

    let listed = test.get("/drinks", None);
    assert_eq!(listed.drinks()[0]["title"], json!("Latte"));
}

#[test]
fn test_update_drink_to_taken_title() {
    let test = TestClient::new();
    test.create_drink("Latte");
    let mocha = test.create_drink("Mocha");

    let resp = test.patch(
        &format!("/drinks/{mocha}"),
        Some(&manager_token()),
        drink_body("Latte"),
    );

    assert_error(&resp, StatusCode::UNPROCESSABLE_ENTITY, "unprocessable");
}

#[test]
fn test_update_drink_non_integer_id() {
    let test = TestClient::new();

    let resp = test.patch("/drinks/latte", Some(&manager_token()), drink_body("Latte"));

    assert_error(&resp, StatusCode::NOT_FOUND, "resource not found");
}
