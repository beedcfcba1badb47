//! Test deleting drinks.

use axum::http::StatusCode;
use serde_json::json;

use crate::e2e_tests::helpers::*;

#[test]
fn test_delete_drink() {
    let test = TestClient::new();
    let id = test.create_drink("Latte");

    let resp = test.delete(&format!("/drinks/{id}"), Some(&manager_token()));

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!({"success": true, "delete": id}));
    assert!(test.get("/drinks", None).drinks().is_empty());
}

#[test]
fn test_delete_nonexistent_drink() {
    let test = TestClient::new();

    let resp = test.delete("/drinks/500", Some(&manager_token()));

    assert!(!resp.success());
    assert_error(&resp, StatusCode::NOT_FOUND, "resource not found");
}

#[test]
fn test_delete_drink_twice() {
    let test = TestClient::new();
    let id = test.create_drink("Latte");

    let first = test.delete(&format!("/drinks/{id}"), Some(&manager_token()));
    let second = test.delete(&format!("/drinks/{id}"), Some(&manager_token()));

    assert_eq!(first.status, StatusCode::OK);
    assert_error(&second, StatusCode::NOT_FOUND, "resource not found");
}

#[test]
fn test_delete_leaves_other_drinks() {
    let test = TestClient::new();
    let latte = test.create_drink("Latte");
    let mocha = test.create_drink("Mocha");

    test.delete(&format!("/drinks/{latte}"), Some(&manager_token()));

    let listed = test.get("/drinks", None);
    assert_eq!(listed.drinks().len(), 1);
    assert_eq!(listed.drinks()[0]["id"], json!(mocha));
}
