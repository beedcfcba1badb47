//! Test unknown routes.

use axum::http::StatusCode;

use crate::e2e_tests::helpers::*;

#[test]
fn test_unknown_path() {
    let test = TestClient::new();

    let resp = test.get("/coffee", None);
    assert_error(&resp, StatusCode::NOT_FOUND, "resource not found");
    assert_eq!(resp.code(), None);
}

#[test]
fn test_unknown_nested_path() {
    let test = TestClient::new();

    let resp = test.get("/drinks/1/recipe", Some(&manager_token()));
    assert_error(&resp, StatusCode::NOT_FOUND, "resource not found");
}
