//! Test that verified callers without the route's permission get 403.

use axum::http::StatusCode;
use serde_json::json;

use crate::api::permissions;
use crate::e2e_tests::helpers::*;
use crate::testing::{TEST_SECRET, TokenBuilder};

#[test]
fn test_token_without_permissions_claim() {
    let test = TestClient::new();
    let token = TokenBuilder::new()
        .without("permissions")
        .sign_hs256(TEST_SECRET);

    let resp = test.get("/drinks-detail", Some(&token));

    assert_error(&resp, StatusCode::FORBIDDEN, "permission error");
    assert_eq!(resp.code(), Some("permissions_missing"));
}

#[test]
fn test_token_missing_required_permission() {
    let test = TestClient::new();

    let resp = test.post("/drinks", Some(&barista_token()), drink_body("Latte"));

    assert_error(&resp, StatusCode::FORBIDDEN, "permission error");
    assert_eq!(resp.code(), Some("permission_not_granted"));
    assert!(test.get("/drinks", None).drinks().is_empty());
}

#[test]
fn test_barista_cannot_modify_drinks() {
    let test = TestClient::new();
    let id = test.create_drink("Latte");
    let barista = barista_token();

    let patch = test.patch(&format!("/drinks/{id}"), Some(&barista), drink_body("Mocha"));
    let delete = test.delete(&format!("/drinks/{id}"), Some(&barista));

    assert_error(&patch, StatusCode::FORBIDDEN, "permission error");
    assert_error(&delete, StatusCode::FORBIDDEN, "permission error");

    let listed = test.get("/drinks", None);
    assert_eq!(listed.drinks()[0]["title"], json!("Latte"));
}

#[test]
fn test_each_route_checks_its_own_permission() {
    let test = TestClient::new();
    let id = test.create_drink("Latte");

    // Only the delete permission: everything else is refused, delete works.
    let token = token_with(&[permissions::DELETE_DRINKS]);

    assert_eq!(
        test.get("/drinks-detail", Some(&token)).status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        test.post("/drinks", Some(&token), drink_body("Mocha")).status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        test.patch(&format!("/drinks/{id}"), Some(&token), drink_body("Mocha"))
            .status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        test.delete(&format!("/drinks/{id}"), Some(&token)).status,
        StatusCode::OK
    );
}

#[test]
fn test_permission_checked_before_existence() {
    // A caller without the permission learns nothing about which ids exist.
    let test = TestClient::new();

    let resp = test.delete("/drinks/500", Some(&barista_token()));
    assert_error(&resp, StatusCode::FORBIDDEN, "permission error");
}
