//! Test that requests without a valid bearer token are rejected with 401.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;

use crate::api::permissions;
use crate::e2e_tests::helpers::*;
use crate::testing::{TEST_NOW, TEST_SECRET, TokenBuilder};

fn manager_builder() -> TokenBuilder {
    TokenBuilder::new().permissions(&[
        permissions::GET_DRINKS_DETAIL,
        permissions::POST_DRINKS,
        permissions::PATCH_DRINKS,
        permissions::DELETE_DRINKS,
    ])
}

#[test]
fn test_missing_authorization_header() {
    let test = TestClient::new();

    let resp = test.get("/drinks-detail", None);

    assert_error(&resp, StatusCode::UNAUTHORIZED, "unauthorized");
    assert_eq!(resp.code(), Some("malformed_token"));
}

#[test]
fn test_non_bearer_scheme() {
    let test = TestClient::new();

    #[allow(clippy::expect_used)]
    let request = Request::builder()
        .method(Method::GET)
        .uri("/drinks-detail")
        .header(header::AUTHORIZATION, format!("Basic {}", barista_token()))
        .body(Body::empty())
        .expect("request");

    let resp = test.send_request(request);
    assert_error(&resp, StatusCode::UNAUTHORIZED, "unauthorized");
    assert_eq!(resp.code(), Some("malformed_token"));
}

#[test]
fn test_garbage_token() {
    let test = TestClient::new();

    let resp = test.get("/drinks-detail", Some("not.a.token"));
    assert_error(&resp, StatusCode::UNAUTHORIZED, "unauthorized");
    assert_eq!(resp.code(), Some("malformed_token"));
}

#[test]
fn test_expired_token() {
    let test = TestClient::new();
    let token = manager_builder()
        .expires_at(TEST_NOW - 1)
        .sign_hs256(TEST_SECRET);

    let resp = test.get("/drinks-detail", Some(&token));
    assert_error(&resp, StatusCode::UNAUTHORIZED, "unauthorized");
    assert_eq!(resp.code(), Some("token_expired"));
}

#[test]
fn test_expired_token_with_bad_signature() {
    let test = TestClient::new();
    let token = manager_builder()
        .expires_at(TEST_NOW - 1)
        .sign_hs256(b"some-other-secret");

    let resp = test.get("/drinks-detail", Some(&token));
    assert_eq!(resp.code(), Some("token_expired"));
}

#[test]
fn test_bad_signature() {
    let test = TestClient::new();
    let token = manager_builder().sign_hs256(b"some-other-secret");

    let resp = test.get("/drinks-detail", Some(&token));
    assert_error(&resp, StatusCode::UNAUTHORIZED, "unauthorized");
    assert_eq!(resp.code(), Some("unverified_signature"));
}

#[test]
fn test_wrong_audience() {
    let test = TestClient::new();
    let token = manager_builder()
        .claim("aud", json!("someone-else"))
        .sign_hs256(TEST_SECRET);

    let resp = test.get("/drinks-detail", Some(&token));
    assert_error(&resp, StatusCode::UNAUTHORIZED, "unauthorized");
    assert_eq!(resp.code(), Some("wrong_audience"));
}

#[test]
fn test_wrong_issuer() {
    let test = TestClient::new();
    let token = manager_builder()
        .claim("iss", json!("https://evil.test/"))
        .sign_hs256(TEST_SECRET);

    let resp = test.get("/drinks-detail", Some(&token));
    assert_error(&resp, StatusCode::UNAUTHORIZED, "unauthorized");
    assert_eq!(resp.code(), Some("wrong_issuer"));
}

#[test]
fn test_every_gated_route_requires_token() {
    let test = TestClient::new();
    let id = test.create_drink("Latte");

    let responses = [
        test.get("/drinks-detail", None),
        test.post("/drinks", None, drink_body("Mocha")),
        test.patch(&format!("/drinks/{id}"), None, drink_body("Mocha")),
        test.delete(&format!("/drinks/{id}"), None),
    ];

    for resp in &responses {
        assert_error(resp, StatusCode::UNAUTHORIZED, "unauthorized");
    }

    // Nothing changed.
    let listed = test.get("/drinks", None);
    assert_eq!(listed.drinks().len(), 1);
    assert_eq!(listed.drinks()[0]["title"], json!("Latte"));
}
