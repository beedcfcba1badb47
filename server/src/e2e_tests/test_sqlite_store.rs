//! Test the full request cycle against the SQLite store.

use axum::http::StatusCode;
use serde_json::json;

use crate::e2e_tests::helpers::*;

#[test]
fn test_sqlite_create_list_update_delete() {
    let test = TestClient::with_sqlite();

    let id = test.create_drink("Test coffee");

    let listed = test.get("/drinks", None);
    assert_eq!(
        listed.drinks().clone(),
        vec![json!({"id": id, "title": "Test coffee", "recipe": [{"color": "green", "parts": 5}]})]
    );

    let updated = test.patch(
        &format!("/drinks/{id}"),
        Some(&manager_token()),
        json!({"title": "Iced coffee", "recipe": {"name": "ice", "color": "clear", "parts": 2}}),
    );
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(
        updated.drinks()[0]["recipe"],
        json!([{"name": "ice", "color": "clear", "parts": 2}])
    );

    let deleted = test.delete(&format!("/drinks/{id}"), Some(&manager_token()));
    assert_eq!(deleted.body, json!({"success": true, "delete": id}));
    assert!(test.get("/drinks", None).drinks().is_empty());
}

#[test]
fn test_sqlite_missing_ids() {
    let test = TestClient::with_sqlite();

    let patch = test.patch("/drinks/300", Some(&manager_token()), drink_body("Latte"));
    let delete = test.delete("/drinks/500", Some(&manager_token()));

    assert_error(&patch, StatusCode::NOT_FOUND, "resource not found");
    assert_error(&delete, StatusCode::NOT_FOUND, "resource not found");
}

#[test]
fn test_sqlite_duplicate_title() {
    let test = TestClient::with_sqlite();
    test.create_drink("Latte");

    let resp = test.post("/drinks", Some(&manager_token()), drink_body("Latte"));
    assert_error(&resp, StatusCode::UNPROCESSABLE_ENTITY, "unprocessable");
}
