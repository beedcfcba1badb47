//! Common helpers for end-to-end tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::api::{self, permissions};
use crate::auth::Authenticator;
use crate::store::{DrinkStore, MemoryStore, SqliteStore};
use crate::testing::{TEST_SECRET, TokenBuilder, test_key_provider, test_verifier};

/// A router over a fresh store, driven one request at a time.
pub struct TestClient {
    router: Router,
    runtime: tokio::runtime::Runtime,
    /// Keeps an on-disk database alive for the client's lifetime.
    _database_dir: Option<TempDir>,
}

/// Status and decoded JSON body of a response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    /// The `drinks` array of a success body.
    #[must_use]
    pub fn drinks(&self) -> &Vec<Value> {
        #[allow(clippy::expect_used)]
        self.body["drinks"].as_array().expect("body has a drinks array")
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.body["success"] == json!(true)
    }

    /// The `code` of an error body, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.body["code"].as_str()
    }
}

impl TestClient {
    /// Create a new test client with an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        #[allow(clippy::expect_used)]
        let runtime = tokio::runtime::Runtime::new().expect("Failed to create runtime");
        Self::build(runtime, Arc::new(MemoryStore::new()), None)
    }

    /// Create a new test client backed by a fresh SQLite database file.
    #[must_use]
    pub fn with_sqlite() -> Self {
        #[allow(clippy::expect_used)]
        let dir = TempDir::new().expect("Failed to create temp dir");
        let url = format!("sqlite://{}", dir.path().join("drinks.db").display());

        // The pool must live on the runtime that drives the requests.
        #[allow(clippy::expect_used)]
        let runtime = tokio::runtime::Runtime::new().expect("Failed to create runtime");
        #[allow(clippy::expect_used)]
        let store = runtime
            .block_on(SqliteStore::connect(&url))
            .expect("Failed to open test database");

        Self::build(runtime, Arc::new(store), Some(dir))
    }

    fn build(
        runtime: tokio::runtime::Runtime,
        store: Arc<dyn DrinkStore>,
        database_dir: Option<TempDir>,
    ) -> Self {
        let authenticator = Arc::new(Authenticator::new(test_key_provider(), test_verifier()));
        Self {
            router: api::router(store, authenticator),
            runtime,
            _database_dir: database_dir,
        }
    }

    /// Send a request and return the response.
    pub fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        #[allow(clippy::expect_used)]
        let request = builder.body(body).expect("Failed to build request");

        self.send_request(request)
    }

    /// Send a prebuilt request and return the response.
    pub fn send_request(&self, request: Request<Body>) -> TestResponse {
        self.runtime.block_on(async {
            #[allow(clippy::expect_used)]
            let response = self
                .router
                .clone()
                .oneshot(request)
                .await
                .expect("router is infallible");
            let status = response.status();

            #[allow(clippy::expect_used)]
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("Failed to read body");
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                #[allow(clippy::expect_used)]
                serde_json::from_slice(&bytes).expect("Response body should be JSON")
            };

            TestResponse { status, body }
        })
    }

    pub fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, token, None)
    }

    pub fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, uri, token, Some(body))
    }

    pub fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::PATCH, uri, token, Some(body))
    }

    pub fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, uri, token, None)
    }

    /// Create a drink as the manager and return its id.
    pub fn create_drink(&self, title: &str) -> i64 {
        let resp = self.post("/drinks", Some(&manager_token()), drink_body(title));
        assert_eq!(resp.status, StatusCode::OK, "create {title}: {:?}", resp.body);

        #[allow(clippy::expect_used)]
        resp.drinks()[0]["id"].as_i64().expect("created drink has an id")
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tokens and bodies
// =============================================================================

/// A valid token granting `permissions`.
#[must_use]
pub fn token_with(permissions: &[&str]) -> String {
    TokenBuilder::new()
        .permissions(permissions)
        .sign_hs256(TEST_SECRET)
}

/// Barista role: may see drink details.
#[must_use]
pub fn barista_token() -> String {
    token_with(&[permissions::GET_DRINKS_DETAIL])
}

/// Manager role: may do everything.
#[must_use]
pub fn manager_token() -> String {
    token_with(&[
        permissions::GET_DRINKS_DETAIL,
        permissions::POST_DRINKS,
        permissions::PATCH_DRINKS,
        permissions::DELETE_DRINKS,
    ])
}

/// A create/update body with a one-part recipe.
#[must_use]
pub fn drink_body(title: &str) -> Value {
    json!({
        "title": title,
        "recipe": [{"name": "tea", "color": "green", "parts": 5}]
    })
}

/// Assert a uniform error body with the given status.
pub fn assert_error(resp: &TestResponse, status: StatusCode, message: &str) {
    assert_eq!(resp.status, status, "body: {:?}", resp.body);
    assert_eq!(resp.body["success"], json!(false));
    assert_eq!(resp.body["error"], json!(status.as_u16()));
    assert_eq!(resp.body["message"], json!(message));
}
