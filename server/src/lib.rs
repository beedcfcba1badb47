// Life of a request:
// 1. Request comes in on a route
// 2. Gated routes:
//     - Extract the bearer token
//     - Verify it against the trusted keys (401 on failure)
//     - Check the route's permission (403 on failure)
// 3. Handler validates the body and runs one store operation
// 4. Respond with `{success: true, ...}` or the uniform error body
//
// System components:
//  - Token verifier and scope authorizer
//  - Key provider (static keys or a refreshed JWKS)
//  - Drink store (memory or SQLite)

pub mod api;
pub mod auth;
pub mod config;
pub mod drinks;
pub mod store;
pub mod time;

mod e2e_tests;
#[cfg(test)]
mod testing;

pub use api::router;
pub use auth::{Authenticator, ClaimSet, TokenVerifier};
pub use store::DrinkStore;
