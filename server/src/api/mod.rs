//! HTTP surface of the coffee shop.
//!
//! | Method | Path             | Permission          |
//! |--------|------------------|---------------------|
//! | GET    | `/drinks`        | none                |
//! | GET    | `/drinks-detail` | `get:drinks-detail` |
//! | POST   | `/drinks`        | `post:drinks`       |
//! | PATCH  | `/drinks/{id}`   | `patch:drinks`      |
//! | DELETE | `/drinks/{id}`   | `delete:drinks`     |

pub mod error;
pub mod gate;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post};

pub use error::ApiError;
pub use gate::{PermissionGate, gated};

use crate::auth::Authenticator;
use crate::store::DrinkStore;

/// Permission names carried in the token's `permissions` claim.
pub mod permissions {
    pub const GET_DRINKS_DETAIL: &str = "get:drinks-detail";
    pub const POST_DRINKS: &str = "post:drinks";
    pub const PATCH_DRINKS: &str = "patch:drinks";
    pub const DELETE_DRINKS: &str = "delete:drinks";
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DrinkStore>,
}

/// Build the application router.
#[must_use]
pub fn router(store: Arc<dyn DrinkStore>, authenticator: Arc<Authenticator>) -> Router {
    let gate = |permission| PermissionGate::new(Arc::clone(&authenticator), permission);

    Router::new()
        .route(
            "/drinks",
            get(handlers::list_drinks).merge(gated(
                post(handlers::create_drink),
                gate(permissions::POST_DRINKS),
            )),
        )
        .route(
            "/drinks-detail",
            gated(
                get(handlers::list_drinks_detail),
                gate(permissions::GET_DRINKS_DETAIL),
            ),
        )
        .route(
            "/drinks/{id}",
            gated(
                patch(handlers::update_drink),
                gate(permissions::PATCH_DRINKS),
            )
            .merge(gated(
                delete(handlers::delete_drink),
                gate(permissions::DELETE_DRINKS),
            )),
        )
        .fallback(handlers::not_found)
        .with_state(AppState { store })
}
