//! Per-route permission middleware.
//!
//! A gated route first authenticates the bearer token, then checks the
//! route's required permission. Either failure ends the request before the
//! handler runs. On success the verified [`ClaimSet`] is placed in the
//! request extensions for the handler.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::MethodRouter;

use super::error::ApiError;
use crate::auth::{Authenticator, Decision, authorize};

/// The permission a route requires, and how to check it.
#[derive(Clone)]
pub struct PermissionGate {
    authenticator: Arc<Authenticator>,
    permission: &'static str,
}

impl PermissionGate {
    #[must_use]
    pub const fn new(authenticator: Arc<Authenticator>, permission: &'static str) -> Self {
        Self {
            authenticator,
            permission,
        }
    }
}

/// Verify the caller and check the gate's permission.
pub async fn require_permission(
    State(gate): State<PermissionGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Owned so no borrow of the (non-Sync) request body is held across the await.
    let authorization = request.headers().get(AUTHORIZATION).cloned();

    let claims = gate
        .authenticator
        .authenticate(authorization.as_ref())
        .await
        .inspect_err(|e| {
            tracing::debug!(
                "Rejected {} {}: {e}",
                request.method(),
                request.uri().path()
            );
        })?;

    if let Decision::Deny(reason) = authorize(&claims, gate.permission) {
        tracing::debug!(
            "Denied {} {} for {}: {reason} ({})",
            request.method(),
            request.uri().path(),
            claims.subject,
            gate.permission
        );
        return Err(reason.into());
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Wrap every method of `route` in `gate`.
#[must_use]
pub fn gated<S>(route: MethodRouter<S>, gate: PermissionGate) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.route_layer(middleware::from_fn_with_state(gate, require_permission))
}
