//! Authentication and authorization module.
//!
//! This module verifies bearer tokens issued by the identity provider and
//! decides whether a verified caller holds a named permission.
//!
//! # Pre-conditions
//! - The verifier is configured with the expected audience and issuer.
//! - The key provider holds at least one trusted key.
//!
//! # Post-conditions
//! - A `ClaimSet` is only produced for a token that passed every check.
//!
//! # Invariants
//! - Authentication failures map to exactly one `AuthError`.
//! - Authorization never inspects anything but the verified claim set.

pub mod jwt;
pub mod key_provider;
pub mod keys;
pub mod scope;

use axum::http::HeaderValue;
use jsonwebtoken::decode_header;

pub use jwt::{AuthError, ClaimSet, TokenVerifier, VerifierSettings};
pub use key_provider::{KeyFetchError, KeyProvider};
pub use keys::{KeyConfigError, TrustedKeys};
pub use scope::{Decision, DenyReason, authorize};

/// Verifies the bearer token of an incoming request.
pub struct Authenticator {
    keys: KeyProvider,
    verifier: TokenVerifier,
}

impl Authenticator {
    #[must_use]
    pub const fn new(keys: KeyProvider, verifier: TokenVerifier) -> Self {
        Self { keys, verifier }
    }

    /// Authenticate a request from its `Authorization` header.
    ///
    /// # Errors
    /// Returns `AuthError::MalformedToken` if the header is missing or is not a
    /// bearer token, or whatever the token verifier reports. A token whose
    /// `kid` is not in the current key set is retried once against a
    /// refreshed set.
    pub async fn authenticate(
        &self,
        authorization: Option<&HeaderValue>,
    ) -> Result<ClaimSet, AuthError> {
        let token = authorization
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or(AuthError::MalformedToken)?;

        let keys = self.keys.current().await;
        let result = self.verifier.verify(token, &keys);
        if !matches!(result, Err(AuthError::UnverifiedSignature)) {
            return result;
        }

        // The signing key may have been rotated in since the last fetch.
        let Some(kid) = decode_header(token).ok().and_then(|header| header.kid) else {
            return result;
        };
        if keys.has_key(&kid) {
            return result;
        }
        match self.keys.refresh_for_unknown_kid(&kid).await {
            Some(keys) => self.verifier.verify(token, &keys),
            None => result,
        }
    }
}

/// Extract the token from a `Bearer <token>` header value.
///
/// Returns `None` for any other scheme or an empty token.
#[must_use]
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}
