//! Bearer token verification.
//!
//! Validates a token's structure, expiry, signature, issuer, and audience,
//! in that order, and returns the decoded [`ClaimSet`].
//!
//! # Pre-conditions
//! - The trusted key set was validated when it was constructed.
//!
//! # Post-conditions
//! - On success, returns the claim set carried by the token.
//! - On failure, returns the first check that failed.
//!
//! # Invariants
//! - Verification is stateless and does not modify any external state.
//! - An expired token is always rejected as `Expired`, whatever its signature.

use std::collections::BTreeSet;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Validation, decode, decode_header};
use serde::Deserialize;
use serde_json::Number;

use super::keys::{KeySelectionError, TrustedKeys};
use crate::time::Clock;

/// Decoded, verified contents of a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    pub issuer: String,
    pub audience: Vec<String>,
    /// Expiry in seconds since the Unix epoch.
    pub expiry: u64,
    pub subject: String,
    /// `None` when the token carries no `permissions` claim at all.
    pub permissions: Option<BTreeSet<String>>,
}

/// The `aud` claim may be a single string or a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Default for Audience {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl From<Audience> for Vec<String> {
    fn from(audience: Audience) -> Self {
        match audience {
            Audience::One(aud) => vec![aud],
            Audience::Many(auds) => auds,
        }
    }
}

/// Claims as they appear on the wire.
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    iss: String,
    #[serde(default)]
    aud: Audience,
    exp: Number,
    #[serde(default)]
    sub: String,
    permissions: Option<Vec<String>>,
}

impl From<Claims> for ClaimSet {
    fn from(claims: Claims) -> Self {
        Self {
            issuer: claims.iss,
            audience: claims.aud.into(),
            // Negative expiries never get past the expiry check.
            expiry: whole_seconds(&claims.exp).unwrap_or_default(),
            subject: claims.sub,
            permissions: claims
                .permissions
                .map(|permissions| permissions.into_iter().collect()),
        }
    }
}

/// Just enough of the payload to check expiry before the signature.
#[derive(Debug, Deserialize)]
struct ExpiryPeek {
    exp: Number,
}

/// Error returned when token verification fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The token is absent, not well-formed, or not decodable.
    MalformedToken,
    /// No trusted key validates the signature.
    UnverifiedSignature,
    /// The current time is past the token's expiry.
    Expired,
    /// The `aud` claim does not contain the expected audience.
    WrongAudience,
    /// The `iss` claim is not the expected issuer.
    WrongIssuer,
}

impl AuthError {
    /// Stable machine-readable identifier for this failure.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MalformedToken => "malformed_token",
            Self::UnverifiedSignature => "unverified_signature",
            Self::Expired => "token_expired",
            Self::WrongAudience => "wrong_audience",
            Self::WrongIssuer => "wrong_issuer",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedToken => write!(f, "malformed token"),
            Self::UnverifiedSignature => write!(f, "unable to verify token signature"),
            Self::Expired => write!(f, "token has expired"),
            Self::WrongAudience => write!(f, "token audience is not accepted"),
            Self::WrongIssuer => write!(f, "token issuer is not accepted"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<KeySelectionError> for AuthError {
    fn from(error: KeySelectionError) -> Self {
        match error {
            KeySelectionError::UnsupportedAlgorithm(_) => Self::MalformedToken,
            KeySelectionError::MissingKeyId
            | KeySelectionError::UnknownKeyId(_)
            | KeySelectionError::UnusableKey(_) => Self::UnverifiedSignature,
        }
    }
}

/// What a token must claim to be accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierSettings {
    pub audience: String,
    pub issuer: String,
}

/// Verifies bearer tokens against a trusted key set.
#[derive(Clone)]
pub struct TokenVerifier {
    settings: VerifierSettings,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    #[must_use]
    pub const fn new(settings: VerifierSettings, clock: Arc<dyn Clock>) -> Self {
        Self { settings, clock }
    }

    /// Verify a raw token and return its claims.
    ///
    /// # Errors
    /// Returns `AuthError` describing the first check that failed.
    pub fn verify(&self, raw_token: &str, keys: &TrustedKeys) -> Result<ClaimSet, AuthError> {
        if raw_token.is_empty() {
            return Err(AuthError::MalformedToken);
        }

        let header = decode_header(raw_token).map_err(|_| AuthError::MalformedToken)?;
        let expiry = peek_expiry(raw_token)?;
        let now = self.clock.now_secs();
        if whole_seconds(&expiry).is_none_or(|exp| now >= exp) {
            return Err(AuthError::Expired);
        }

        let (key, algorithm) = keys.select(&header)?;

        let mut validation = Validation::new(algorithm);
        // Expiry was checked above against our clock.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["iss", "aud"]);
        validation.set_issuer(&[&self.settings.issuer]);
        validation.set_audience(&[&self.settings.audience]);

        let token_data = decode::<Claims>(raw_token, &key, &validation).map_err(map_jwt_error)?;
        Ok(token_data.claims.into())
    }
}

/// Read `exp` from the payload segment without checking the signature.
fn peek_expiry(raw_token: &str) -> Result<Number, AuthError> {
    let mut segments = raw_token.split('.');
    let (Some(_), Some(payload), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::MalformedToken);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| AuthError::MalformedToken)?;
    let peek: ExpiryPeek =
        serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)?;
    Ok(peek.exp)
}

/// A NumericDate rounded up to whole seconds, or `None` if it is before the epoch.
///
/// Rounding up keeps `now >= exp` exact for fractional dates.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_seconds(date: &Number) -> Option<u64> {
    date.as_u64().or_else(|| {
        date.as_f64()
            .filter(|secs| *secs >= 0.0)
            .map(|secs| secs.ceil() as u64)
    })
}

/// Maps jsonwebtoken errors to our `AuthError` type.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => AuthError::UnverifiedSignature,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidAudience => AuthError::WrongAudience,
        ErrorKind::InvalidIssuer => AuthError::WrongIssuer,
        ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
            "aud" => AuthError::WrongAudience,
            "iss" => AuthError::WrongIssuer,
            _ => AuthError::MalformedToken,
        },
        _ => AuthError::MalformedToken,
    }
}
