//! Trusted key material for bearer token verification.
//!
//! # Pre-conditions
//! - Key material is validated when a `TrustedKeys` is constructed.
//!
//! # Post-conditions
//! - `TrustedKeys` instances are immutable once created.
//!
//! # Invariants
//! - `TrustedKeys::Hs256` secrets are never empty.
//! - `TrustedKeys::Rs256` public keys are valid PEM-encoded RSA public keys.
//! - `TrustedKeys::Jwks` sets contain at least one key.

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Header};

/// Error returned when key configuration is invalid.
#[derive(Debug)]
pub enum KeyConfigError {
    /// The HS256 secret is empty.
    EmptySecret,
    /// The RS256 public key is not a valid PEM-encoded RSA public key.
    InvalidRs256PublicKey(String),
    /// The JWKS document could not be parsed.
    InvalidJwks(String),
    /// The JWKS document contains no keys.
    EmptyJwks,
}

impl std::fmt::Display for KeyConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySecret => write!(f, "HS256 secret must not be empty"),
            Self::InvalidRs256PublicKey(reason) => {
                write!(f, "invalid RS256 public key: {reason}")
            }
            Self::InvalidJwks(reason) => write!(f, "invalid JWKS document: {reason}"),
            Self::EmptyJwks => write!(f, "JWKS document contains no keys"),
        }
    }
}

impl std::error::Error for KeyConfigError {}

/// Reason no decoding key could be selected for a token header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySelectionError {
    /// The header names an algorithm this key set does not serve.
    UnsupportedAlgorithm(Algorithm),
    /// The key set is a JWKS but the header carries no `kid`.
    MissingKeyId,
    /// No key in the JWKS has the header's `kid`.
    UnknownKeyId(String),
    /// The matching key could not be turned into a decoding key.
    UnusableKey(String),
}

impl std::fmt::Display for KeySelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedAlgorithm(alg) => write!(f, "unsupported algorithm: {alg:?}"),
            Self::MissingKeyId => write!(f, "token header has no 'kid'"),
            Self::UnknownKeyId(kid) => write!(f, "no trusted key with kid '{kid}'"),
            Self::UnusableKey(reason) => write!(f, "unusable key: {reason}"),
        }
    }
}

impl std::error::Error for KeySelectionError {}

/// The set of keys a bearer token may be signed with.
///
/// Supports a shared secret (HS256), a single RSA public key (RS256), or a
/// JSON Web Key Set as published by an identity provider.
#[derive(Debug, Clone)]
pub enum TrustedKeys {
    /// HMAC-SHA256 symmetric signing.
    Hs256 {
        /// The shared secret used for HMAC-SHA256.
        secret: Vec<u8>,
    },
    /// RSA-SHA256 asymmetric signing with one known key.
    Rs256 {
        /// PEM-encoded RSA public key.
        public_key: String,
    },
    /// Keys published by an identity provider, selected by the token's `kid`.
    Jwks(JwkSet),
}

impl TrustedKeys {
    /// Create an HS256 key set.
    ///
    /// # Errors
    /// Returns `KeyConfigError::EmptySecret` if the secret is empty.
    pub fn new_hs256(secret: Vec<u8>) -> Result<Self, KeyConfigError> {
        if secret.is_empty() {
            return Err(KeyConfigError::EmptySecret);
        }
        Ok(Self::Hs256 { secret })
    }

    /// Create an RS256 key set from a PEM public key.
    ///
    /// # Errors
    /// Returns `KeyConfigError::InvalidRs256PublicKey` if the key is not a valid RS256 PEM key.
    pub fn new_rs256(public_key: String) -> Result<Self, KeyConfigError> {
        // DecodingKey::from_rsa_pem validates the PEM format and RSA structure.
        DecodingKey::from_rsa_pem(public_key.as_bytes())
            .map_err(|e| KeyConfigError::InvalidRs256PublicKey(e.to_string()))?;

        Ok(Self::Rs256 { public_key })
    }

    /// Create a key set from a parsed JWKS.
    ///
    /// # Errors
    /// Returns `KeyConfigError::EmptyJwks` if the set has no keys.
    pub fn from_jwks(jwks: JwkSet) -> Result<Self, KeyConfigError> {
        if jwks.keys.is_empty() {
            return Err(KeyConfigError::EmptyJwks);
        }
        Ok(Self::Jwks(jwks))
    }

    /// Create a key set from a JWKS JSON document.
    ///
    /// # Errors
    /// Returns `KeyConfigError::InvalidJwks` if the document does not parse,
    /// or `KeyConfigError::EmptyJwks` if it has no keys.
    pub fn from_jwks_json(json: &str) -> Result<Self, KeyConfigError> {
        let jwks: JwkSet =
            serde_json::from_str(json).map_err(|e| KeyConfigError::InvalidJwks(e.to_string()))?;
        Self::from_jwks(jwks)
    }

    /// Pick the decoding key and algorithm for a token with the given header.
    ///
    /// # Errors
    /// Returns `KeySelectionError` if no trusted key can serve the header.
    pub fn select(&self, header: &Header) -> Result<(DecodingKey, Algorithm), KeySelectionError> {
        match self {
            Self::Hs256 { secret } => {
                if header.alg != Algorithm::HS256 {
                    return Err(KeySelectionError::UnsupportedAlgorithm(header.alg));
                }
                Ok((DecodingKey::from_secret(secret), Algorithm::HS256))
            }
            Self::Rs256 { public_key } => {
                if header.alg != Algorithm::RS256 {
                    return Err(KeySelectionError::UnsupportedAlgorithm(header.alg));
                }
                let key = DecodingKey::from_rsa_pem(public_key.as_bytes())
                    .map_err(|e| KeySelectionError::UnusableKey(e.to_string()))?;
                Ok((key, Algorithm::RS256))
            }
            Self::Jwks(jwks) => {
                let kid = header
                    .kid
                    .as_deref()
                    .ok_or(KeySelectionError::MissingKeyId)?;
                let jwk = jwks
                    .find(kid)
                    .ok_or_else(|| KeySelectionError::UnknownKeyId(kid.to_string()))?;
                let algorithm = pinned_algorithm(jwk, header.alg)?;
                if header.alg != algorithm {
                    return Err(KeySelectionError::UnsupportedAlgorithm(header.alg));
                }
                let key = DecodingKey::from_jwk(jwk)
                    .map_err(|e| KeySelectionError::UnusableKey(e.to_string()))?;
                Ok((key, algorithm))
            }
        }
    }

    /// Whether the set publishes a key with this `kid`.
    #[must_use]
    pub fn has_key(&self, kid: &str) -> bool {
        match self {
            Self::Hs256 { .. } | Self::Rs256 { .. } => false,
            Self::Jwks(jwks) => jwks.find(kid).is_some(),
        }
    }

    /// Number of keys in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Hs256 { .. } | Self::Rs256 { .. } => 1,
            Self::Jwks(jwks) => jwks.keys.len(),
        }
    }

    /// Whether the set is empty. Always false for a constructed set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The one algorithm a published key verifies: its `alg` when present,
/// otherwise RS256 for RSA keys and HS256 for symmetric keys.
fn pinned_algorithm(jwk: &Jwk, requested: Algorithm) -> Result<Algorithm, KeySelectionError> {
    if let Some(published) = jwk.common.key_algorithm {
        return published
            .to_string()
            .parse()
            .map_err(|_| KeySelectionError::UnsupportedAlgorithm(requested));
    }
    match jwk.algorithm {
        AlgorithmParameters::RSA(_) => Ok(Algorithm::RS256),
        AlgorithmParameters::OctetKey(_) => Ok(Algorithm::HS256),
        AlgorithmParameters::EllipticCurve(_) | AlgorithmParameters::OctetKeyPair(_) => {
            Err(KeySelectionError::UnsupportedAlgorithm(requested))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TEST_JWKS_JSON, TEST_KID, TEST_RSA_KID, TEST_RSA_PUBLIC_KEY};

    fn header(alg: Algorithm, kid: Option<&str>) -> Header {
        let mut header = Header::new(alg);
        header.kid = kid.map(ToString::to_string);
        header
    }

    #[test]
    fn test_new_hs256_valid() {
        let result = TrustedKeys::new_hs256(b"my-secret-key".to_vec());

        if let Ok(TrustedKeys::Hs256 { secret }) = result {
            assert_eq!(secret, b"my-secret-key");
        } else {
            panic!("Expected Hs256 key set");
        }
    }

    #[test]
    fn test_new_hs256_empty_secret() {
        let result = TrustedKeys::new_hs256(Vec::new());
        assert!(matches!(result, Err(KeyConfigError::EmptySecret)));
    }

    #[test]
    fn test_new_rs256_valid() {
        let result = TrustedKeys::new_rs256(TEST_RSA_PUBLIC_KEY.to_string());

        if let Ok(TrustedKeys::Rs256 { public_key }) = result {
            assert_eq!(public_key, TEST_RSA_PUBLIC_KEY);
        } else {
            panic!("Expected Rs256 key set");
        }
    }

    #[test]
    fn test_new_rs256_invalid_pem() {
        let result = TrustedKeys::new_rs256("not a valid pem key".to_string());
        assert!(matches!(result, Err(KeyConfigError::InvalidRs256PublicKey(_))));
    }

    #[test]
    fn test_new_rs256_truncated_key() {
        let result = TrustedKeys::new_rs256(
            "-----BEGIN PUBLIC KEY-----\nMIIBIjAN...\n-----END PUBLIC KEY-----".to_string(),
        );
        assert!(matches!(result, Err(KeyConfigError::InvalidRs256PublicKey(_))));
    }

    #[test]
    fn test_from_jwks_json_valid() {
        let keys = TrustedKeys::from_jwks_json(TEST_JWKS_JSON).expect("valid jwks");
        assert_eq!(keys.len(), 2);
        assert!(!keys.is_empty());
    }

    #[test]
    fn test_from_jwks_json_not_json() {
        let result = TrustedKeys::from_jwks_json("{not json");
        assert!(matches!(result, Err(KeyConfigError::InvalidJwks(_))));
    }

    #[test]
    fn test_from_jwks_json_no_keys() {
        let result = TrustedKeys::from_jwks_json(r#"{"keys":[]}"#);
        assert!(matches!(result, Err(KeyConfigError::EmptyJwks)));
    }

    #[test]
    fn test_select_hs256_rejects_other_algorithms() {
        let keys = TrustedKeys::new_hs256(b"secret".to_vec()).expect("valid secret");

        assert!(keys.select(&header(Algorithm::HS256, None)).is_ok());
        assert_eq!(
            keys.select(&header(Algorithm::RS256, None)).err(),
            Some(KeySelectionError::UnsupportedAlgorithm(Algorithm::RS256))
        );
    }

    #[test]
    fn test_select_rs256_rejects_hs256_header() {
        let keys = TrustedKeys::new_rs256(TEST_RSA_PUBLIC_KEY.to_string()).expect("valid key");

        assert!(keys.select(&header(Algorithm::RS256, None)).is_ok());
        assert_eq!(
            keys.select(&header(Algorithm::HS256, None)).err(),
            Some(KeySelectionError::UnsupportedAlgorithm(Algorithm::HS256))
        );
    }

    #[test]
    fn test_select_jwks_by_kid() {
        let keys = TrustedKeys::from_jwks_json(TEST_JWKS_JSON).expect("valid jwks");

        let (_, alg) = keys
            .select(&header(Algorithm::RS256, Some(TEST_RSA_KID)))
            .expect("rsa key");
        assert_eq!(alg, Algorithm::RS256);

        let (_, alg) = keys
            .select(&header(Algorithm::HS256, Some(TEST_KID)))
            .expect("oct key");
        assert_eq!(alg, Algorithm::HS256);
    }

    #[test]
    fn test_select_jwks_pins_published_algorithm() {
        let keys = TrustedKeys::from_jwks_json(TEST_JWKS_JSON).expect("valid jwks");

        for alg in [Algorithm::RS384, Algorithm::RS512, Algorithm::PS256, Algorithm::PS512] {
            assert_eq!(
                keys.select(&header(alg, Some(TEST_RSA_KID))).err(),
                Some(KeySelectionError::UnsupportedAlgorithm(alg))
            );
        }
        assert_eq!(
            keys.select(&header(Algorithm::HS512, Some(TEST_KID))).err(),
            Some(KeySelectionError::UnsupportedAlgorithm(Algorithm::HS512))
        );
    }

    #[test]
    fn test_select_jwks_without_alg_defaults_by_key_type() {
        let json = TEST_JWKS_JSON
            .replace(r#""alg":"RS256","#, "")
            .replace(r#""alg":"HS256","#, "");
        let keys = TrustedKeys::from_jwks_json(&json).expect("valid jwks");

        let (_, alg) = keys
            .select(&header(Algorithm::RS256, Some(TEST_RSA_KID)))
            .expect("rsa key");
        assert_eq!(alg, Algorithm::RS256);
        assert_eq!(
            keys.select(&header(Algorithm::PS256, Some(TEST_RSA_KID))).err(),
            Some(KeySelectionError::UnsupportedAlgorithm(Algorithm::PS256))
        );
        assert_eq!(
            keys.select(&header(Algorithm::HS384, Some(TEST_KID))).err(),
            Some(KeySelectionError::UnsupportedAlgorithm(Algorithm::HS384))
        );
    }

    #[test]
    fn test_has_key() {
        let jwks = TrustedKeys::from_jwks_json(TEST_JWKS_JSON).expect("valid jwks");
        assert!(jwks.has_key(TEST_RSA_KID));
        assert!(!jwks.has_key("rotated-in"));

        let secret = TrustedKeys::new_hs256(b"secret".to_vec()).expect("valid secret");
        assert!(!secret.has_key(TEST_KID));
    }

    #[test]
    fn test_select_jwks_missing_kid() {
        let keys = TrustedKeys::from_jwks_json(TEST_JWKS_JSON).expect("valid jwks");
        assert_eq!(
            keys.select(&header(Algorithm::RS256, None)).err(),
            Some(KeySelectionError::MissingKeyId)
        );
    }

    #[test]
    fn test_select_jwks_unknown_kid() {
        let keys = TrustedKeys::from_jwks_json(TEST_JWKS_JSON).expect("valid jwks");
        assert_eq!(
            keys.select(&header(Algorithm::RS256, Some("rotated-away"))).err(),
            Some(KeySelectionError::UnknownKeyId("rotated-away".to_string()))
        );
    }

    #[test]
    fn test_key_config_error_display() {
        assert_eq!(
            KeyConfigError::EmptySecret.to_string(),
            "HS256 secret must not be empty"
        );
        assert_eq!(
            KeyConfigError::InvalidRs256PublicKey("bad format".to_string()).to_string(),
            "invalid RS256 public key: bad format"
        );
        assert_eq!(
            KeyConfigError::EmptyJwks.to_string(),
            "JWKS document contains no keys"
        );
    }
}
