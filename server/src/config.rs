//! Server configuration module.
//!
//! This module provides configuration loading for the coffee shop server from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `COFFEE_AUTH0_DOMAIN`: Identity provider domain; derives the issuer and JWKS URL
//! - `COFFEE_API_AUDIENCE`: Expected token audience (required)
//! - `COFFEE_JWT_ISSUER`: Expected token issuer (default: `https://<domain>/`)
//! - `COFFEE_JWKS_URL`: JWKS endpoint (default: `https://<domain>/.well-known/jwks.json`)
//! - `COFFEE_JWT_SECRET`: HS256 shared secret, used instead of a JWKS
//! - `COFFEE_JWT_PUBLIC_KEY`: PEM RS256 public key, used instead of a JWKS
//! - `COFFEE_JWKS_CACHE_TTL_SECS`: JWKS refresh interval (default: `3600`)
//! - `COFFEE_DATABASE_URL`: SQLite database URL (default: in-memory store)
//! - `COFFEE_LISTEN_ADDR`: Address to bind (default: `127.0.0.1`)
//! - `COFFEE_LISTEN_PORT`: Port to listen on (default: `5000`)
//!
//! # Invariants
//!
//! - Exactly one key source is selected, by precedence secret, PEM key, JWKS.
//! - `issuer` and `audience` are never empty.
//! - `listen_port` is always a valid port number (1-65535)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Where the server gets the keys that bearer tokens are checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySourceConfig {
    /// HS256 shared secret.
    Secret(Vec<u8>),
    /// PEM-encoded RS256 public key.
    PublicKey(String),
    /// Remote JSON Web Key Set, refreshed every `ttl`.
    Jwks { url: String, ttl: Duration },
}

/// Server configuration.
///
/// Contains all configuration parameters needed to run the coffee shop server.
///
/// # Pre-conditions
///
/// When constructed via `from_env()`:
/// - All required environment variables must be set
/// - All values must be valid for their respective types
///
/// # Post-conditions
///
/// - `listen_port` is always in the valid range (1-65535)
/// - `key_source` is always resolvable
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Expected `aud` claim.
    pub audience: String,
    /// Expected `iss` claim.
    pub issuer: String,
    /// Source of trusted signing keys.
    pub key_source: KeySourceConfig,
    /// SQLite URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Address to bind.
    pub listen_addr: IpAddr,
    /// Port to listen on for HTTP requests.
    pub listen_port: u16,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

const AUTH0_DOMAIN: &str = "COFFEE_AUTH0_DOMAIN";
const API_AUDIENCE: &str = "COFFEE_API_AUDIENCE";
const JWT_ISSUER: &str = "COFFEE_JWT_ISSUER";
const JWKS_URL: &str = "COFFEE_JWKS_URL";
const JWT_SECRET: &str = "COFFEE_JWT_SECRET";
const JWT_PUBLIC_KEY: &str = "COFFEE_JWT_PUBLIC_KEY";
const JWKS_CACHE_TTL_SECS: &str = "COFFEE_JWKS_CACHE_TTL_SECS";
const DATABASE_URL: &str = "COFFEE_DATABASE_URL";
const LISTEN_ADDR: &str = "COFFEE_LISTEN_ADDR";
const LISTEN_PORT: &str = "COFFEE_LISTEN_PORT";

impl ServerConfig {
    /// Default port for the server.
    pub const DEFAULT_PORT: u16 = 5000;
    /// Default bind address.
    pub const DEFAULT_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
    /// Default JWKS refresh interval.
    pub const DEFAULT_JWKS_CACHE_TTL: Duration = Duration::from_secs(3600);

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `COFFEE_API_AUDIENCE` is not set or is empty
    /// - No issuer can be determined
    /// - No key source is configured
    /// - A numeric or address variable is set but does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let domain = var(AUTH0_DOMAIN).map(|d| d.trim().trim_end_matches('/').to_string());

        let audience = var(API_AUDIENCE).ok_or_else(|| ConfigError::MissingEnvVar(API_AUDIENCE.to_string()))?;

        let issuer = var(JWT_ISSUER)
            .or_else(|| domain.as_ref().map(|d| format!("https://{d}/")))
            .ok_or_else(|| ConfigError::MissingEnvVar(JWT_ISSUER.to_string()))?;

        let key_source = Self::load_key_source(&var, domain.as_deref())?;
        let database_url = var(DATABASE_URL);
        let listen_addr = Self::load_listen_addr(&var)?;
        let listen_port = Self::load_listen_port(&var)?;

        Ok(Self {
            audience,
            issuer,
            key_source,
            database_url,
            listen_addr,
            listen_port,
        })
    }

    /// The socket address to bind.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_addr, self.listen_port)
    }

    /// Pick the key source by precedence: secret, PEM key, then JWKS.
    fn load_key_source(
        var: &impl Fn(&str) -> Option<String>,
        domain: Option<&str>,
    ) -> Result<KeySourceConfig, ConfigError> {
        if let Some(secret) = var(JWT_SECRET) {
            return Ok(KeySourceConfig::Secret(secret.into_bytes()));
        }

        if let Some(public_key) = var(JWT_PUBLIC_KEY) {
            return Ok(KeySourceConfig::PublicKey(public_key));
        }

        let url = var(JWKS_URL)
            .or_else(|| domain.map(|d| format!("https://{d}/.well-known/jwks.json")))
            .ok_or_else(|| ConfigError::InvalidValue {
                name: AUTH0_DOMAIN.to_string(),
                message: format!(
                    "no key source configured; set {AUTH0_DOMAIN}, {JWKS_URL}, {JWT_PUBLIC_KEY} or {JWT_SECRET}"
                ),
            })?;

        let ttl = match var(JWKS_CACHE_TTL_SECS) {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidValue {
                    name: JWKS_CACHE_TTL_SECS.to_string(),
                    message: format!("'{value}' is not a whole number of seconds"),
                })?,
            None => Self::DEFAULT_JWKS_CACHE_TTL,
        };

        Ok(KeySourceConfig::Jwks { url, ttl })
    }

    /// Load the bind address.
    ///
    /// Returns the default if not set.
    fn load_listen_addr(var: &impl Fn(&str) -> Option<String>) -> Result<IpAddr, ConfigError> {
        match var(LISTEN_ADDR) {
            Some(value) => value.trim().parse::<IpAddr>().map_err(|_| ConfigError::InvalidValue {
                name: LISTEN_ADDR.to_string(),
                message: format!("'{value}' is not a valid IP address"),
            }),
            None => Ok(Self::DEFAULT_ADDR),
        }
    }

    /// Load the listen port.
    ///
    /// Returns the default if not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is set but not a valid port number.
    fn load_listen_port(var: &impl Fn(&str) -> Option<String>) -> Result<u16, ConfigError> {
        let Some(value) = var(LISTEN_PORT) else {
            return Ok(Self::DEFAULT_PORT);
        };

        match value.trim().parse::<u16>() {
            Ok(port) if port != 0 => Ok(port),
            _ => Err(ConfigError::InvalidValue {
                name: LISTEN_PORT.to_string(),
                message: format!("'{value}' is not a valid port number (must be 1-65535)"),
            }),
        }
    }
}
