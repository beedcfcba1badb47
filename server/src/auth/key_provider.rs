//! Process-wide source of the trusted key set.
//!
//! Provides the current [`TrustedKeys`] to token verification. A static key
//! set never changes. A remote JWKS is fetched once at startup and refreshed
//! lazily once its TTL has passed, or early when a token names a `kid` the
//! cached set does not publish.
//!
//! # Pre-conditions
//! - A remote provider is only constructed if its first fetch succeeds.
//!
//! # Post-conditions
//! - `current()` always returns a complete, validated key set.
//!
//! # Invariants
//! - Cached key sets are never partially constructed.
//! - A failed refresh keeps serving the previous key set.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::jwk::JwkSet;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::keys::{KeyConfigError, TrustedKeys};

/// Timeout for a single JWKS request.
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait before retrying after a failed refresh.
const RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Minimum spacing between early refreshes triggered by an unknown `kid`.
const UNKNOWN_KID_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Errors that can occur when fetching a remote key set.
#[derive(Debug)]
pub enum KeyFetchError {
    /// The HTTP request failed or returned a non-success status.
    Http(reqwest::Error),
    /// The response was not a usable JWKS.
    InvalidKeys(KeyConfigError),
}

impl std::fmt::Display for KeyFetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(e) => write!(f, "failed to fetch JWKS: {e}"),
            Self::InvalidKeys(e) => write!(f, "fetched JWKS is unusable: {e}"),
        }
    }
}

impl std::error::Error for KeyFetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::InvalidKeys(e) => Some(e),
        }
    }
}

impl From<reqwest::Error> for KeyFetchError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<KeyConfigError> for KeyFetchError {
    fn from(e: KeyConfigError) -> Self {
        Self::InvalidKeys(e)
    }
}

/// Supplies the current trusted key set.
pub struct KeyProvider {
    source: KeySource,
}

enum KeySource {
    Fixed(Arc<TrustedKeys>),
    Remote(RemoteJwks),
}

struct RemoteJwks {
    url: String,
    ttl: Duration,
    client: reqwest::Client,
    cache: RwLock<CachedKeys>,
}

struct CachedKeys {
    keys: Arc<TrustedKeys>,
    refresh_after: Instant,
    /// Earliest time an unknown `kid` may force another fetch.
    unknown_kid_refresh_after: Instant,
}

impl KeyProvider {
    /// A provider that always serves the same key set.
    #[must_use]
    pub fn fixed(keys: TrustedKeys) -> Self {
        Self {
            source: KeySource::Fixed(Arc::new(keys)),
        }
    }

    /// A provider backed by a JWKS endpoint.
    ///
    /// Fetches the key set immediately; later calls to `current` refresh it
    /// once `ttl` has elapsed.
    ///
    /// # Errors
    /// Returns `KeyFetchError` if the initial fetch fails.
    pub async fn remote(url: String, ttl: Duration) -> Result<Self, KeyFetchError> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        let keys = fetch_jwks(&client, &url).await?;

        tracing::info!("Loaded {} trusted keys from {}", keys.len(), url);

        Ok(Self {
            source: KeySource::Remote(RemoteJwks {
                url,
                ttl,
                client,
                cache: RwLock::new(CachedKeys {
                    keys: Arc::new(keys),
                    refresh_after: Instant::now() + ttl,
                    unknown_kid_refresh_after: Instant::now(),
                }),
            }),
        })
    }

    /// Get the current key set, refreshing a stale remote set first.
    #[allow(clippy::significant_drop_tightening)] // The write lock is held across the fetch on purpose
    pub async fn current(&self) -> Arc<TrustedKeys> {
        let remote = match &self.source {
            KeySource::Fixed(keys) => return Arc::clone(keys),
            KeySource::Remote(remote) => remote,
        };

        // Fast path: cached set is still fresh (read lock only)
        {
            let cache = remote.cache.read().await;
            if Instant::now() < cache.refresh_after {
                return Arc::clone(&cache.keys);
            }
        }

        // Slow path: refresh under the write lock
        let mut cache = remote.cache.write().await;

        // Double-check: another request may have refreshed while we waited
        if Instant::now() < cache.refresh_after {
            return Arc::clone(&cache.keys);
        }

        match fetch_jwks(&remote.client, &remote.url).await {
            Ok(keys) => {
                tracing::info!("Refreshed {} trusted keys from {}", keys.len(), remote.url);
                cache.keys = Arc::new(keys);
                cache.refresh_after = Instant::now() + remote.ttl;
            }
            Err(e) => {
                tracing::warn!("{e}; keeping previous key set");
                cache.refresh_after = Instant::now() + remote.ttl.min(RETRY_INTERVAL);
            }
        }

        Arc::clone(&cache.keys)
    }

    /// Refetch a remote key set that does not publish `kid`.
    ///
    /// Returns a key set that may now know `kid`, or `None` when there is
    /// nothing new to try: the source is fixed, an early refresh ran less than
    /// `UNKNOWN_KID_REFRESH_INTERVAL` ago, or the fetch failed.
    #[allow(clippy::significant_drop_tightening)] // The write lock is held across the fetch on purpose
    pub async fn refresh_for_unknown_kid(&self, kid: &str) -> Option<Arc<TrustedKeys>> {
        let KeySource::Remote(remote) = &self.source else {
            return None;
        };

        {
            let cache = remote.cache.read().await;
            if cache.keys.has_key(kid) {
                return Some(Arc::clone(&cache.keys));
            }
            if Instant::now() < cache.unknown_kid_refresh_after {
                return None;
            }
        }

        let mut cache = remote.cache.write().await;

        // Another request may have fetched the rotated set while we waited
        if cache.keys.has_key(kid) {
            return Some(Arc::clone(&cache.keys));
        }
        if Instant::now() < cache.unknown_kid_refresh_after {
            return None;
        }
        cache.unknown_kid_refresh_after = Instant::now() + UNKNOWN_KID_REFRESH_INTERVAL;

        match fetch_jwks(&remote.client, &remote.url).await {
            Ok(keys) => {
                tracing::info!(
                    "Refreshed {} trusted keys from {} for unknown kid '{kid}'",
                    keys.len(),
                    remote.url
                );
                cache.keys = Arc::new(keys);
                cache.refresh_after = Instant::now() + remote.ttl;
                Some(Arc::clone(&cache.keys))
            }
            Err(e) => {
                tracing::warn!("{e}; keeping previous key set");
                None
            }
        }
    }
}

async fn fetch_jwks(client: &reqwest::Client, url: &str) -> Result<TrustedKeys, KeyFetchError> {
    let jwks: JwkSet = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(TrustedKeys::from_jwks(jwks)?)
}
