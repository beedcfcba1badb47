// Forbid unwrap() in production code to prevent panics from bad configuration.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::sync::Arc;

use coffee_shop::api;
use coffee_shop::auth::{Authenticator, KeyProvider, TokenVerifier, TrustedKeys, VerifierSettings};
use coffee_shop::config::{KeySourceConfig, ServerConfig};
use coffee_shop::store::{DrinkStore, MemoryStore, SqliteStore};
use coffee_shop::time::SystemClock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coffee_shop=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: issuer={}, audience={}, listen_addr={}",
        config.issuer,
        config.audience,
        config.socket_addr()
    );

    let keys = load_key_provider(config.key_source.clone()).await;
    let verifier = TokenVerifier::new(
        VerifierSettings {
            audience: config.audience.clone(),
            issuer: config.issuer.clone(),
        },
        Arc::new(SystemClock),
    );
    let authenticator = Arc::new(Authenticator::new(keys, verifier));

    let store: Arc<dyn DrinkStore> = match &config.database_url {
        Some(url) => match SqliteStore::connect(url).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!("Failed to open drink database: {e}");
                std::process::exit(1);
            }
        },
        None => {
            tracing::info!("No database configured; drinks are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let app = api::router(store, authenticator);

    let addr = config.socket_addr();
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}

/// Build the key provider for the configured source, exiting on failure.
async fn load_key_provider(source: KeySourceConfig) -> KeyProvider {
    let keys = match source {
        KeySourceConfig::Secret(secret) => TrustedKeys::new_hs256(secret).map(KeyProvider::fixed),
        KeySourceConfig::PublicKey(pem) => TrustedKeys::new_rs256(pem).map(KeyProvider::fixed),
        KeySourceConfig::Jwks { url, ttl } => {
            return KeyProvider::remote(url, ttl).await.unwrap_or_else(|e| {
                tracing::error!("Failed to load trusted keys: {e}");
                std::process::exit(1);
            });
        }
    };

    keys.unwrap_or_else(|e| {
        tracing::error!("Invalid key configuration: {e}");
        std::process::exit(1);
    })
}
