//! Shared application state for all Axum handlers.

use std::sync::Arc;

use oss_watch_client::{RateClient, RateClientConfig};
use oss_watch_core::{Config, Result};
use oss_watch_store::{InMemoryStore, Store};

/// Shared state for all route handlers: the store, the upstream client, and
/// the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub client: Arc<RateClient>,
    pub config: Arc<Config>,
    /// Prometheus metrics, present only when built with the `metrics` feature.
    #[cfg(feature = "metrics")]
    pub metrics: Option<Arc<crate::metrics::RegistryMetrics>>,
}

impl AppState {
    /// Load configuration from the environment and build the store/client.
    pub async fn from_env() -> Result<Self> {
        let config = Config::from_env();
        let store = build_store(&config).await?;

        let client_config = RateClientConfig::default()
            .with_token(config.github_token.clone())
            .with_safety_floor(config.api_rate_limit_safety_threshold);
        let client = Arc::new(RateClient::with_config(client_config)?);

        #[cfg(feature = "metrics")]
        let metrics = crate::metrics::RegistryMetrics::new().map(Arc::new).ok();

        Ok(Self {
            store,
            client,
            config: Arc::new(config),
            #[cfg(feature = "metrics")]
            metrics,
        })
    }
}

#[cfg(feature = "postgres")]
async fn build_store(config: &Config) -> Result<Arc<dyn Store>> {
    match &config.database_url {
        Some(url) => Ok(Arc::new(oss_watch_store::PostgresStore::connect(url).await?)),
        None => Ok(Arc::new(InMemoryStore::new())),
    }
}

#[cfg(not(feature = "postgres"))]
async fn build_store(config: &Config) -> Result<Arc<dyn Store>> {
    if config.database_url.is_some() {
        return Err(oss_watch_core::Error::ValidationError(
            "OSS_WATCH_DATABASE_URL is set but this binary was built without the `postgres` feature".to_string(),
        ));
    }
    Ok(Arc::new(InMemoryStore::new()))
}
