//! Shared setup: load `Config`, build the `Store`/`RateClient` the
//! subcommands operate on.

use std::sync::Arc;

use oss_watch_client::{RateClient, RateClientConfig};
use oss_watch_core::{Config, Result};
use oss_watch_store::{InMemoryStore, Store};

/// The store/client/config triple every subcommand needs.
pub struct App {
    pub store: Arc<dyn Store>,
    pub client: Arc<RateClient>,
    pub config: Config,
}

impl App {
    /// Load configuration from the environment and build the store/client.
    pub async fn from_env() -> Result<Self> {
        let config = Config::from_env();
        let store = build_store(&config).await?;

        let client_config = RateClientConfig::default()
            .with_token(config.github_token.clone())
            .with_safety_floor(config.api_rate_limit_safety_threshold);
        let client = Arc::new(RateClient::with_config(client_config)?);

        Ok(Self {
            store,
            client,
            config,
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
