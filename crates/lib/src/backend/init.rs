//! Turning a [`BackendConfig`] into a live repository.

use std::sync::Arc;

use super::config::{BackendConfig, Driver, ResolvedConfig};
use super::database::InMemory;
use super::SharedRepository;
use crate::Result;

/// Builds a repository from configuration.
///
/// Initialization is a single attempt: resolve the configuration, pick the
/// driver, connect and prepare the schema. There is no retry; the caller
/// decides what a failure means.
#[derive(Debug, Clone)]
pub struct BackendInitializer {
    config: BackendConfig,
}

impl BackendInitializer {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    /// The unresolved configuration this initializer was built from.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Resolve the configuration and connect the selected driver.
    pub async fn init(&self) -> Result<SharedRepository> {
        let resolved = self.config.resolve().await?;
        tracing::info!(
            driver = %resolved.driver,
            url = %resolved.display_url(),
            pool_size = resolved.pool_size,
            "Initializing user directory backend"
        );

        let repository = match resolved.driver {
            Driver::Memory => open_memory(&resolved).await?,
            Driver::Sqlite | Driver::Postgres | Driver::Any => open_sql(&resolved).await?,
        };

        tracing::info!(backend = repository.backend_name(), "User directory backend ready");
        Ok(repository)
    }
}

async fn open_memory(resolved: &ResolvedConfig) -> Result<SharedRepository> {
    match resolved.url.strip_prefix("file:") {
        Some(path) => Ok(Arc::new(InMemory::open_file(path).await?)),
        None => Ok(Arc::new(InMemory::new())),
    }
}

#[cfg(any(feature = "sqlite", feature = "postgres"))]
async fn open_sql(resolved: &ResolvedConfig) -> Result<SharedRepository> {
    let backend = super::database::SqlxBackend::connect(resolved).await?;
    Ok(Arc::new(backend))
}

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
async fn open_sql(resolved: &ResolvedConfig) -> Result<SharedRepository> {
    Err(super::BackendError::DriverNotEnabled {
        driver: resolved.driver.to_string(),
        feature: "sqlite",
    }
    .into())
}
