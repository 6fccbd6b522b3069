use std::sync::Arc;
use tracing::info;

use crate::{Config, Location, LocationRegistry, Reading, ReadingStore, UvError, WeatherSource};

/// The three collaborators every entry point needs, wired once at startup.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub registry: Arc<LocationRegistry>,
    pub source: Arc<dyn WeatherSource>,
    pub store: Arc<ReadingStore>,
}

impl Pipeline {
    pub fn new(
        registry: LocationRegistry,
        source: Arc<dyn WeatherSource>,
        store: ReadingStore,
    ) -> Self {
        Self { registry: Arc::new(registry), source, store: Arc::new(store) }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let registry = LocationRegistry::from_config(config)?;
        let source: Arc<dyn WeatherSource> = crate::provider::source_from_config(config)?.into();
        let store = ReadingStore::from_config(config)?;

        info!(
            registry = ?config.registry.source,
            replica = store.has_replica(),
            "pipeline ready"
        );
        Ok(Self::new(registry, source, store))
    }

    /// Fetch a fresh reading for `location` and persist it.
    pub async fn fetch_and_store(&self, location: &Location) -> Result<Reading, UvError> {
        let reading =
            self.source.fetch(&location.name, location.latitude, location.longitude).await?;
        self.store.upsert(&reading).await?;
        Ok(reading)
    }
}
