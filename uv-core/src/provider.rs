use async_trait::async_trait;
use std::fmt::Debug;

use crate::{Config, Reading, UvError};

pub mod open_meteo;

pub use open_meteo::OpenMeteoProvider;

/// Source of fresh readings. Implementations talk to the network but never persist.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch(&self, location_name: &str, latitude: f64, longitude: f64)
    -> Result<Reading, UvError>;
}

/// Construct the configured weather source.
pub fn source_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherSource>> {
    let provider = OpenMeteoProvider::new(&config.provider, config.retry.policy())?;
    Ok(Box::new(provider))
}
