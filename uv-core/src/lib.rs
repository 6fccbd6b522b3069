//! Core library for the UV index pipeline.
//!
//! This crate defines:
//! - Configuration loading (TOML file + environment overrides)
//! - The Open-Meteo weather source with bounded retry
//! - Reading persistence (local sqlite primary, optional PostgREST replica)
//! - Location lookup, banner trigger evaluation and batch refresh
//!
//! It is used by `uv-cli` and `uv-api`.

pub mod banner;
pub mod batch;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod postgrest;
pub mod provider;
pub mod registry;
pub mod retry;
pub mod store;

#[cfg(test)]
mod test_support;

pub use banner::{BannerService, Comparator, TriggerResult};
pub use batch::{BatchRefresher, BatchReport, Outcome};
pub use config::Config;
pub use error::{StoreError, UvError};
pub use model::{Location, Reading, UvBand};
pub use pipeline::Pipeline;
pub use provider::{OpenMeteoProvider, WeatherSource};
pub use registry::LocationRegistry;
pub use store::{ReadingBackend, ReadingStore};
