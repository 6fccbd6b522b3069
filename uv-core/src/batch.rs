//! Unattended refresh of one or all active locations.

use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

use crate::{Location, Pipeline, Reading, UvError};

#[derive(Debug)]
pub enum Outcome {
    Refreshed(Reading),
    Failed { city: String, error: UvError },
}

impl Outcome {
    pub fn city(&self) -> &str {
        match self {
            Outcome::Refreshed(reading) => &reading.city,
            Outcome::Failed { city, .. } => city,
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<Outcome>,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o, Outcome::Refreshed(_))).count()
    }

    pub fn failed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Failed { .. }))
            .map(Outcome::city)
            .collect()
    }

    /// A run fails only when nothing was refreshed (an empty batch included).
    pub fn all_failed(&self) -> bool {
        self.success_count() == 0
    }
}

#[derive(Debug, Clone)]
pub struct BatchRefresher {
    pipeline: Arc<Pipeline>,
    delay: Duration,
}

impl BatchRefresher {
    pub fn new(pipeline: Arc<Pipeline>, delay: Duration) -> Self {
        Self { pipeline, delay }
    }

    /// Refresh `city` alone, or every active location when `None`.
    ///
    /// Locations are processed sequentially with `delay` between upstream calls.
    /// Per-location failures are collected, never propagated; only failing to
    /// list the active set is an error.
    pub async fn run(&self, city: Option<&str>) -> Result<BatchReport, UvError> {
        let mut report = BatchReport::default();

        let locations = match city {
            Some(name) => match self.pipeline.registry.resolve(name).await {
                Ok(location) => vec![location],
                Err(error) => {
                    warn!(city = name, error = %error, "cannot resolve location");
                    report.outcomes.push(Outcome::Failed { city: name.trim().to_string(), error });
                    return Ok(report);
                }
            },
            None => self.pipeline.registry.list_active().await?,
        };

        info!(count = locations.len(), "refreshing locations");

        for (i, location) in locations.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            report.outcomes.push(self.refresh_one(location).await);
        }

        info!(
            refreshed = report.success_count(),
            failed = report.outcomes.len() - report.success_count(),
            "batch finished"
        );
        Ok(report)
    }

    async fn refresh_one(&self, location: &Location) -> Outcome {
        match self.pipeline.fetch_and_store(location).await {
            Ok(reading) => {
                info!(city = %reading.city, uv_index = reading.uv_index, band = %reading.uv_band, "refreshed");
                Outcome::Refreshed(reading)
            }
            Err(error) => {
                warn!(city = %location.name, error = %error, "refresh failed");
                Outcome::Failed { city: location.name.clone(), error }
            }
        }
    }
}
