use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    Reading, UvBand, UvError,
    config::ProviderConfig,
    error::truncate_body,
    model::weather_description,
    retry::{Failure, RetryPolicy, retry},
};

use super::WeatherSource;

const CURRENT_FIELDS: &str =
    "uv_index,temperature_2m,relative_humidity_2m,weather_code,wind_speed_10m,apparent_temperature";

/// Open-Meteo forecast client (no API key required).
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
    base_url: String,
    timezone: String,
    policy: RetryPolicy,
}

impl OpenMeteoProvider {
    pub fn new(config: &ProviderConfig, policy: RetryPolicy) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build Open-Meteo HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timezone: config.timezone.clone(),
            policy,
        })
    }

    async fn fetch_once(
        &self,
        location_name: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Reading, Failure> {
        let url = format!("{}/forecast", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("timezone", self.timezone.clone()),
            ])
            .send()
            .await
            .context("Failed to send request to Open-Meteo")
            .map_err(Failure::Transient)?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read Open-Meteo response body")
            .map_err(Failure::Transient)?;

        if !status.is_success() {
            let err = anyhow!(
                "Open-Meteo request failed with status {}: {}",
                status,
                truncate_body(&body)
            );
            return Err(if is_retryable_status(status) {
                Failure::Transient(err)
            } else {
                Failure::Permanent(err)
            });
        }

        let parsed: OmResponse = serde_json::from_str(&body)
            .context("Failed to parse Open-Meteo JSON")
            .map_err(Failure::Permanent)?;

        to_reading(location_name, parsed.current).map_err(Failure::Permanent)
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

fn to_reading(location_name: &str, current: OmCurrent) -> anyhow::Result<Reading> {
    if !current.uv_index.is_finite() || current.uv_index < 0.0 {
        return Err(anyhow!("Open-Meteo returned invalid uv_index {}", current.uv_index));
    }

    Ok(Reading {
        city: location_name.to_string(),
        timestamp: Utc::now(),
        uv_index: current.uv_index,
        uv_band: UvBand::classify(current.uv_index),
        temperature: current.temperature_2m,
        feels_like: current.apparent_temperature,
        humidity: current.relative_humidity_2m,
        wind_speed: current.wind_speed_10m,
        weather_desc: weather_description(current.weather_code).to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    uv_index: f64,
    temperature_2m: f64,
    apparent_temperature: f64,
    relative_humidity_2m: u8,
    wind_speed_10m: f64,
    weather_code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    current: OmCurrent,
}

#[async_trait]
impl WeatherSource for OpenMeteoProvider {
    #[instrument(skip(self), fields(provider = "open-meteo"))]
    async fn fetch(
        &self,
        location_name: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Reading, UvError> {
        let reading = retry(&self.policy, move |attempt| {
            debug!(attempt, "requesting current conditions");
            self.fetch_once(location_name, latitude, longitude)
        })
        .await?;

        debug!(uv_index = reading.uv_index, band = %reading.uv_band, "fetched reading");
        Ok(reading)
    }
}
