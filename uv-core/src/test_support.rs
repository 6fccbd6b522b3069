//! Fixtures shared by the unit tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::{
    collections::HashSet,
    sync::atomic::{AtomicI64, Ordering},
};

use crate::{Reading, UvBand, UvError, WeatherSource};

static CLOCK: AtomicI64 = AtomicI64::new(0);

/// Strictly increasing timestamps so "latest" is unambiguous.
fn next_timestamp() -> DateTime<Utc> {
    let tick = CLOCK.fetch_add(1, Ordering::SeqCst);
    Utc.with_ymd_and_hms(2025, 5, 1, 6, 0, 0).unwrap() + chrono::Duration::seconds(tick)
}

pub fn reading(city: &str, uv_index: f64) -> Reading {
    Reading {
        city: city.to_string(),
        timestamp: next_timestamp(),
        uv_index,
        uv_band: UvBand::classify(uv_index),
        temperature: 32.5,
        feels_like: 35.1,
        humidity: 38,
        wind_speed: 9.4,
        weather_desc: "Clear sky".to_string(),
    }
}

/// Weather source returning a fixed UV value and failing for chosen cities.
#[derive(Debug, Default)]
pub struct FakeSource {
    pub uv_index: f64,
    pub failing: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new(uv_index: f64) -> Self {
        Self { uv_index, ..Self::default() }
    }

    pub fn failing_for(mut self, city: &str) -> Self {
        self.failing.insert(city.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl WeatherSource for FakeSource {
    async fn fetch(&self, location_name: &str, _lat: f64, _lon: f64) -> Result<Reading, UvError> {
        self.calls.lock().push(location_name.to_string());
        if self.failing.contains(location_name) {
            return Err(UvError::Upstream {
                attempts: 3,
                source: anyhow::anyhow!("connection refused"),
            });
        }
        Ok(reading(location_name, self.uv_index))
    }
}
