use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Severity band derived from the numeric UV index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UvBand {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
    Extreme,
}

impl UvBand {
    /// Buckets are closed on the upper bound: 2.0 is still Low, 2.01 is Moderate.
    pub fn classify(uv_index: f64) -> Self {
        if uv_index <= 2.0 {
            UvBand::Low
        } else if uv_index <= 5.0 {
            UvBand::Moderate
        } else if uv_index <= 7.0 {
            UvBand::High
        } else if uv_index <= 10.0 {
            UvBand::VeryHigh
        } else {
            UvBand::Extreme
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UvBand::Low => "Low",
            UvBand::Moderate => "Moderate",
            UvBand::High => "High",
            UvBand::VeryHigh => "Very High",
            UvBand::Extreme => "Extreme",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "Low" => Some(UvBand::Low),
            "Moderate" => Some(UvBand::Moderate),
            "High" => Some(UvBand::High),
            "Very High" => Some(UvBand::VeryHigh),
            "Extreme" => Some(UvBand::Extreme),
            _ => None,
        }
    }
}

impl fmt::Display for UvBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One UV/weather observation for one location.
///
/// Field names match the persisted row layout (both local and remote), so the
/// struct serializes straight into a storage row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Canonical location name; the natural key of the remote store.
    pub city: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub uv_index: f64,
    #[serde(rename = "uv_desc")]
    pub uv_band: UvBand,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub weather_desc: String,
}

/// Parses an RFC 3339 timestamp, or a zone-less ISO 8601 one (read as UTC) as
/// written by older tooling.
pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(ts) => Ok(ts.with_timezone(&Utc)),
        Err(err) => NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|_| err),
    }
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .map_err(|e| serde::de::Error::custom(format!("timestamp '{raw}': {e}")))
}

/// A named place the pipeline can fetch readings for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self { name: name.into(), latitude, longitude, active: true }
    }
}

/// WMO weather interpretation codes as reported by Open-Meteo.
const WEATHER_CODES: &[(i64, &str)] = &[
    (0, "Clear sky"),
    (1, "Mainly clear"),
    (2, "Partly cloudy"),
    (3, "Overcast"),
    (45, "Foggy"),
    (48, "Rime fog"),
    (51, "Light drizzle"),
    (53, "Moderate drizzle"),
    (55, "Dense drizzle"),
    (61, "Slight rain"),
    (63, "Moderate rain"),
    (65, "Heavy rain"),
    (71, "Slight snow"),
    (73, "Moderate snow"),
    (75, "Heavy snow"),
    (80, "Slight rain showers"),
    (81, "Moderate rain showers"),
    (82, "Violent rain showers"),
    (85, "Slight snow showers"),
    (86, "Heavy snow showers"),
    (95, "Thunderstorm"),
    (96, "Thunderstorm with hail"),
    (99, "Thunderstorm with heavy hail"),
];

pub fn weather_description(code: Option<i64>) -> &'static str {
    code.and_then(|code| WEATHER_CODES.iter().find(|(c, _)| *c == code))
        .map(|(_, desc)| *desc)
        .unwrap_or("Unknown")
}
