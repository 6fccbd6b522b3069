//! Local append-only history of readings.

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::{fs, path::Path, sync::Arc};
use tokio::task;
use tracing::debug;

use crate::{Reading, StoreError, UvBand, model::parse_timestamp};

use super::ReadingBackend;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS uv_index (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp    TEXT NOT NULL,
        city         TEXT NOT NULL,
        uv_index     REAL,
        uv_desc      TEXT,
        temperature  REAL,
        feels_like   REAL,
        humidity     INTEGER,
        wind_speed   REAL,
        weather_desc TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_uv_index_city ON uv_index (city, id);
";

const COLUMNS: &str =
    "timestamp, city, uv_index, uv_desc, temperature, feels_like, humidity, wind_speed, weather_desc";

/// File-backed sqlite store. Every upsert appends a row; nothing is updated in place.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// All readings for `city`, oldest first.
    pub async fn history(&self, city: &str) -> Result<Vec<Reading>, StoreError> {
        let conn = Arc::clone(&self.conn);
        let city = city.to_string();

        task::spawn_blocking(move || {
            let conn = conn.lock();
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM uv_index WHERE city = ?1 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map([&city], row_to_raw)?;

            let mut readings = Vec::new();
            for row in rows {
                readings.push(row?.into_reading()?);
            }
            Ok(readings)
        })
        .await?
    }
}

#[async_trait]
impl ReadingBackend for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn upsert(&self, reading: &Reading) -> Result<(), StoreError> {
        let conn = Arc::clone(&self.conn);
        let reading = reading.clone();

        task::spawn_blocking(move || {
            let conn = conn.lock();
            conn.execute(
                &format!("INSERT INTO uv_index ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
                params![
                    reading.timestamp.to_rfc3339(),
                    reading.city,
                    reading.uv_index,
                    reading.uv_band.as_str(),
                    reading.temperature,
                    reading.feels_like,
                    reading.humidity,
                    reading.wind_speed,
                    reading.weather_desc,
                ],
            )?;
            debug!(id = conn.last_insert_rowid(), city = %reading.city, "inserted reading");
            Ok(())
        })
        .await?
    }

    async fn latest(&self, city: Option<&str>) -> Result<Option<Reading>, StoreError> {
        let conn = Arc::clone(&self.conn);
        let city = city.map(str::to_string);

        task::spawn_blocking(move || {
            let conn = conn.lock();
            let raw = match &city {
                Some(city) => conn
                    .query_row(
                        &format!(
                            "SELECT {COLUMNS} FROM uv_index WHERE city = ?1 ORDER BY id DESC LIMIT 1"
                        ),
                        [city],
                        row_to_raw,
                    )
                    .optional()?,
                None => conn
                    .query_row(
                        &format!("SELECT {COLUMNS} FROM uv_index ORDER BY id DESC LIMIT 1"),
                        [],
                        row_to_raw,
                    )
                    .optional()?,
            };

            raw.map(RawRow::into_reading).transpose()
        })
        .await?
    }
}

/// Row as stored; text columns are validated after the query.
struct RawRow {
    timestamp: String,
    city: String,
    uv_index: f64,
    uv_desc: Option<String>,
    temperature: f64,
    feels_like: f64,
    humidity: u8,
    wind_speed: f64,
    weather_desc: Option<String>,
}

fn row_to_raw(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        timestamp: row.get(0)?,
        city: row.get(1)?,
        uv_index: row.get(2)?,
        uv_desc: row.get(3)?,
        temperature: row.get(4)?,
        feels_like: row.get(5)?,
        humidity: row.get(6)?,
        wind_speed: row.get(7)?,
        weather_desc: row.get(8)?,
    })
}

impl RawRow {
    fn into_reading(self) -> Result<Reading, StoreError> {
        let timestamp = parse_timestamp(&self.timestamp)
            .map_err(|e| StoreError::Decode(format!("timestamp '{}': {e}", self.timestamp)))?;

        // Rows written by older tooling may lack a band; derive it from the value.
        let uv_band = self
            .uv_desc
            .as_deref()
            .and_then(UvBand::parse)
            .unwrap_or_else(|| UvBand::classify(self.uv_index));

        Ok(Reading {
            city: self.city,
            timestamp,
            uv_index: self.uv_index,
            uv_band,
            temperature: self.temperature,
            feels_like: self.feels_like,
            humidity: self.humidity,
            wind_speed: self.wind_speed,
            weather_desc: self.weather_desc.unwrap_or_else(|| "Unknown".to_string()),
        })
    }
}
