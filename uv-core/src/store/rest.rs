use async_trait::async_trait;
use tracing::debug;

use crate::{Reading, StoreError, config::RemoteConfig, postgrest::RestClient};

use super::ReadingBackend;

const SELECT: &str =
    "city,timestamp,uv_index,uv_desc,temperature,feels_like,humidity,wind_speed,weather_desc";

/// Remote mirror holding exactly one row per city (merge-on-conflict by `city`).
#[derive(Debug, Clone)]
pub struct RestStore {
    client: RestClient,
    table: String,
}

impl RestStore {
    pub fn new(config: &RemoteConfig) -> Result<Self, StoreError> {
        Ok(Self { client: RestClient::new(config)?, table: config.table.clone() })
    }
}

#[async_trait]
impl ReadingBackend for RestStore {
    fn name(&self) -> &'static str {
        "postgrest"
    }

    async fn upsert(&self, reading: &Reading) -> Result<(), StoreError> {
        let request = self
            .client
            .post(&self.table)
            .query(&[("on_conflict", "city")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(reading);

        RestClient::send(request).await?;
        debug!(table = %self.table, city = %reading.city, "upserted remote reading");
        Ok(())
    }

    async fn latest(&self, city: Option<&str>) -> Result<Option<Reading>, StoreError> {
        let mut params = vec![
            ("select", SELECT.to_string()),
            ("order", "timestamp.desc".to_string()),
            ("limit", "1".to_string()),
        ];
        if let Some(city) = city {
            params.push(("city", format!("eq.{city}")));
        }

        let res = RestClient::send(self.client.get(&self.table).query(&params)).await?;
        let body = res.text().await?;
        let rows: Vec<Reading> = serde_json::from_str(&body)
            .map_err(|e| StoreError::Decode(format!("remote reading row: {e}")))?;

        Ok(rows.into_iter().next())
    }
}
