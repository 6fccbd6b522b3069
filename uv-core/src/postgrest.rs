//! Thin PostgREST (Supabase REST) client shared by the remote store and registry.

use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

use crate::{
    config::RemoteConfig,
    error::{StoreError, truncate_body},
};

#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl RestClient {
    pub fn new(config: &RemoteConfig) -> Result<Self, StoreError> {
        let http = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    pub fn get(&self, table: &str) -> RequestBuilder {
        self.authorized(self.http.get(self.table_url(table)))
    }

    pub fn post(&self, table: &str) -> RequestBuilder {
        self.authorized(self.http.post(self.table_url(table)))
    }

    /// Send the request and turn non-2xx statuses into [`StoreError::Status`].
    pub async fn send(builder: RequestBuilder) -> Result<Response, StoreError> {
        let res = builder.send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = res.text().await.unwrap_or_default();
        Err(StoreError::Status { status: status.as_u16(), body: truncate_body(&body) })
    }
}
