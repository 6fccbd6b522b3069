//! Reading persistence: a mandatory local store plus an optional remote replica.
//!
//! Writes always land in the primary and are mirrored to the replica on a
//! best-effort basis. Reads prefer the replica and fall back to the primary
//! whenever the replica errors or has nothing for the key.

use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};
use tracing::{debug, instrument, warn};

use crate::{Config, Reading, StoreError, UvError};

#[cfg(test)]
mod memory;
pub mod rest;
pub mod sqlite;

pub use rest::RestStore;
pub use sqlite::SqliteStore;

/// Storage capability shared by every reading backend.
#[async_trait]
pub trait ReadingBackend: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Persist `reading` under its `city` key.
    async fn upsert(&self, reading: &Reading) -> Result<(), StoreError>;

    /// Most recent reading for `city`, or across all cities when `None`.
    async fn latest(&self, city: Option<&str>) -> Result<Option<Reading>, StoreError>;
}

/// Primary/replica coordinator.
#[derive(Debug, Clone)]
pub struct ReadingStore {
    primary: Arc<dyn ReadingBackend>,
    replica: Option<Arc<dyn ReadingBackend>>,
}

impl ReadingStore {
    pub fn new(primary: Arc<dyn ReadingBackend>) -> Self {
        Self { primary, replica: None }
    }

    pub fn with_replica(mut self, replica: Arc<dyn ReadingBackend>) -> Self {
        self.replica = Some(replica);
        self
    }

    /// Local sqlite primary, plus the REST replica when one is configured.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let path = config.db_path()?;
        let primary = SqliteStore::open(&path)?;
        let mut store = Self::new(Arc::new(primary));

        if let Some(remote) = config.remote() {
            store = store.with_replica(Arc::new(RestStore::new(remote)?));
        }

        Ok(store)
    }

    pub fn has_replica(&self) -> bool {
        self.replica.is_some()
    }

    #[instrument(skip(self, reading), fields(city = %reading.city))]
    pub async fn upsert(&self, reading: &Reading) -> Result<(), UvError> {
        self.primary.upsert(reading).await?;

        if let Some(replica) = &self.replica {
            match replica.upsert(reading).await {
                Ok(()) => debug!(backend = replica.name(), "mirrored reading"),
                Err(err) => warn!(backend = replica.name(), error = %err, "replica write failed"),
            }
        }

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn latest(&self, city: Option<&str>) -> Result<Option<Reading>, UvError> {
        if let Some(replica) = &self.replica {
            match replica.latest(city).await {
                Ok(Some(reading)) => return Ok(Some(reading)),
                Ok(None) => debug!(backend = replica.name(), "replica empty, reading primary"),
                Err(err) => {
                    warn!(backend = replica.name(), error = %err, "replica read failed, falling back")
                }
            }
        }

        Ok(self.primary.latest(city).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::reading;
    use super::memory::MemoryStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Replica that fails every call.
    #[derive(Debug, Default)]
    struct BrokenBackend {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ReadingBackend for BrokenBackend {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn upsert(&self, _reading: &Reading) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Status { status: 503, body: "down".into() })
        }

        async fn latest(&self, _city: Option<&str>) -> Result<Option<Reading>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Status { status: 503, body: "down".into() })
        }
    }

    fn local() -> Arc<SqliteStore> {
        Arc::new(SqliteStore::open_in_memory().unwrap())
    }

    #[tokio::test]
    async fn replica_write_failure_is_not_fatal() {
        let primary = local();
        let replica = Arc::new(BrokenBackend::default());
        let store = ReadingStore::new(primary.clone()).with_replica(replica.clone());

        store.upsert(&reading("Delhi", 6.0)).await.expect("local write must succeed");

        assert_eq!(replica.calls.load(Ordering::SeqCst), 1);
        assert_eq!(primary.history("Delhi").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn replica_read_failure_falls_back_to_primary() {
        let primary = local();
        primary.upsert(&reading("Delhi", 4.5)).await.unwrap();
        let store =
            ReadingStore::new(primary).with_replica(Arc::new(BrokenBackend::default()));

        let latest = store.latest(Some("Delhi")).await.unwrap().expect("fallback reading");
        assert_eq!(latest.uv_index, 4.5);
    }

    #[tokio::test]
    async fn absent_is_distinct_from_zero_reading() {
        let store = ReadingStore::new(local()).with_replica(Arc::new(MemoryStore::new()));
        assert!(store.latest(Some("Delhi")).await.unwrap().is_none());

        store.upsert(&reading("Delhi", 0.0)).await.unwrap();
        let latest = store.latest(Some("Delhi")).await.unwrap();
        assert_eq!(latest.map(|r| r.uv_index), Some(0.0));
    }

    #[tokio::test]
    async fn reads_prefer_replica() {
        let primary = local();
        primary.upsert(&reading("Goa", 1.0)).await.unwrap();
        let replica = Arc::new(MemoryStore::new());
        replica.upsert(&reading("Goa", 9.0)).await.unwrap();

        let store = ReadingStore::new(primary).with_replica(replica);
        let latest = store.latest(Some("Goa")).await.unwrap().unwrap();
        assert_eq!(latest.uv_index, 9.0);
    }

    #[tokio::test]
    async fn empty_replica_falls_back_to_primary() {
        let primary = local();
        primary.upsert(&reading("Pune", 3.0)).await.unwrap();
        let store = ReadingStore::new(primary).with_replica(Arc::new(MemoryStore::new()));

        let latest = store.latest(Some("Pune")).await.unwrap().unwrap();
        assert_eq!(latest.uv_index, 3.0);
    }

    #[tokio::test]
    async fn replica_converges_while_primary_appends() {
        let primary = local();
        let replica = Arc::new(MemoryStore::new());
        let store = ReadingStore::new(primary.clone()).with_replica(replica.clone());

        for uv in [2.0, 5.0, 8.0] {
            store.upsert(&reading("Delhi", uv)).await.unwrap();
        }

        assert_eq!(replica.len(), 1);
        assert_eq!(replica.latest(Some("Delhi")).await.unwrap().unwrap().uv_index, 8.0);
        assert_eq!(primary.history("Delhi").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn local_failure_propagates() {
        let store = ReadingStore::new(Arc::new(BrokenBackend::default()));
        let err = store.upsert(&reading("Delhi", 1.0)).await.unwrap_err();
        assert!(matches!(err, UvError::Storage(_)));
    }
}
