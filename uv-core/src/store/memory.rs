use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::{Reading, StoreError};

use super::ReadingBackend;

/// In-process latest-per-city store with the same merge-on-conflict semantics as
/// the remote mirror; stands in for it as a replica.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<String, Reading>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }
}

#[async_trait]
impl ReadingBackend for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn upsert(&self, reading: &Reading) -> Result<(), StoreError> {
        self.rows.write().insert(reading.city.clone(), reading.clone());
        Ok(())
    }

    async fn latest(&self, city: Option<&str>) -> Result<Option<Reading>, StoreError> {
        let rows = self.rows.read();
        let found = match city {
            Some(city) => rows.get(city),
            None => rows.values().max_by_key(|r| r.timestamp),
        };
        Ok(found.cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::reading;

    #[tokio::test]
    async fn repeated_upserts_keep_one_row_per_city() {
        let store = MemoryStore::new();
        store.upsert(&reading("Delhi", 1.0)).await.unwrap();
        store.upsert(&reading("Delhi", 4.0)).await.unwrap();
        store.upsert(&reading("Agra", 2.0)).await.unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.latest(Some("Delhi")).await.unwrap().unwrap().uv_index, 4.0);
        assert_eq!(store.latest(None).await.unwrap().unwrap().city, "Agra");
    }
}
