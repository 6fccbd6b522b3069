//! Threshold trigger evaluation for the UV banner.

use serde::Serialize;
use std::{fmt, str::FromStr, sync::Arc};
use tracing::{debug, instrument};

use crate::{Pipeline, Reading, UvError, registry::canonical_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    Gte,
    Gt,
    Lte,
    Lt,
    Eq,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Gte => "gte",
            Comparator::Gt => "gt",
            Comparator::Lte => "lte",
            Comparator::Lt => "lt",
            Comparator::Eq => "eq",
        }
    }

    pub fn matches(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::Gte => value >= threshold,
            Comparator::Gt => value > threshold,
            Comparator::Lte => value <= threshold,
            Comparator::Lt => value < threshold,
            Comparator::Eq => value == threshold,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Comparator {
    type Err = UvError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "gte" => Ok(Comparator::Gte),
            "gt" => Ok(Comparator::Gt),
            "lte" => Ok(Comparator::Lte),
            "lt" => Ok(Comparator::Lt),
            "eq" => Ok(Comparator::Eq),
            _ => Err(UvError::BadRequest("Invalid op. Use one of: gte, gt, lte, lt, eq".into())),
        }
    }
}

pub fn parse_threshold(value: &str) -> Result<f64, UvError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
        .ok_or_else(|| UvError::BadRequest("Invalid threshold. Use number, e.g. threshold=6".into()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerResult {
    pub reading: Reading,
    pub comparator: Comparator,
    pub threshold: f64,
    pub matched: bool,
}

/// Read-through cache in front of the weather source.
#[derive(Debug, Clone)]
pub struct BannerService {
    pipeline: Arc<Pipeline>,
}

impl BannerService {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    /// Evaluate `comparator(uv_index, threshold)` for `city`.
    ///
    /// With `force_fresh` the provider is always queried and the result stored.
    /// Otherwise the stored reading is used as-is; a miss triggers a fetch-and-store.
    #[instrument(skip(self))]
    pub async fn evaluate(
        &self,
        city: &str,
        threshold: f64,
        comparator: Comparator,
        force_fresh: bool,
    ) -> Result<TriggerResult, UvError> {
        if !threshold.is_finite() {
            return Err(UvError::BadRequest(
                "Invalid threshold. Use number, e.g. threshold=6".into(),
            ));
        }

        let reading = if force_fresh {
            self.refresh(city).await?
        } else {
            match self.pipeline.store.latest(Some(&canonical_name(city))).await? {
                Some(cached) => {
                    debug!(timestamp = %cached.timestamp, "serving cached reading");
                    cached
                }
                None => self.refresh(city).await?,
            }
        };

        let matched = comparator.matches(reading.uv_index, threshold);
        Ok(TriggerResult { reading, comparator, threshold, matched })
    }

    async fn refresh(&self, city: &str) -> Result<Reading, UvError> {
        let location = self.pipeline.registry.resolve(city).await?;
        self.pipeline.fetch_and_store(&location).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        LocationRegistry, ReadingStore,
        registry::StaticRegistry,
        store::{ReadingBackend, SqliteStore},
        test_support::{FakeSource, reading},
    };

    struct Harness {
        service: BannerService,
        source: Arc<FakeSource>,
        local: Arc<SqliteStore>,
    }

    fn harness(source: FakeSource) -> Harness {
        let source = Arc::new(source);
        let local = Arc::new(SqliteStore::open_in_memory().unwrap());
        let pipeline = Pipeline::new(
            LocationRegistry::Static(StaticRegistry::default()),
            source.clone(),
            ReadingStore::new(local.clone()),
        );
        Harness { service: BannerService::new(Arc::new(pipeline)), source, local }
    }

    #[test]
    fn comparator_parsing() {
        assert_eq!("GTE".parse::<Comparator>().unwrap(), Comparator::Gte);
        assert_eq!("lt".parse::<Comparator>().unwrap(), Comparator::Lt);
        assert!(matches!("between".parse::<Comparator>(), Err(UvError::BadRequest(_))));
    }

    #[test]
    fn threshold_parsing() {
        assert_eq!(parse_threshold("6").unwrap(), 6.0);
        assert_eq!(parse_threshold(" 5.5 ").unwrap(), 5.5);
        assert!(parse_threshold("six").is_err());
        assert!(parse_threshold("NaN").is_err());
        assert!(parse_threshold("inf").is_err());
    }

    #[test]
    fn trigger_predicates() {
        assert!(Comparator::Gte.matches(6.0, 6.0));
        assert!(!Comparator::Gte.matches(5.99, 6.0));
        assert!(Comparator::Eq.matches(6.0, 6.0));
        assert!(!Comparator::Gt.matches(6.0, 6.0));
        assert!(Comparator::Lte.matches(6.0, 6.0));
        assert!(Comparator::Lt.matches(5.99, 6.0));
    }

    #[tokio::test]
    async fn cached_reading_needs_no_fetch() {
        let h = harness(FakeSource::new(9.0));
        h.local.upsert(&reading("Delhi", 6.0)).await.unwrap();

        let result = h.service.evaluate("delhi", 6.0, Comparator::Gte, false).await.unwrap();

        assert!(result.matched);
        assert_eq!(result.reading.uv_index, 6.0);
        assert_eq!(h.source.call_count(), 0);
        assert_eq!(h.local.history("Delhi").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fresh_always_fetches_and_stores() {
        let h = harness(FakeSource::new(5.99));
        h.local.upsert(&reading("Delhi", 8.0)).await.unwrap();

        let result = h.service.evaluate("Delhi", 6.0, Comparator::Gte, true).await.unwrap();

        assert!(!result.matched);
        assert_eq!(result.reading.uv_index, 5.99);
        assert_eq!(h.source.call_count(), 1);
        assert_eq!(h.local.history("Delhi").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn cache_miss_fetches_and_fills() {
        let h = harness(FakeSource::new(6.0));

        let result = h.service.evaluate("Mumbai", 6.0, Comparator::Eq, false).await.unwrap();

        assert!(result.matched);
        assert_eq!(result.reading.city, "Mumbai");
        assert_eq!(h.source.call_count(), 1);
        assert_eq!(h.local.history("Mumbai").await.unwrap().len(), 1);

        h.service.evaluate("Mumbai", 6.0, Comparator::Eq, false).await.unwrap();
        assert_eq!(h.source.call_count(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_stores_nothing() {
        let h = harness(FakeSource::new(6.0).failing_for("Goa"));

        let err = h.service.evaluate("Goa", 6.0, Comparator::Gte, true).await.unwrap_err();

        assert!(matches!(err, UvError::Upstream { .. }));
        assert!(h.local.history("Goa").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_city_is_client_error() {
        let h = harness(FakeSource::new(6.0));
        let err = h.service.evaluate("Atlantis", 6.0, Comparator::Gte, false).await.unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(h.source.call_count(), 0);
    }

    #[tokio::test]
    async fn non_finite_threshold_is_rejected() {
        let h = harness(FakeSource::new(6.0));
        let err = h.service.evaluate("Delhi", f64::NAN, Comparator::Gte, false).await.unwrap_err();
        assert!(matches!(err, UvError::BadRequest(_)));
    }
}
