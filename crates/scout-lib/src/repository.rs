//! Listing repository
//!
//! Holds the canonical listing set as an immutable `Snapshot`. A refresh
//! replaces the snapshot wholesale; readers keep whatever `Arc<Snapshot>`
//! they already hold. Each refresh gets a generation number and aborts the
//! one still in flight, so only the newest request can publish.

use crate::error::{Result, ScoutError};
use crate::feed::ListingSource;
use crate::filter::{compute_bounds, Bounds};
use crate::models::Listing;
use crate::observability::{EventLogger, ScoutMetrics};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::task::AbortHandle;

/// One loaded dataset together with its derived bounds
#[derive(Debug, Clone)]
pub struct Snapshot {
    listings: Vec<Arc<Listing>>,
    bounds: Bounds,
    generation: u64,
    source: String,
    loaded_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// The state before anything was loaded
    pub fn empty() -> Self {
        Self {
            listings: Vec::new(),
            bounds: Bounds::default(),
            generation: 0,
            source: String::new(),
            loaded_at: None,
        }
    }

    /// Build a snapshot, computing bounds once for the whole set
    pub fn new(listings: Vec<Listing>, generation: u64, source: impl Into<String>) -> Self {
        let listings: Vec<Arc<Listing>> = listings.into_iter().map(Arc::new).collect();
        let bounds = compute_bounds(&listings);

        Self {
            listings,
            bounds,
            generation,
            source: source.into(),
            loaded_at: Some(Utc::now()),
        }
    }

    pub fn listings(&self) -> &[Arc<Listing>] {
        &self.listings
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

/// Owner of the current snapshot
pub struct ListingRepository {
    current: RwLock<Arc<Snapshot>>,
    generation: AtomicU64,
    in_flight: Mutex<Option<AbortHandle>>,
    logger: EventLogger,
    metrics: ScoutMetrics,
}

impl ListingRepository {
    pub fn new(logger: EventLogger, metrics: ScoutMetrics) -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::empty())),
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(None),
            logger,
            metrics,
        }
    }

    /// The latest published snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publish an already loaded listing set
    pub fn replace(&self, listings: Vec<Listing>, source: &str) -> Arc<Snapshot> {
        let generation = self.next_generation();
        self.install(Snapshot::new(listings, generation, source))
            .unwrap_or_else(|| self.snapshot())
    }

    /// Fetch from `source` and publish the result.
    ///
    /// A refresh started while this one is in flight aborts it; the aborted
    /// call returns `ScoutError::Superseded`. On failure the previous
    /// snapshot stays in place.
    pub async fn refresh(&self, source: Arc<dyn ListingSource>) -> Result<Arc<Snapshot>> {
        let generation = self.next_generation();
        let description = source.describe();

        let task = tokio::spawn(async move { source.fetch().await });
        if let Some(previous) = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task.abort_handle())
        {
            previous.abort();
        }

        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => {
                self.logger.log_refresh_superseded(generation);
                return Err(ScoutError::Superseded);
            }
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        };

        match outcome {
            // A newer refresh started after this one finished fetching
            Ok(_) if self.generation.load(Ordering::SeqCst) != generation => {
                self.logger.log_refresh_superseded(generation);
                Err(ScoutError::Superseded)
            }
            Ok(listings) => {
                let count = listings.len();
                let snapshot = Snapshot::new(listings, generation, description.as_str());
                let bounds = snapshot.bounds().clone();

                match self.install(snapshot) {
                    Some(snapshot) => {
                        self.logger.log_dataset_loaded(
                            &description,
                            generation,
                            count,
                            bounds.max_price,
                            bounds.max_ram,
                        );
                        Ok(snapshot)
                    }
                    None => {
                        self.logger.log_refresh_superseded(generation);
                        Err(ScoutError::Superseded)
                    }
                }
            }
            Err(e) => {
                self.metrics.inc_refresh_failures();
                self.logger.log_refresh_failed(
                    &description,
                    generation,
                    &e.to_string(),
                    self.snapshot().len(),
                );
                Err(e)
            }
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Install `snapshot` unless a newer generation is already published
    fn install(&self, snapshot: Snapshot) -> Option<Arc<Snapshot>> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if snapshot.generation <= current.generation {
            return None;
        }

        let snapshot = Arc::new(snapshot);
        self.metrics.set_listings_loaded(snapshot.len());
        *current = snapshot.clone();
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::StaticSource;
    use async_trait::async_trait;
    use std::time::Duration;

    fn repository() -> ListingRepository {
        ListingRepository::new(EventLogger::new("test"), ScoutMetrics::new())
    }

    fn listing(cpu: &str, price: f64) -> Listing {
        Listing {
            cpu: cpu.to_string(),
            ram_size_gb: 64,
            price_monthly: price,
            ..Default::default()
        }
    }

    /// Source that never answers before the test gives up on it
    struct SlowSource;

    #[async_trait]
    impl ListingSource for SlowSource {
        async fn fetch(&self) -> Result<Vec<Listing>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![listing("slow", 1.0)])
        }

        fn describe(&self) -> String {
            "slow".to_string()
        }
    }

    struct FailingSource;

    #[async_trait]
    impl ListingSource for FailingSource {
        async fn fetch(&self) -> Result<Vec<Listing>> {
            Err(ScoutError::malformed("missing `server` array"))
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    #[test]
    fn test_starts_empty() {
        let repo = repository();
        let snapshot = repo.snapshot();

        assert!(snapshot.is_empty());
        assert_eq!(snapshot.generation(), 0);
        assert!(snapshot.bounds().is_empty());
        assert!(snapshot.loaded_at().is_none());
    }

    #[test]
    fn test_replace_computes_bounds_once() {
        let repo = repository();
        let snapshot = repo.replace(vec![listing("a", 30.2), listing("b", 45.0)], "inline");

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.bounds().max_price, 45.0);
        assert_eq!(snapshot.bounds().max_ram, 64);
        assert!(Arc::ptr_eq(&snapshot, &repo.snapshot()));
    }

    #[test]
    fn test_refresh_from_static_source() {
        let repo = repository();
        let source: Arc<dyn ListingSource> = Arc::new(StaticSource::new(vec![listing("x", 20.0)]));

        let snapshot = tokio_test::block_on(repo.refresh(source)).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.generation(), 1);
        assert_eq!(snapshot.source(), "static (1 listings)");
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let repo = repository();
        repo.replace(vec![listing("kept", 25.0)], "inline");

        let result = repo.refresh(Arc::new(FailingSource)).await;

        assert!(matches!(result, Err(ScoutError::MalformedDataset { .. })));
        let snapshot = repo.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.listings()[0].cpu, "kept");
    }

    #[tokio::test]
    async fn test_newer_refresh_supersedes_in_flight() {
        let repo = Arc::new(repository());

        let slow = {
            let repo = repo.clone();
            tokio::spawn(async move { repo.refresh(Arc::new(SlowSource)).await })
        };
        // Let the slow refresh register itself as in flight
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        let fast = repo
            .refresh(Arc::new(StaticSource::new(vec![listing("fast", 10.0)])))
            .await
            .unwrap();

        let slow_result = slow.await.unwrap();
        assert!(matches!(slow_result, Err(ScoutError::Superseded)));
        assert!(slow_result.unwrap_err().is_superseded());
        assert_eq!(fast.listings()[0].cpu, "fast");
        assert_eq!(repo.snapshot().generation(), fast.generation());
    }
}
