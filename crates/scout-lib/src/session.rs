//! Interactive filter session
//!
//! Ties the repository, the filter engine and the debouncer together for a
//! long-lived consumer such as the CLI shell:
//! - edits to the `FilterState` are published immediately so controls can
//!   echo them
//! - the filtered view is recomputed once input has been quiet for the
//!   debounce window
//! - a successful refresh resets the filter to the new dataset's bounds

use crate::debounce::{Debouncer, DEFAULT_DEBOUNCE_WINDOW};
use crate::error::Result;
use crate::feed::ListingSource;
use crate::filter::{apply_filters, FilterState};
use crate::models::Listing;
use crate::observability::{EventLogger, ScoutMetrics};
use crate::repository::{ListingRepository, Snapshot};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Configuration for a filter session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Quiet period before a filter edit triggers recomputation
    pub debounce_window: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
        }
    }
}

/// What a filtered view has to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    /// Nothing has been loaded, or the feed was empty
    Empty,
    /// Data is loaded but the filter rejects every listing
    NoMatches,
    Showing(usize),
}

/// Result of one filter pass over a snapshot
#[derive(Debug, Clone, Default)]
pub struct FilteredView {
    pub listings: Vec<Arc<Listing>>,
    /// Size of the snapshot the view was computed from
    pub total: usize,
    pub filter: FilterState,
    /// Revision of the filter edit the view was computed for
    pub revision: u64,
    pub generation: u64,
}

impl FilteredView {
    pub fn status(&self) -> ViewStatus {
        match (self.total, self.listings.len()) {
            (0, _) => ViewStatus::Empty,
            (_, 0) => ViewStatus::NoMatches,
            (_, visible) => ViewStatus::Showing(visible),
        }
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

/// A filter value tagged with the edit that produced it
#[derive(Debug, Clone)]
struct Revision {
    number: u64,
    filter: FilterState,
}

/// Runs filter passes against the repository's current snapshot and
/// publishes the result
struct Recompute {
    repository: Arc<ListingRepository>,
    view: watch::Sender<FilteredView>,
    logger: EventLogger,
    metrics: ScoutMetrics,
}

impl Recompute {
    /// Filter and publish, unless a view for a later edit (or a later
    /// snapshot of the same edit) is already published. Returns the view
    /// that is current afterwards.
    fn run(&self, revision: Revision) -> FilteredView {
        let snapshot = self.repository.snapshot();
        let view = self.compute(&snapshot, revision);

        let published = self.view.send_if_modified(|current| {
            if (view.revision, view.generation) < (current.revision, current.generation) {
                return false;
            }
            *current = view.clone();
            true
        });

        if published {
            return view;
        }

        let current = self.view.borrow().clone();
        self.logger.log_stale_view_dropped(view.revision, current.revision);
        current
    }

    fn compute(&self, snapshot: &Snapshot, revision: Revision) -> FilteredView {
        let Revision { number, filter } = revision;
        let started = Instant::now();
        let listings = apply_filters(snapshot.listings(), &filter, snapshot.bounds());
        let elapsed = started.elapsed();

        self.metrics.observe_filter(elapsed.as_secs_f64(), listings.len());
        self.logger.log_filters_applied(
            &filter.active_dimensions(snapshot.bounds()),
            snapshot.len(),
            listings.len(),
            elapsed.as_micros(),
        );

        FilteredView {
            listings,
            total: snapshot.len(),
            filter,
            revision: number,
            generation: snapshot.generation(),
        }
    }
}

/// A user's browsing session over one repository
pub struct FilterSession {
    recompute: Arc<Recompute>,
    filter: watch::Sender<FilterState>,
    /// Bumped under the filter channel's write lock on every edit
    revision: AtomicU64,
    debouncer: Debouncer<Revision>,
}

impl FilterSession {
    /// Create a session. Must be called from within a tokio runtime.
    pub fn new(
        repository: Arc<ListingRepository>,
        config: SessionConfig,
        logger: EventLogger,
        metrics: ScoutMetrics,
    ) -> Self {
        let snapshot = repository.snapshot();
        let initial = snapshot.bounds().as_filter();

        logger.log_session_started(snapshot.source(), config.debounce_window.as_millis());

        let (view, _) = watch::channel(FilteredView {
            listings: snapshot.listings().to_vec(),
            total: snapshot.len(),
            filter: initial.clone(),
            revision: 0,
            generation: snapshot.generation(),
        });
        let (filter, _) = watch::channel(initial);

        let recompute = Arc::new(Recompute {
            repository,
            view,
            logger,
            metrics,
        });

        let debouncer = {
            let recompute = recompute.clone();
            Debouncer::new(config.debounce_window, move |revision| {
                recompute.run(revision);
            })
        };

        Self {
            recompute,
            filter,
            revision: AtomicU64::new(0),
            debouncer,
        }
    }

    pub fn repository(&self) -> &Arc<ListingRepository> {
        &self.recompute.repository
    }

    /// The filter as last edited, before any debounced recompute
    pub fn filter(&self) -> FilterState {
        self.filter.borrow().clone()
    }

    /// The most recently published filtered view
    pub fn view(&self) -> FilteredView {
        self.recompute.view.borrow().clone()
    }

    pub fn subscribe_filter(&self) -> watch::Receiver<FilterState> {
        self.filter.subscribe()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<FilteredView> {
        self.recompute.view.subscribe()
    }

    /// Replace the filter and schedule a recompute
    pub fn update_filter(&self, filter: FilterState) {
        self.edit(|current| *current = filter);
    }

    /// Modify the filter in place and schedule a recompute
    pub fn edit<F>(&self, edit: F)
    where
        F: FnOnce(&mut FilterState),
    {
        let revision = self.write(edit);
        self.debouncer.schedule(revision);
    }

    /// Apply `edit` and tag the result with the next revision number
    fn write<F>(&self, edit: F) -> Revision
    where
        F: FnOnce(&mut FilterState),
    {
        let mut revision = None;
        self.filter.send_modify(|filter| {
            edit(filter);
            revision = Some(Revision {
                number: self.revision.fetch_add(1, Ordering::SeqCst) + 1,
                filter: filter.clone(),
            });
        });
        revision.unwrap_or_else(|| self.current())
    }

    /// The current filter with its revision number
    fn current(&self) -> Revision {
        let filter = self.filter.borrow();
        Revision {
            number: self.revision.load(Ordering::SeqCst),
            filter: filter.clone(),
        }
    }

    /// Run a pending recompute without waiting for the window to elapse
    pub fn flush(&self) {
        self.debouncer.flush();
    }

    /// Drop any pending recompute and filter the current state right away
    pub fn apply_now(&self) -> FilteredView {
        self.debouncer.cancel();
        self.recompute.run(self.current())
    }

    /// Restore the filter to the current dataset's bounds
    pub fn reset(&self) -> FilteredView {
        let filter = self.recompute.repository.snapshot().bounds().as_filter();
        let revision = self.write(|current| *current = filter);
        self.debouncer.cancel();
        self.recompute.run(revision)
    }

    /// Re-fetch from `source`. On success the filter starts over from the
    /// new bounds and the full listing set is published.
    pub async fn refresh(&self, source: Arc<dyn ListingSource>) -> Result<Arc<Snapshot>> {
        let snapshot = self.recompute.repository.refresh(source).await?;
        self.reset();
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::StaticSource;
    use crate::models::DiskClass;
    use tokio::time::advance;

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    fn listing(cpu: &str, price: f64, ram: u32, nvme: Vec<u32>) -> Listing {
        let mut listing = Listing {
            cpu: cpu.to_string(),
            price_monthly: price,
            ram_size_gb: ram,
            datacenter: "FSN1-DC14".to_string(),
            ..Default::default()
        };
        listing.disks.nvme = nvme;
        listing
    }

    fn source() -> Arc<dyn ListingSource> {
        Arc::new(StaticSource::new(vec![
            listing("AMD Ryzen 7 3700X", 30.2, 64, vec![1000, 1000]),
            listing("Intel Xeon E5-1650V3", 45.0, 128, vec![]),
            listing("Intel Core i7-6700", 33.6, 32, vec![512]),
        ]))
    }

    fn session() -> FilterSession {
        let repository = Arc::new(ListingRepository::new(
            EventLogger::new("test"),
            ScoutMetrics::new(),
        ));
        FilterSession::new(
            repository,
            SessionConfig::default(),
            EventLogger::new("test"),
            ScoutMetrics::new(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_session_is_empty() {
        let session = session();

        assert_eq!(session.view().status(), ViewStatus::Empty);
        assert_eq!(session.filter(), FilterState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_publishes_bounds_as_filter() {
        let session = session();
        let snapshot = session.refresh(source()).await.unwrap();

        assert_eq!(session.filter(), snapshot.bounds().as_filter());
        let view = session.view();
        assert_eq!(view.status(), ViewStatus::Showing(3));
        assert_eq!(view.generation, snapshot.generation());
        assert_eq!(view.listings[0].cpu, "AMD Ryzen 7 3700X");
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_echoes_immediately_and_recomputes_after_window() {
        let session = session();
        session.refresh(source()).await.unwrap();
        let mut filters = session.subscribe_filter();
        filters.borrow_and_update();

        session.edit(|filter| filter.max_price = 35.0);
        settle().await;

        assert!(filters.has_changed().unwrap());
        assert_eq!(session.filter().max_price, 35.0);
        assert_eq!(session.view().len(), 3);

        advance(DEFAULT_DEBOUNCE_WINDOW + Duration::from_millis(1)).await;
        settle().await;

        let view = session.view();
        assert_eq!(view.len(), 2);
        assert_eq!(view.filter.max_price, 35.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_edits_applies_last_value() {
        let session = session();
        session.refresh(source()).await.unwrap();

        for price in [44.0, 40.0, 36.0, 32.0] {
            session.edit(|filter| filter.max_price = price);
            settle().await;
            advance(Duration::from_millis(50)).await;
        }
        settle().await;
        assert_eq!(session.view().len(), 3);

        advance(DEFAULT_DEBOUNCE_WINDOW).await;
        settle().await;

        let view = session.view();
        assert_eq!(view.len(), 1);
        assert_eq!(view.listings[0].cpu, "AMD Ryzen 7 3700X");
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_applies_pending_edit() {
        let session = session();
        session.refresh(source()).await.unwrap();

        session.update_filter(session.filter().with_class_count(DiskClass::Nvme, 1, 0));
        session.flush();
        settle().await;

        assert_eq!(session.view().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_matches_and_reset() {
        let session = session();
        session.refresh(source()).await.unwrap();

        session.edit(|filter| filter.cpu_substring = "graviton".to_string());
        let view = session.apply_now();
        assert_eq!(view.status(), ViewStatus::NoMatches);

        let view = session.reset();
        assert_eq!(view.status(), ViewStatus::Showing(3));
        assert!(session.filter().cpu_substring.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_debounced_pass_does_not_overwrite_newer_view() {
        let session = session();
        session.refresh(source()).await.unwrap();

        session.edit(|filter| filter.cpu_substring = "graviton".to_string());
        let slow_pass = session.current();

        session.edit(|filter| {
            filter.cpu_substring.clear();
            filter.max_price = 31.0;
        });
        let applied = session.apply_now();
        assert_eq!(applied.status(), ViewStatus::Showing(1));

        // The earlier edit's pass completes only now
        let view = session.recompute.run(slow_pass);

        assert_eq!(view.filter, session.filter());
        assert_eq!(view.revision, applied.revision);
        assert_eq!(session.view().filter, session.filter());
        assert_eq!(session.view().status(), ViewStatus::Showing(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_revisions_increase_with_every_edit() {
        let session = session();
        session.refresh(source()).await.unwrap();
        let after_refresh = session.view().revision;

        session.update_filter(session.filter().with_max_price(40.0));
        session.edit(|filter| filter.min_ram = 64);
        let view = session.apply_now();

        assert_eq!(view.revision, after_refresh + 2);
        assert_eq!(view.len(), 1);

        let view = session.reset();
        assert_eq!(view.revision, after_refresh + 3);
        assert_eq!(view.len(), 3);
    }
}
