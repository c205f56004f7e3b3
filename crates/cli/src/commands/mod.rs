//! CLI command implementations

pub mod bounds;
pub mod filters;
pub mod list;
pub mod shell;

use crate::output::OutputFormat;
use anyhow::{Context as _, Result};
use scout_lib::feed::ListingSource;
use scout_lib::{EventLogger, FilterSession, ListingRepository, ScoutMetrics, SessionConfig, Snapshot};
use std::sync::Arc;

/// Everything a command needs for one invocation
pub struct Context {
    pub source: Arc<dyn ListingSource>,
    pub repository: Arc<ListingRepository>,
    pub session_config: SessionConfig,
    pub logger: EventLogger,
    pub metrics: ScoutMetrics,
    pub format: OutputFormat,
}

impl Context {
    pub fn new(
        source: Arc<dyn ListingSource>,
        session_config: SessionConfig,
        format: OutputFormat,
    ) -> Self {
        let logger = EventLogger::new("cli");
        let metrics = ScoutMetrics::new();
        let repository = Arc::new(ListingRepository::new(logger.clone(), metrics.clone()));

        Self {
            source,
            repository,
            session_config,
            logger,
            metrics,
            format,
        }
    }

    /// Start a filter session over this invocation's repository
    pub fn session(&self) -> FilterSession {
        FilterSession::new(
            self.repository.clone(),
            self.session_config.clone(),
            self.logger.clone(),
            self.metrics.clone(),
        )
    }

    /// Fetch the feed into the repository
    pub async fn load(&self) -> Result<Arc<Snapshot>> {
        self.repository
            .refresh(self.source.clone())
            .await
            .with_context(|| load_failure(self.source.as_ref()))
    }

    /// Fetch the feed through `session`, resetting its filter to the new bounds
    pub async fn load_into(&self, session: &FilterSession) -> Result<Arc<Snapshot>> {
        session
            .refresh(self.source.clone())
            .await
            .with_context(|| load_failure(self.source.as_ref()))
    }
}

fn load_failure(source: &dyn ListingSource) -> String {
    format!(
        "Failed to load listings from {} (check --source, or retry later)",
        source.describe()
    )
}
