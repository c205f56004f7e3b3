//! Core library for browsing dedicated-server auction listings
//!
//! This crate provides the core functionality for:
//! - Loading and validating the auction feed
//! - Deriving filter bounds from the live dataset
//! - Filtering listings by CPU, price, RAM and per-class disk inventory
//! - Debounced re-filtering under continuous input
//! - Structured logging and metrics

pub mod debounce;
pub mod error;
pub mod feed;
pub mod filter;
pub mod models;
pub mod observability;
pub mod repository;
pub mod session;

pub use debounce::{DebounceTimer, Debouncer, DEFAULT_DEBOUNCE_WINDOW};
pub use error::{Result, ScoutError};
pub use filter::{
    apply_filters, compute_bounds, Bounds, ClassBounds, ClassFilter, Dimension, FilterState,
};
pub use models::*;
pub use observability::{EventLogger, ScoutMetrics};
pub use repository::{ListingRepository, Snapshot};
pub use session::{FilterSession, FilteredView, SessionConfig, ViewStatus};
