//! Client-side filtering engine
//!
//! This module provides:
//! - Bounds derivation from the live dataset
//! - The user-facing filter state and its inactive-dimension rules
//! - The pure predicate pipeline that narrows a listing set
//! - The non-linear RAM slider mapping

mod bounds;
mod engine;
pub mod ram_scale;
mod state;

#[cfg(test)]
mod tests;

pub use bounds::{compute_bounds, Bounds, ClassBounds, DISK_SIZE_STEP_GB};
pub use engine::apply_filters;
pub use state::{ClassFilter, Dimension, FilterState};
