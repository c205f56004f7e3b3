//! User-facing filter state
//!
//! A `FilterState` is always replaced wholesale: every `with_*` method consumes
//! the current value and returns the next one, so a reader holding a clone
//! never observes a half-applied edit.

use super::bounds::{Bounds, ClassBounds};
use crate::models::{DiskClass, PerClass};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Size and count constraints for one disk class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassFilter {
    pub min_size: u32,
    pub max_size: u32,
    pub min_count: usize,
    pub max_count: usize,
}

impl ClassFilter {
    /// The full observed range for a class
    pub fn from_bounds(bounds: &ClassBounds) -> Self {
        Self {
            min_size: 0,
            max_size: bounds.max_size,
            min_count: 0,
            max_count: bounds.max_count,
        }
    }

    /// True when any side of the size or count range narrows the class
    pub fn is_active(&self, bounds: &ClassBounds) -> bool {
        self.min_size > 0
            || self.min_count > 0
            || effective_max(self.max_size, bounds.max_size).is_some()
            || effective_max(self.max_count, bounds.max_count).is_some()
    }
}

/// A filterable dimension, used to report which filters are in effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Cpu,
    Price,
    Ram,
    Disk(DiskClass),
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Cpu => f.write_str("cpu"),
            Dimension::Price => f.write_str("price"),
            Dimension::Ram => f.write_str("ram"),
            Dimension::Disk(class) => f.write_str(class.key()),
        }
    }
}

/// The user's current constraint values per dimension.
///
/// Zero upper bounds mean "unset" and match everything, so
/// `FilterState::default()` is a valid filter before any data arrives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    /// Case-insensitive substring matched against the CPU model
    pub cpu_substring: String,
    pub max_price: f64,
    pub min_ram: u32,
    pub max_ram: u32,
    pub disks: PerClass<ClassFilter>,
}

impl FilterState {
    /// A filter spanning the full observed range of every dimension
    pub fn from_bounds(bounds: &Bounds) -> Self {
        Self {
            cpu_substring: String::new(),
            max_price: bounds.max_price,
            min_ram: 0,
            max_ram: bounds.max_ram,
            disks: bounds.disks.map(|_, class| ClassFilter::from_bounds(class)),
        }
    }

    pub fn with_cpu(mut self, cpu_substring: impl Into<String>) -> Self {
        self.cpu_substring = cpu_substring.into();
        self
    }

    pub fn with_max_price(mut self, max_price: f64) -> Self {
        self.max_price = max_price;
        self
    }

    pub fn with_ram_range(mut self, min_ram: u32, max_ram: u32) -> Self {
        self.min_ram = min_ram;
        self.max_ram = max_ram;
        self
    }

    pub fn with_class(mut self, class: DiskClass, filter: ClassFilter) -> Self {
        self.disks[class] = filter;
        self
    }

    pub fn with_class_size(mut self, class: DiskClass, min_size: u32, max_size: u32) -> Self {
        self.disks[class].min_size = min_size;
        self.disks[class].max_size = max_size;
        self
    }

    pub fn with_class_count(mut self, class: DiskClass, min_count: usize, max_count: usize) -> Self {
        self.disks[class].min_count = min_count;
        self.disks[class].max_count = max_count;
        self
    }

    /// Dimensions that currently narrow the result against `bounds`
    pub fn active_dimensions(&self, bounds: &Bounds) -> Vec<Dimension> {
        let mut active = Vec::new();

        if !self.cpu_substring.trim().is_empty() {
            active.push(Dimension::Cpu);
        }
        if effective_max(self.max_price, bounds.max_price).is_some() {
            active.push(Dimension::Price);
        }
        if self.min_ram > 0 || effective_max(self.max_ram, bounds.max_ram).is_some() {
            active.push(Dimension::Ram);
        }
        for (class, filter) in self.disks.iter() {
            if filter.is_active(&bounds.disks[class]) {
                active.push(Dimension::Disk(class));
            }
        }

        active
    }

    /// True when no dimension narrows the result
    pub fn is_inactive(&self, bounds: &Bounds) -> bool {
        self.active_dimensions(bounds).is_empty()
    }
}

impl From<&Bounds> for FilterState {
    fn from(bounds: &Bounds) -> Self {
        FilterState::from_bounds(bounds)
    }
}

impl Bounds {
    /// The inactive filter for this dataset
    pub fn as_filter(&self) -> FilterState {
        FilterState::from_bounds(self)
    }
}

/// Resolve a filter upper bound. Unset (zero) values and values at or above
/// the dataset bound do not constrain anything. Negative values are treated
/// as unset too; callers taking user input reject them before they get here.
pub(super) fn effective_max<T>(value: T, bound: T) -> Option<T>
where
    T: PartialOrd + Default + Copy,
{
    let is_set = matches!(value.partial_cmp(&T::default()), Some(Ordering::Greater));
    if is_set && value < bound {
        Some(value)
    } else {
        None
    }
}
