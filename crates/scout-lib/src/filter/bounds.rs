//! Filter bounds derived from a listing set
//!
//! Bounds are the rounded supremum of every filterable dimension. They set the
//! range of each filter control and define when a dimension is inactive.

use crate::models::{Listing, PerClass};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Disk size bounds are rounded up to a multiple of this many GB
pub const DISK_SIZE_STEP_GB: u32 = 1000;

/// Upper bounds for one disk class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBounds {
    /// Largest single disk, rounded up to [`DISK_SIZE_STEP_GB`]
    pub max_size: u32,
    /// Most disks of this class in any one listing
    pub max_count: usize,
}

/// Maximal observed value per filterable dimension
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub max_price: f64,
    /// Rounded up to the next power of two
    pub max_ram: u32,
    pub disks: PerClass<ClassBounds>,
}

impl Bounds {
    /// True when the dataset these bounds came from had nothing to filter
    pub fn is_empty(&self) -> bool {
        *self == Bounds::default()
    }
}

/// Derive bounds from a listing set. An empty set yields all-zero bounds.
pub fn compute_bounds<L: Borrow<Listing>>(listings: &[L]) -> Bounds {
    let mut max_price: f64 = 0.0;
    let mut max_ram: u32 = 0;
    let mut max_disk = PerClass::<u32>::default();
    let mut max_count = PerClass::<usize>::default();

    for listing in listings {
        let listing: &Listing = listing.borrow();
        if listing.price_monthly.is_finite() {
            max_price = max_price.max(listing.price_monthly);
        }
        max_ram = max_ram.max(listing.ram_size_gb);

        for (class, disks) in listing.disks.iter() {
            let largest = disks.iter().copied().max().unwrap_or(0);
            max_disk[class] = max_disk[class].max(largest);
            max_count[class] = max_count[class].max(disks.len());
        }
    }

    Bounds {
        max_price: max_price.ceil(),
        max_ram: round_up_pow2(max_ram),
        disks: PerClass::from_fn(|class| ClassBounds {
            max_size: round_up_to_step(max_disk[class]),
            max_count: max_count[class],
        }),
    }
}

fn round_up_pow2(value: u32) -> u32 {
    if value == 0 {
        return 0;
    }
    value.checked_next_power_of_two().unwrap_or(u32::MAX)
}

fn round_up_to_step(size: u32) -> u32 {
    size.div_ceil(DISK_SIZE_STEP_GB).saturating_mul(DISK_SIZE_STEP_GB)
}
