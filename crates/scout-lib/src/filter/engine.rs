//! Predicate pipeline that narrows a listing set
//!
//! The filter state is compiled once per call into a `Predicate` with every
//! inactive side resolved to `None`, then evaluated per listing in a fixed
//! order: CPU, price, RAM, then each disk class. The first failing check
//! rejects the listing.

use super::bounds::Bounds;
use super::state::{effective_max, ClassFilter, FilterState};
use crate::models::{Listing, PerClass};
use std::borrow::Borrow;

/// Filter `listings` by `filter`, keeping input order.
///
/// Works on owned listings, references or `Arc<Listing>` handles; the returned
/// vector shares the same handles and never copies listing data beyond what
/// `L::clone` does.
pub fn apply_filters<L>(listings: &[L], filter: &FilterState, bounds: &Bounds) -> Vec<L>
where
    L: Borrow<Listing> + Clone,
{
    let predicate = Predicate::compile(filter, bounds);
    listings
        .iter()
        .filter(|listing| predicate.matches(Borrow::<Listing>::borrow(*listing)))
        .cloned()
        .collect()
}

impl FilterState {
    /// Check a single listing against this filter
    pub fn matches(&self, listing: &Listing, bounds: &Bounds) -> bool {
        Predicate::compile(self, bounds).matches(listing)
    }
}

#[derive(Debug)]
struct ClassPredicate {
    min_size: u32,
    max_size: Option<u32>,
    min_count: usize,
    max_count: Option<usize>,
}

impl ClassPredicate {
    fn compile(filter: &ClassFilter, max_size: u32, max_count: usize) -> Self {
        Self {
            min_size: filter.min_size,
            max_size: effective_max(filter.max_size, max_size),
            min_count: filter.min_count,
            max_count: effective_max(filter.max_count, max_count),
        }
    }

    fn passes(&self, disks: &[u32]) -> bool {
        // A machine without this class only survives while no minimum is asked for
        if disks.is_empty() {
            return self.min_size == 0 && self.min_count == 0;
        }

        let matching = disks
            .iter()
            .filter(|&&size| {
                size >= self.min_size && self.max_size.map_or(true, |max| size <= max)
            })
            .count();

        matching >= self.min_count && self.max_count.map_or(true, |max| matching <= max)
    }
}

#[derive(Debug)]
struct Predicate {
    cpu_needle: Option<String>,
    max_price: Option<f64>,
    min_ram: u32,
    max_ram: Option<u32>,
    disks: PerClass<ClassPredicate>,
}

impl Predicate {
    fn compile(filter: &FilterState, bounds: &Bounds) -> Self {
        let needle = filter.cpu_substring.trim().to_lowercase();

        Self {
            cpu_needle: (!needle.is_empty()).then_some(needle),
            max_price: effective_max(filter.max_price, bounds.max_price),
            min_ram: filter.min_ram,
            max_ram: effective_max(filter.max_ram, bounds.max_ram),
            disks: PerClass::from_fn(|class| {
                let limits = &bounds.disks[class];
                ClassPredicate::compile(&filter.disks[class], limits.max_size, limits.max_count)
            }),
        }
    }

    fn matches(&self, listing: &Listing) -> bool {
        if let Some(needle) = &self.cpu_needle {
            if !listing.cpu.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }

        if let Some(max_price) = self.max_price {
            if listing.price_monthly > max_price {
                return false;
            }
        }

        if listing.ram_size_gb < self.min_ram {
            return false;
        }
        if let Some(max_ram) = self.max_ram {
            if listing.ram_size_gb > max_ram {
                return false;
            }
        }

        self.disks
            .iter()
            .all(|(class, predicate)| predicate.passes(&listing.disks[class]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::compute_bounds;
    use crate::models::{DiskClass, DiskInventory};
    use std::sync::Arc;

    fn server(cpu: &str, ram: u32, price: f64, disks: DiskInventory) -> Listing {
        Listing {
            cpu: cpu.to_string(),
            ram_size_gb: ram,
            price_monthly: price,
            disks,
            ..Default::default()
        }
    }

    fn nvme(sizes: &[u32]) -> DiskInventory {
        DiskInventory {
            nvme: sizes.to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn test_cpu_filter_is_case_insensitive() {
        let listings = vec![
            server("AMD Ryzen 7 3700X", 64, 40.0, nvme(&[1000])),
            server("Intel Core i7-8700", 64, 35.0, nvme(&[1000])),
        ];
        let bounds = compute_bounds(&listings);
        let filter = bounds.as_filter().with_cpu("RYZEN");

        let result = apply_filters(&listings, &filter, &bounds);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].cpu, "AMD Ryzen 7 3700X");
    }

    #[test]
    fn test_ram_range() {
        let listings = vec![
            server("a", 32, 10.0, nvme(&[512])),
            server("b", 64, 10.0, nvme(&[512])),
            server("c", 128, 10.0, nvme(&[512])),
        ];
        let bounds = compute_bounds(&listings);
        let filter = bounds.as_filter().with_ram_range(64, 64);

        let result = apply_filters(&listings, &filter, &bounds);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].cpu, "b");
    }

    #[test]
    fn test_zero_upper_bounds_are_unrestricted() {
        let listings = vec![server("a", 256, 99.0, nvme(&[3840, 3840]))];
        let bounds = compute_bounds(&listings);
        let filter = FilterState::default();

        assert_eq!(apply_filters(&listings, &filter, &bounds).len(), 1);
    }

    #[test]
    fn test_disk_size_window_counts_matching_disks() {
        let listings = vec![
            server("mixed", 64, 50.0, nvme(&[512, 3840])),
            server("small", 64, 50.0, nvme(&[512, 512])),
        ];
        let bounds = compute_bounds(&listings);
        let filter = bounds
            .as_filter()
            .with_class_size(DiskClass::Nvme, 1000, 4000)
            .with_class_count(DiskClass::Nvme, 1, 2);

        let result = apply_filters(&listings, &filter, &bounds);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].cpu, "mixed");
    }

    #[test]
    fn test_max_count_excludes_larger_arrays() {
        let hdd = |count: usize| DiskInventory {
            hdd: vec![4000; count],
            ..Default::default()
        };
        let listings = vec![server("two", 64, 50.0, hdd(2)), server("ten", 64, 50.0, hdd(10))];
        let bounds = compute_bounds(&listings);
        let filter = bounds.as_filter().with_class_count(DiskClass::Hdd, 0, 4);

        let result = apply_filters(&listings, &filter, &bounds);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].cpu, "two");
    }

    #[test]
    fn test_min_size_excludes_listing_without_class() {
        let listings = vec![server("no-sata", 64, 50.0, nvme(&[512]))];
        let bounds = compute_bounds(&listings);
        let filter = bounds.as_filter().with_class_size(DiskClass::Sata, 240, 0);

        assert!(apply_filters(&listings, &filter, &bounds).is_empty());
    }

    #[test]
    fn test_shares_arc_handles() {
        let listings: Vec<Arc<Listing>> = vec![
            Arc::new(server("a", 64, 30.0, nvme(&[512]))),
            Arc::new(server("b", 64, 60.0, nvme(&[512]))),
        ];
        let bounds = compute_bounds(&listings);
        let filter = bounds.as_filter().with_max_price(40.0);

        let result = apply_filters(&listings, &filter, &bounds);
        assert_eq!(result.len(), 1);
        assert!(Arc::ptr_eq(&result[0], &listings[0]));
    }

    #[test]
    fn test_single_listing_match() {
        let listing = server("Xeon E3-1275", 32, 29.0, nvme(&[]));
        let bounds = compute_bounds(&[listing.clone()]);

        assert!(bounds.as_filter().matches(&listing, &bounds));
        assert!(!bounds
            .as_filter()
            .with_class_count(DiskClass::Nvme, 1, 0)
            .matches(&listing, &bounds));
    }
}
