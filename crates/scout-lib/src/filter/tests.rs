//! Behavioural tests for the filtering engine
//!
//! These tests verify:
//! - Bounds soundness over a realistic dataset
//! - Identity, idempotence and monotonicity of `apply_filters`
//! - Empty disk class handling
//! - The two-listing price scenario

use super::*;
use crate::models::{DiskClass, DiskInventory, Listing};

fn listing(cpu: &str, ram: u32, price: f64, nvme: &[u32], sata: &[u32], hdd: &[u32]) -> Listing {
    Listing {
        cpu: cpu.to_string(),
        ram_size_gb: ram,
        price_monthly: price,
        datacenter: "FSN1-DC14".to_string(),
        disks: DiskInventory {
            nvme: nvme.to_vec(),
            sata: sata.to_vec(),
            hdd: hdd.to_vec(),
        },
        ..Default::default()
    }
}

/// A spread of machines resembling a real auction snapshot
fn auction_snapshot() -> Vec<Listing> {
    vec![
        listing("Intel Core i7-6700", 64, 39.0, &[512, 512], &[], &[]),
        listing("AMD Ryzen 5 3600", 64, 44.9, &[512, 512], &[], &[]),
        listing("Intel Xeon E3-1275V6", 32, 31.5, &[], &[], &[4000, 4000]),
        listing("Intel Xeon E5-1650V3", 128, 52.0, &[], &[480, 480], &[2000, 2000]),
        listing("AMD Ryzen 9 5950X", 128, 89.0, &[3840, 3840], &[], &[]),
        listing("Intel Xeon W-2145", 256, 119.0, &[960, 960], &[], &[10000, 10000, 10000, 10000]),
        listing("AMD EPYC 7502P", 512, 215.75, &[1920, 1920], &[3840], &[]),
        listing("Intel Core i7-3770", 16, 24.0, &[], &[240, 240], &[]),
        listing("Intel Xeon E5-2680v4", 768, 160.0, &[], &[], &[16000; 10]),
        listing("Intel Core i9-9900K", 64, 61.0, &[1000], &[], &[]),
    ]
}

fn cpus(listings: &[Listing]) -> Vec<&str> {
    listings.iter().map(|l| l.cpu.as_str()).collect()
}

/// Every filter that narrows exactly one dimension of the inactive filter
fn single_tightenings(bounds: &Bounds) -> Vec<(FilterState, FilterState)> {
    let base = bounds.as_filter();
    let mut pairs = vec![
        (
            base.clone().with_max_price(100.0),
            base.clone().with_max_price(50.0),
        ),
        (
            base.clone().with_ram_range(32, bounds.max_ram),
            base.clone().with_ram_range(128, bounds.max_ram),
        ),
        (
            base.clone().with_ram_range(0, 512),
            base.clone().with_ram_range(0, 64),
        ),
        (base.clone().with_cpu("intel"), base.clone().with_cpu("intel xeon")),
    ];

    for class in DiskClass::ALL {
        let limits = bounds.disks[class];
        pairs.push((
            base.clone().with_class_size(class, 500, limits.max_size),
            base.clone().with_class_size(class, 1000, limits.max_size),
        ));
        pairs.push((
            base.clone().with_class_size(class, 0, 4000),
            base.clone().with_class_size(class, 0, 1000),
        ));
        pairs.push((
            base.clone().with_class_count(class, 1, limits.max_count),
            base.clone().with_class_count(class, 2, limits.max_count),
        ));
        pairs.push((
            base.clone().with_class_count(class, 0, 4),
            base.clone().with_class_count(class, 0, 2),
        ));
    }

    pairs
}

#[test]
fn test_bounds_soundness() {
    let listings = auction_snapshot();
    let bounds = compute_bounds(&listings);

    for l in &listings {
        assert!(l.price_monthly <= bounds.max_price);
        assert!(l.ram_size_gb <= bounds.max_ram);
        for (class, disks) in l.disks.iter() {
            assert!(disks.len() <= bounds.disks[class].max_count);
            for &size in disks {
                assert!(size <= bounds.disks[class].max_size);
            }
        }
    }

    assert_eq!(bounds.max_price, 216.0);
    assert_eq!(bounds.max_ram, 1024);
    assert_eq!(bounds.disks[DiskClass::Hdd].max_size, 16000);
    assert_eq!(bounds.disks[DiskClass::Hdd].max_count, 10);
}

#[test]
fn test_inactive_filter_is_identity() {
    let listings = auction_snapshot();
    let bounds = compute_bounds(&listings);

    let result = apply_filters(&listings, &bounds.as_filter(), &bounds);
    assert_eq!(result, listings);
}

#[test]
fn test_filtering_is_idempotent() {
    let listings = auction_snapshot();
    let bounds = compute_bounds(&listings);

    for (loose, tight) in single_tightenings(&bounds) {
        for filter in [loose, tight] {
            let once = apply_filters(&listings, &filter, &bounds);
            let twice = apply_filters(&once, &filter, &bounds);
            assert_eq!(once, twice, "filter {:?}", filter);
        }
    }
}

#[test]
fn test_tightening_never_grows_result() {
    let listings = auction_snapshot();
    let bounds = compute_bounds(&listings);
    let everything = listings.len();

    for (loose, tight) in single_tightenings(&bounds) {
        let loose_count = apply_filters(&listings, &loose, &bounds).len();
        let tight_count = apply_filters(&listings, &tight, &bounds).len();
        assert!(loose_count <= everything);
        assert!(
            tight_count <= loose_count,
            "{:?} kept {} but {:?} kept {}",
            tight,
            tight_count,
            loose,
            loose_count
        );
    }
}

#[test]
fn test_result_keeps_input_order() {
    let listings = auction_snapshot();
    let bounds = compute_bounds(&listings);
    let filter = bounds.as_filter().with_cpu("xeon");

    let result = apply_filters(&listings, &filter, &bounds);
    assert_eq!(
        cpus(&result),
        vec![
            "Intel Xeon E3-1275V6",
            "Intel Xeon E5-1650V3",
            "Intel Xeon W-2145",
            "Intel Xeon E5-2680v4",
        ]
    );
}

#[test]
fn test_empty_hdd_class_exclusion() {
    let listings = vec![listing("AMD Ryzen 7 7700", 64, 49.0, &[1000, 1000], &[], &[])];
    let bounds = compute_bounds(&listings);

    let requires_hdd = bounds.as_filter().with_class_count(DiskClass::Hdd, 1, 0);
    assert!(apply_filters(&listings, &requires_hdd, &bounds).is_empty());

    let open = bounds.as_filter().with_class_count(DiskClass::Hdd, 0, 0);
    assert_eq!(open.disks[DiskClass::Hdd].min_size, 0);
    assert_eq!(apply_filters(&listings, &open, &bounds).len(), 1);
}

#[test]
fn test_price_scenario() {
    let listings = vec![
        listing("i7-6700", 64, 40.0, &[512], &[], &[]),
        listing("Ryzen 5", 32, 30.0, &[], &[2000, 2000], &[]),
    ];
    let bounds = compute_bounds(&listings);
    let filter = bounds.as_filter().with_max_price(35.0);

    assert_eq!(filter.min_ram, 0);
    assert_eq!(filter.max_ram, bounds.max_ram);

    let result = apply_filters(&listings, &filter, &bounds);
    assert_eq!(cpus(&result), vec!["Ryzen 5"]);
}

#[test]
fn test_empty_dataset_filters_to_empty() {
    let listings: Vec<Listing> = Vec::new();
    let bounds = compute_bounds(&listings);

    assert!(apply_filters(&listings, &FilterState::default(), &bounds).is_empty());
    assert!(apply_filters(&listings, &bounds.as_filter(), &bounds).is_empty());
}

#[test]
fn test_combined_filters() {
    let listings = auction_snapshot();
    let bounds = compute_bounds(&listings);
    let filter = bounds
        .as_filter()
        .with_max_price(130.0)
        .with_ram_range(64, 256)
        .with_class_count(DiskClass::Nvme, 2, 2);

    let result = apply_filters(&listings, &filter, &bounds);
    assert_eq!(
        cpus(&result),
        vec![
            "Intel Core i7-6700",
            "AMD Ryzen 5 3600",
            "AMD Ryzen 9 5950X",
            "Intel Xeon W-2145",
        ]
    );
}
