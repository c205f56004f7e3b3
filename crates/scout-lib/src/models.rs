//! Core data models for auction listings

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// Storage tier of a physical disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskClass {
    Nvme,
    Sata,
    Hdd,
}

impl DiskClass {
    /// All classes in filter evaluation order
    pub const ALL: [DiskClass; 3] = [DiskClass::Nvme, DiskClass::Sata, DiskClass::Hdd];

    /// Lowercase key used in the feed and on the command line
    pub fn key(&self) -> &'static str {
        match self {
            DiskClass::Nvme => "nvme",
            DiskClass::Sata => "sata",
            DiskClass::Hdd => "hdd",
        }
    }
}

impl fmt::Display for DiskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiskClass::Nvme => "NVMe",
            DiskClass::Sata => "SATA",
            DiskClass::Hdd => "HDD",
        };
        f.write_str(label)
    }
}

impl FromStr for DiskClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nvme" => Ok(DiskClass::Nvme),
            "sata" | "ssd" => Ok(DiskClass::Sata),
            "hdd" => Ok(DiskClass::Hdd),
            other => Err(format!("unknown disk class '{}'", other)),
        }
    }
}

/// One value per disk class, indexable by [`DiskClass`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerClass<T> {
    pub nvme: T,
    pub sata: T,
    pub hdd: T,
}

impl<T> PerClass<T> {
    /// Build a record by evaluating `f` for every class
    pub fn from_fn(mut f: impl FnMut(DiskClass) -> T) -> Self {
        Self {
            nvme: f(DiskClass::Nvme),
            sata: f(DiskClass::Sata),
            hdd: f(DiskClass::Hdd),
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(DiskClass, &T) -> U) -> PerClass<U> {
        PerClass::from_fn(|class| f(class, &self[class]))
    }

    /// Iterate `(class, value)` pairs in [`DiskClass::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (DiskClass, &T)> + '_ {
        DiskClass::ALL.into_iter().map(move |class| (class, &self[class]))
    }
}

impl<T> Index<DiskClass> for PerClass<T> {
    type Output = T;

    fn index(&self, class: DiskClass) -> &T {
        match class {
            DiskClass::Nvme => &self.nvme,
            DiskClass::Sata => &self.sata,
            DiskClass::Hdd => &self.hdd,
        }
    }
}

impl<T> IndexMut<DiskClass> for PerClass<T> {
    fn index_mut(&mut self, class: DiskClass) -> &mut T {
        match class {
            DiskClass::Nvme => &mut self.nvme,
            DiskClass::Sata => &mut self.sata,
            DiskClass::Hdd => &mut self.hdd,
        }
    }
}

/// Capacities in GB of every physical disk, grouped by class.
/// An empty vector means the class is absent from the machine.
pub type DiskInventory = PerClass<Vec<u32>>;

impl DiskInventory {
    /// Number of disks across all classes
    pub fn disk_count(&self) -> usize {
        self.iter().map(|(_, disks)| disks.len()).sum()
    }

    /// Raw capacity in GB across all classes
    pub fn total_capacity_gb(&self) -> u64 {
        self.iter()
            .flat_map(|(_, disks)| disks.iter())
            .map(|&size| u64::from(size))
            .sum()
    }
}

/// One auctioned machine as advertised in the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: u64,
    pub cpu: String,
    pub cpu_count: u32,
    pub ram_size_gb: u32,
    pub ecc: bool,
    pub price_monthly: f64,
    pub setup_price: f64,
    pub datacenter: String,
    pub disks: DiskInventory,
    pub specials: Vec<String>,
    /// Seconds until the next scheduled price reduction
    pub next_reduce_secs: i64,
}

impl Default for Listing {
    fn default() -> Self {
        Self {
            id: 0,
            cpu: String::new(),
            cpu_count: 1,
            ram_size_gb: 0,
            ecc: false,
            price_monthly: 0.0,
            setup_price: 0.0,
            datacenter: String::new(),
            disks: DiskInventory::default(),
            specials: Vec::new(),
            next_reduce_secs: 0,
        }
    }
}
