//! Filter flags and shell edits
//!
//! Both the `list` flags and the shell's `key=value` lines turn into
//! `FilterEdit`s, each replacing one part of a `FilterState`.

use anyhow::{anyhow, bail, Result};
use clap::Args;
use scout_lib::filter::ram_scale::{self, format_ram};
use scout_lib::{Bounds, DiskClass, FilterState};
use std::fmt;
use std::str::FromStr;

/// An optionally open range written `A..B`, `A..`, `..B` or `A` (exactly A)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T> FromStr for Span<T>
where
    T: FromStr + Copy,
    T::Err: fmt::Display,
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| -> Result<Option<T>, String> {
            let part = part.trim();
            if part.is_empty() {
                return Ok(None);
            }
            part.parse::<T>()
                .map(Some)
                .map_err(|e| format!("invalid bound '{}': {}", part, e))
        };

        match s.split_once("..") {
            Some((min, max)) => Ok(Span {
                min: parse(min)?,
                max: parse(max)?,
            }),
            None => {
                let value = parse(s)?.ok_or_else(|| "empty range".to_string())?;
                Ok(Span {
                    min: Some(value),
                    max: Some(value),
                })
            }
        }
    }
}

/// Filter flags shared by commands that list listings
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Case-insensitive CPU model substring
    #[arg(long)]
    pub cpu: Option<String>,

    /// Maximum monthly price in EUR (0 means no limit)
    #[arg(long, value_parser = parse_price)]
    pub max_price: Option<f64>,

    /// Minimum RAM in GB
    #[arg(long)]
    pub min_ram: Option<u32>,

    /// Maximum RAM in GB
    #[arg(long)]
    pub max_ram: Option<u32>,

    /// NVMe disk size range in GB (e.g. 1000..4000)
    #[arg(long, value_name = "RANGE")]
    pub nvme_size: Option<Span<u32>>,

    /// Number of NVMe disks in the size range (e.g. 2..)
    #[arg(long, value_name = "RANGE")]
    pub nvme_count: Option<Span<usize>>,

    /// SATA disk size range in GB
    #[arg(long, value_name = "RANGE")]
    pub sata_size: Option<Span<u32>>,

    /// Number of SATA disks in the size range
    #[arg(long, value_name = "RANGE")]
    pub sata_count: Option<Span<usize>>,

    /// HDD size range in GB
    #[arg(long, value_name = "RANGE")]
    pub hdd_size: Option<Span<u32>>,

    /// Number of HDDs in the size range
    #[arg(long, value_name = "RANGE")]
    pub hdd_count: Option<Span<usize>>,
}

impl FilterArgs {
    pub fn edits(&self) -> Vec<FilterEdit> {
        let mut edits = Vec::new();

        if let Some(cpu) = &self.cpu {
            edits.push(FilterEdit::Cpu(cpu.clone()));
        }
        if let Some(price) = self.max_price {
            edits.push(FilterEdit::MaxPrice(price));
        }
        if self.min_ram.is_some() || self.max_ram.is_some() {
            edits.push(FilterEdit::Ram(Span {
                min: self.min_ram,
                max: self.max_ram,
            }));
        }

        let classes = [
            (DiskClass::Nvme, self.nvme_size, self.nvme_count),
            (DiskClass::Sata, self.sata_size, self.sata_count),
            (DiskClass::Hdd, self.hdd_size, self.hdd_count),
        ];
        for (class, size, count) in classes {
            if let Some(span) = size {
                edits.push(FilterEdit::DiskSize(class, span));
            }
            if let Some(span) = count {
                edits.push(FilterEdit::DiskCount(class, span));
            }
        }

        edits
    }

    /// Apply every given flag on top of `filter`
    pub fn apply(&self, mut filter: FilterState, bounds: &Bounds) -> FilterState {
        for edit in self.edits() {
            edit.apply(&mut filter, bounds);
        }
        filter
    }
}

/// One replacement of a `FilterState` field. Open sides of a range leave
/// the current value in place.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEdit {
    Cpu(String),
    MaxPrice(f64),
    /// RAM range in GB
    Ram(Span<u32>),
    /// RAM range as slider positions in `[0, 100]`
    RamSlider(Span<f64>),
    DiskSize(DiskClass, Span<u32>),
    DiskCount(DiskClass, Span<usize>),
}

impl FilterEdit {
    /// Parse a shell line of the form `key=value`
    pub fn parse(line: &str) -> Result<Self> {
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got '{}'", line))?;
        let (key, value) = (key.trim().to_ascii_lowercase(), value.trim());

        let edit = match key.as_str() {
            "cpu" => FilterEdit::Cpu(value.to_string()),
            "price" | "max_price" => {
                FilterEdit::MaxPrice(parse_price(value).map_err(|e| anyhow!(e))?)
            }
            "ram" => FilterEdit::Ram(parse_span(value)?),
            "min_ram" => FilterEdit::Ram(Span {
                min: Some(parse_value(value)?),
                max: None,
            }),
            "max_ram" => FilterEdit::Ram(Span {
                min: None,
                max: Some(parse_value(value)?),
            }),
            "ram_slider" => FilterEdit::RamSlider(parse_span(value)?),
            other => {
                let (class, field) = other
                    .split_once('_')
                    .ok_or_else(|| anyhow!("unknown filter '{}'", other))?;
                let class: DiskClass = class.parse().map_err(|e: String| anyhow!(e))?;
                match field {
                    "size" => FilterEdit::DiskSize(class, parse_span(value)?),
                    "count" => FilterEdit::DiskCount(class, parse_span(value)?),
                    _ => bail!("unknown filter '{}'", other),
                }
            }
        };

        Ok(edit)
    }

    pub fn apply(&self, filter: &mut FilterState, bounds: &Bounds) {
        match self {
            FilterEdit::Cpu(cpu) => filter.cpu_substring = cpu.clone(),
            FilterEdit::MaxPrice(price) => filter.max_price = *price,
            FilterEdit::Ram(span) => {
                set(&mut filter.min_ram, span.min);
                set(&mut filter.max_ram, span.max);
            }
            FilterEdit::RamSlider(span) => {
                let scaled = |position: f64| ram_scale::scale(position, bounds.max_ram);
                set(&mut filter.min_ram, span.min.map(scaled));
                set(&mut filter.max_ram, span.max.map(scaled));
            }
            FilterEdit::DiskSize(class, span) => {
                set(&mut filter.disks[*class].min_size, span.min);
                set(&mut filter.disks[*class].max_size, span.max);
            }
            FilterEdit::DiskCount(class, span) => {
                set(&mut filter.disks[*class].min_count, span.min);
                set(&mut filter.disks[*class].max_count, span.max);
            }
        }
    }
}

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// Parse a monthly price. Zero clears the limit, negative prices are rejected.
pub fn parse_price(value: &str) -> Result<f64, String> {
    let price: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid price '{}': {}", value, e))?;

    if !price.is_finite() || price < 0.0 {
        return Err(format!("invalid price '{}': must be a non-negative number", value));
    }
    Ok(price)
}

fn parse_span<T>(value: &str) -> Result<Span<T>>
where
    T: FromStr + Copy,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: String| anyhow!(e))
}

fn parse_value<T>(value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|e| anyhow!("invalid value '{}': {}", value, e))
}

/// One-line description of the RAM range, with slider positions
pub fn describe_ram(filter: &FilterState, bounds: &Bounds) -> String {
    let max_ram = if filter.max_ram == 0 {
        bounds.max_ram
    } else {
        filter.max_ram
    };

    format!(
        "{}..{} (slider {:.0}..{:.0})",
        format_ram(filter.min_ram),
        format_ram(max_ram),
        ram_scale::unscale(filter.min_ram, bounds.max_ram),
        ram_scale::unscale(max_ram, bounds.max_ram),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_lib::{ClassBounds, PerClass};

    fn bounds() -> Bounds {
        Bounds {
            max_price: 120.0,
            max_ram: 1024,
            disks: PerClass::from_fn(|_| ClassBounds {
                max_size: 8000,
                max_count: 4,
            }),
        }
    }

    #[test]
    fn test_span_parsing() {
        assert_eq!(
            "1000..4000".parse::<Span<u32>>(),
            Ok(Span { min: Some(1000), max: Some(4000) })
        );
        assert_eq!("2..".parse::<Span<usize>>(), Ok(Span { min: Some(2), max: None }));
        assert_eq!("..64".parse::<Span<u32>>(), Ok(Span { min: None, max: Some(64) }));
        assert_eq!("3".parse::<Span<usize>>(), Ok(Span { min: Some(3), max: Some(3) }));
        assert!("abc..".parse::<Span<u32>>().is_err());
        assert!("".parse::<Span<u32>>().is_err());
    }

    #[test]
    fn test_parse_shell_edits() {
        assert_eq!(FilterEdit::parse("cpu=Ryzen").unwrap(), FilterEdit::Cpu("Ryzen".into()));
        assert_eq!(FilterEdit::parse("price = 35").unwrap(), FilterEdit::MaxPrice(35.0));
        assert_eq!(
            FilterEdit::parse("ssd_count=2..").unwrap(),
            FilterEdit::DiskCount(DiskClass::Sata, Span { min: Some(2), max: None })
        );
        assert_eq!(
            FilterEdit::parse("max_ram=256").unwrap(),
            FilterEdit::Ram(Span { min: None, max: Some(256) })
        );
        assert!(FilterEdit::parse("colour=red").is_err());
        assert!(FilterEdit::parse("nvme_speed=1").is_err());
        assert!(FilterEdit::parse("price").is_err());
    }

    #[test]
    fn test_negative_price_is_rejected() {
        assert_eq!(parse_price("0"), Ok(0.0));
        assert_eq!(parse_price(" 35.5 "), Ok(35.5));
        assert!(parse_price("-5").unwrap_err().contains("non-negative"));
        assert!(parse_price("NaN").is_err());
        assert!(FilterEdit::parse("price=-5").is_err());
        assert!(FilterEdit::parse("max_price=-0.01").is_err());
    }

    #[test]
    fn test_flags_override_bounds_filter() {
        let bounds = bounds();
        let args = FilterArgs {
            max_price: Some(40.0),
            min_ram: Some(64),
            hdd_count: Some(Span { min: Some(2), max: None }),
            ..Default::default()
        };

        let filter = args.apply(bounds.as_filter(), &bounds);

        assert_eq!(filter.max_price, 40.0);
        assert_eq!(filter.min_ram, 64);
        assert_eq!(filter.max_ram, 1024);
        assert_eq!(filter.disks.hdd.min_count, 2);
        assert_eq!(filter.disks.hdd.max_count, 4);
        assert_eq!(filter.disks.nvme, bounds.as_filter().disks.nvme);
    }

    #[test]
    fn test_ram_slider_maps_positions() {
        let bounds = bounds();
        let mut filter = bounds.as_filter();

        FilterEdit::parse("ram_slider=0..75")
            .unwrap()
            .apply(&mut filter, &bounds);

        assert_eq!(filter.min_ram, 8);
        assert_eq!(filter.max_ram, 256);
        assert_eq!(describe_ram(&filter, &bounds), "8 GB..256 GB (slider 0..71)");
    }
}
