//! Auction feed loading
//!
//! This module turns the published JSON feed into validated listings. The
//! feed is loosely typed, so parsing coerces where the intent is clear
//! (missing numbers are 0, numeric strings are parsed, negative values clamp
//! to 0) and rejects records whose numeric fields hold something else.

mod file;
mod http;

pub use file::FileSource;
pub use http::HttpSource;

use crate::error::{Result, ScoutError};
use crate::models::{DiskClass, DiskInventory, Listing};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Public server auction feed
pub const DEFAULT_FEED_URL: &str =
    "https://www.hetzner.com/_resources/app/data/app/live_data_sb_EUR.json";

/// Default request timeout for the HTTP source
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for feed loading
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Feed URL or local file path
    pub location: String,
    /// Request timeout for HTTP sources
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            location: DEFAULT_FEED_URL.to_string(),
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Trait for anything that can produce a listing set
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Load and validate the full listing set
    async fn fetch(&self) -> Result<Vec<Listing>>;

    /// Human-readable origin, used in logs
    fn describe(&self) -> String;
}

/// Pick an HTTP or file source based on the configured location
pub fn create_source(config: &FeedConfig) -> Result<Arc<dyn ListingSource>> {
    let location = config.location.trim();

    if location.starts_with("http://") || location.starts_with("https://") {
        tracing::debug!(url = %location, "Using HTTP feed source");
        Ok(Arc::new(HttpSource::new(location, config.timeout)?))
    } else {
        tracing::debug!(path = %location, "Using file feed source");
        Ok(Arc::new(FileSource::new(location)))
    }
}

/// In-memory source, handy for replaying a captured snapshot
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    listings: Vec<Listing>,
}

impl StaticSource {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }
}

#[async_trait]
impl ListingSource for StaticSource {
    async fn fetch(&self) -> Result<Vec<Listing>> {
        Ok(self.listings.clone())
    }

    fn describe(&self) -> String {
        format!("static ({} listings)", self.listings.len())
    }
}

#[derive(Deserialize)]
struct RawFeed {
    #[serde(default)]
    server: Option<Vec<Value>>,
}

/// Parse a feed document into listings ordered by ascending monthly price.
///
/// An empty `server` array is a valid, empty dataset.
pub fn parse_feed(document: &str) -> Result<Vec<Listing>> {
    let feed: RawFeed = serde_json::from_str(document)
        .map_err(|e| ScoutError::malformed(format!("invalid JSON: {}", e)))?;

    let records = feed
        .server
        .ok_or_else(|| ScoutError::malformed("missing `server` array"))?;

    let mut listings = records
        .iter()
        .enumerate()
        .map(|(index, record)| parse_record(index, record))
        .collect::<Result<Vec<_>>>()?;

    listings.sort_by(|a, b| a.price_monthly.total_cmp(&b.price_monthly));
    Ok(listings)
}

fn parse_record(index: usize, record: &Value) -> Result<Listing> {
    let fields = record
        .as_object()
        .ok_or_else(|| ScoutError::malformed(format!("server[{}] is not an object", index)))?;
    let reader = RecordReader { index, fields };

    Ok(Listing {
        id: reader.number("id")? as u64,
        cpu: reader.text("cpu")?,
        cpu_count: (reader.number("cpu_count")? as u32).max(1),
        ram_size_gb: reader.number("ram_size")?.round() as u32,
        ecc: reader.flag("is_ecc"),
        price_monthly: reader.number("price")?,
        setup_price: reader.number("setup_price")?,
        datacenter: reader.text("datacenter")?,
        disks: reader.disks()?,
        specials: reader.text_list("specials")?,
        next_reduce_secs: reader.number("next_reduce")? as i64,
    })
}

struct RecordReader<'a> {
    index: usize,
    fields: &'a Map<String, Value>,
}

impl RecordReader<'_> {
    fn error(&self, field: &str, detail: impl std::fmt::Display) -> ScoutError {
        ScoutError::malformed(format!("server[{}].{}: {}", self.index, field, detail))
    }

    fn number(&self, field: &str) -> Result<f64> {
        coerce_number(self.fields.get(field)).map_err(|detail| self.error(field, detail))
    }

    fn text(&self, field: &str) -> Result<String> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.trim().to_string()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(other) => Err(self.error(field, format!("expected text, got {}", other))),
        }
    }

    fn flag(&self, field: &str) -> bool {
        match self.fields.get(field) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map_or(false, |v| v != 0.0),
            _ => false,
        }
    }

    fn text_list(&self, field: &str) -> Result<Vec<String>> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items
                .iter()
                .filter_map(|item| item.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()),
            Some(other) => Err(self.error(field, format!("expected a list, got {}", other))),
        }
    }

    fn disks(&self) -> Result<DiskInventory> {
        const FIELD: &str = "serverDiskData";

        let data = match self.fields.get(FIELD) {
            None | Some(Value::Null) => return Ok(DiskInventory::default()),
            Some(Value::Object(data)) => data,
            Some(other) => return Err(self.error(FIELD, format!("expected an object, got {}", other))),
        };

        let mut inventory = DiskInventory::default();
        for class in DiskClass::ALL {
            let sizes = match data.get(class.key()) {
                None | Some(Value::Null) => continue,
                Some(Value::Array(sizes)) => sizes,
                Some(other) => {
                    return Err(self.error(
                        &format!("{}.{}", FIELD, class.key()),
                        format!("expected a list, got {}", other),
                    ))
                }
            };

            for size in sizes {
                let size = coerce_number(Some(size)).map_err(|detail| {
                    self.error(&format!("{}.{}", FIELD, class.key()), detail)
                })?;
                // Zero-capacity entries are placeholders, not disks
                if size >= 1.0 {
                    inventory[class].push(size.round() as u32);
                }
            }
        }

        Ok(inventory)
    }
}

/// Interpret a loosely typed numeric field. Missing and null are 0, numeric
/// strings are parsed, negative and non-finite values clamp to 0.
fn coerce_number(value: Option<&Value>) -> std::result::Result<f64, String> {
    let number = match value {
        None | Some(Value::Null) => return Ok(0.0),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(0.0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", s))?,
        Some(other) => return Err(format!("expected a number, got {}", other)),
    };

    if number.is_finite() && number > 0.0 {
        Ok(number)
    } else {
        Ok(0.0)
    }
}
