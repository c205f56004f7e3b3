//! Bounds command

use anyhow::Result;
use chrono::{DateTime, Utc};
use scout_lib::filter::ram_scale::{format_ram, ram_marks, unscale};
use scout_lib::{Bounds, ClassBounds, PerClass, Snapshot};
use serde::Serialize;
use tabled::Tabled;

use super::Context;
use crate::output::{format_price, print_info, print_json, print_table, print_warning, OutputFormat};

/// Bounds of the loaded dataset, as printed in JSON
#[derive(Serialize)]
struct BoundsReport {
    source: String,
    loaded_at: Option<DateTime<Utc>>,
    listings: usize,
    max_price: f64,
    max_ram_gb: u32,
    disks: PerClass<ClassBounds>,
    ram_marks: Vec<RamMark>,
}

/// One tick on the RAM slider
#[derive(Serialize, Tabled)]
struct RamMark {
    #[tabled(rename = "RAM")]
    label: String,
    #[tabled(skip)]
    gb: u32,
    #[tabled(rename = "Slider")]
    position: u32,
}

/// Row for the bounds table
#[derive(Tabled)]
struct BoundRow {
    #[tabled(rename = "Filter")]
    dimension: String,
    #[tabled(rename = "Upper bound")]
    bound: String,
}

impl BoundsReport {
    fn new(snapshot: &Snapshot) -> Self {
        let bounds = snapshot.bounds();

        Self {
            source: snapshot.source().to_string(),
            loaded_at: snapshot.loaded_at(),
            listings: snapshot.len(),
            max_price: bounds.max_price,
            max_ram_gb: bounds.max_ram,
            disks: bounds.disks.clone(),
            ram_marks: marks(bounds),
        }
    }
}

fn marks(bounds: &Bounds) -> Vec<RamMark> {
    ram_marks(bounds.max_ram)
        .into_iter()
        .map(|gb| RamMark {
            label: format_ram(gb),
            gb,
            position: unscale(gb, bounds.max_ram).round() as u32,
        })
        .collect()
}

fn bound_rows(bounds: &Bounds) -> Vec<BoundRow> {
    let mut rows = vec![
        BoundRow {
            dimension: "Price".to_string(),
            bound: format_price(bounds.max_price),
        },
        BoundRow {
            dimension: "RAM".to_string(),
            bound: format_ram(bounds.max_ram),
        },
    ];

    for (class, class_bounds) in bounds.disks.iter() {
        rows.push(BoundRow {
            dimension: format!("{} size", class),
            bound: format!("{} GB", class_bounds.max_size),
        });
        rows.push(BoundRow {
            dimension: format!("{} count", class),
            bound: class_bounds.max_count.to_string(),
        });
    }

    rows
}

/// Load the feed and print the range of every filter
pub async fn show_bounds(ctx: &Context) -> Result<()> {
    let snapshot = ctx.load().await?;
    let report = BoundsReport::new(&snapshot);

    match ctx.format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            if snapshot.is_empty() {
                print_warning("The feed contains no listings");
                return Ok(());
            }

            print_info(&format!("{} listings from {}", report.listings, report.source));
            print_table(&bound_rows(snapshot.bounds()));
            println!("\nRAM slider marks:");
            print_table(&report.ram_marks);
        }
    }

    Ok(())
}
