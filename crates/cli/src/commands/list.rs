//! Listing command

use anyhow::Result;
use clap::{Args, ValueEnum};
use scout_lib::filter::ram_scale::format_ram;
use scout_lib::{Listing, ViewStatus};
use std::cmp::Ordering;
use std::sync::Arc;
use tabled::Tabled;

use super::filters::FilterArgs;
use super::Context;
use crate::output::{
    color_count, format_countdown, format_disks, format_price, print_json, print_table,
    print_warning, OutputFormat,
};

/// Sort order for listed machines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    #[default]
    Price,
    Ram,
    Cpu,
    Datacenter,
    /// Total raw disk capacity
    Storage,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Sort key
    #[arg(long, value_enum, default_value_t = SortKey::Price)]
    pub sort: SortKey,

    /// Sort in descending order
    #[arg(long)]
    pub desc: bool,

    /// Show at most this many listings
    #[arg(long, short)]
    pub limit: Option<usize>,
}

/// Row for the listings table
#[derive(Tabled)]
pub struct ListingRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "RAM")]
    ram: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Datacenter")]
    datacenter: String,
    #[tabled(rename = "NVMe")]
    nvme: String,
    #[tabled(rename = "SATA")]
    sata: String,
    #[tabled(rename = "HDD")]
    hdd: String,
    #[tabled(rename = "Next drop")]
    next_drop: String,
}

impl From<&Listing> for ListingRow {
    fn from(listing: &Listing) -> Self {
        let cpu = if listing.cpu_count > 1 {
            format!("{}x {}", listing.cpu_count, listing.cpu)
        } else {
            listing.cpu.clone()
        };
        let ram = if listing.ecc {
            format!("{} ECC", format_ram(listing.ram_size_gb))
        } else {
            format_ram(listing.ram_size_gb)
        };

        Self {
            id: listing.id,
            cpu,
            ram,
            price: format_price(listing.price_monthly),
            datacenter: listing.datacenter.clone(),
            nvme: format_disks(&listing.disks.nvme),
            sata: format_disks(&listing.disks.sata),
            hdd: format_disks(&listing.disks.hdd),
            next_drop: format_countdown(listing.next_reduce_secs),
        }
    }
}

/// Load the feed, filter it with the given flags and print the result
pub async fn list_listings(ctx: &Context, args: ListArgs) -> Result<()> {
    let session = ctx.session();
    let snapshot = ctx.load_into(&session).await?;

    session.update_filter(args.filters.apply(session.filter(), snapshot.bounds()));
    let view = session.apply_now();
    let status = view.status();

    let mut listings = view.listings;
    sort_listings(&mut listings, args.sort, args.desc);
    if let Some(limit) = args.limit {
        listings.truncate(limit);
    }

    match ctx.format {
        OutputFormat::Json => {
            let listings: Vec<&Listing> = listings.iter().map(|l| l.as_ref()).collect();
            print_json(&listings)?;
        }
        OutputFormat::Table => match status {
            ViewStatus::Empty => print_warning("The feed contains no listings"),
            ViewStatus::NoMatches => print_warning(&format!(
                "No listings match the current filters ({} loaded)",
                view.total
            )),
            ViewStatus::Showing(visible) => {
                let rows: Vec<ListingRow> =
                    listings.iter().map(|l| ListingRow::from(l.as_ref())).collect();
                print_table(&rows);
                println!("\nShowing {} listings", color_count(visible, view.total));
            }
        },
    }

    Ok(())
}

pub fn sort_listings(listings: &mut [Arc<Listing>], key: SortKey, descending: bool) {
    listings.sort_by(|a, b| {
        let ordering = compare(a, b, key);
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn compare(a: &Listing, b: &Listing, key: SortKey) -> Ordering {
    match key {
        SortKey::Price => a.price_monthly.total_cmp(&b.price_monthly),
        SortKey::Ram => a.ram_size_gb.cmp(&b.ram_size_gb),
        SortKey::Cpu => a.cpu.to_lowercase().cmp(&b.cpu.to_lowercase()),
        SortKey::Datacenter => a.datacenter.cmp(&b.datacenter),
        SortKey::Storage => a
            .disks
            .total_capacity_gb()
            .cmp(&b.disks.total_capacity_gb()),
    }
}
