//! Interactive filter shell
//!
//! Reads `key=value` edits from stdin and feeds them to a `FilterSession`.
//! Each edit is echoed immediately; the filtered view is recomputed once
//! input has been quiet for the debounce window and printed as a summary.

use anyhow::{Context as _, Result};
use scout_lib::{Bounds, FilterState, FilteredView, ListingRepository, ScoutError, ViewStatus};
use serde::Serialize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::filters::{describe_ram, FilterEdit};
use super::list::ListingRow;
use super::Context;
use crate::output::{
    color_count, format_price, print_error, print_info, print_json, print_success, print_table,
    print_warning, OutputFormat,
};

/// Rows printed by `show` and at exit
const PREVIEW_ROWS: usize = 10;

const HELP: &str = "\
Edits (applied after a short pause in input):
  cpu=<text>             CPU model substring
  price=<eur>            maximum monthly price
  ram=<min>..<max>       RAM range in GB (min_ram=, max_ram= for one side)
  ram_slider=<a>..<b>    RAM range as slider positions 0..100
  <class>_size=<a>..<b>  disk size range in GB (class: nvme, sata, hdd)
  <class>_count=<a>..<b> number of disks in the size range
Commands: show, filter, reset, refresh, help, quit";

/// Compact view summary for JSON output
#[derive(Serialize)]
struct ViewSummary {
    generation: u64,
    total: usize,
    visible: usize,
    active: Vec<String>,
}

impl ViewSummary {
    fn new(view: &FilteredView, bounds: &Bounds) -> Self {
        Self {
            generation: view.generation,
            total: view.total,
            visible: view.len(),
            active: view
                .filter
                .active_dimensions(bounds)
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Run the shell until stdin closes or `quit` is entered
pub async fn run_shell(ctx: &Context) -> Result<()> {
    let session = ctx.session();
    let snapshot = ctx.load_into(&session).await?;

    print_info(&format!(
        "Loaded {} listings from {}",
        snapshot.len(),
        snapshot.source()
    ));
    println!("{}", HELP);

    let printer = spawn_view_printer(
        session.subscribe_view(),
        session.repository().clone(),
        ctx.format,
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read from stdin")?
    {
        match line.trim() {
            "" => continue,
            "quit" | "exit" => break,
            "help" => println!("{}", HELP),
            "show" => print_view(&session.view(), ctx.format)?,
            "filter" => {
                let bounds = session.repository().snapshot().bounds().clone();
                print_info(&describe_filter(&session.filter(), &bounds));
            }
            "reset" => {
                session.reset();
                print_success("Filters reset to the dataset bounds");
            }
            "refresh" => match ctx.load_into(&session).await {
                Ok(snapshot) => print_success(&format!(
                    "Reloaded {} listings (generation {})",
                    snapshot.len(),
                    snapshot.generation()
                )),
                Err(e) if is_superseded(&e) => {}
                Err(e) => print_error(&format!("{:#}", e)),
            },
            line => match FilterEdit::parse(line) {
                Ok(edit) => {
                    let bounds = session.repository().snapshot().bounds().clone();
                    session.edit(|filter| edit.apply(filter, &bounds));
                    print_info(&describe_filter(&session.filter(), &bounds));
                }
                Err(e) => print_error(&format!("{} (type 'help' for the syntax)", e)),
            },
        }
    }

    // Stop the printer first so the final view is only printed once
    printer.abort();
    let view = session.apply_now();
    print_view(&view, ctx.format)?;

    Ok(())
}

fn spawn_view_printer(
    mut views: watch::Receiver<FilteredView>,
    repository: Arc<ListingRepository>,
    format: OutputFormat,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            let snapshot = repository.snapshot();
            print_summary(&view, snapshot.bounds(), format);
        }
    })
}

fn print_summary(view: &FilteredView, bounds: &Bounds, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            if let Err(e) = print_json(&ViewSummary::new(view, bounds)) {
                print_error(&e.to_string());
            }
        }
        OutputFormat::Table => match view.status() {
            ViewStatus::Empty => print_warning("No listings loaded"),
            ViewStatus::NoMatches => print_warning(&format!(
                "No listings match the current filters ({} loaded)",
                view.total
            )),
            ViewStatus::Showing(visible) => {
                println!("Showing {} listings", color_count(visible, view.total))
            }
        },
    }
}

fn print_view(view: &FilteredView, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let listings: Vec<_> = view.listings.iter().map(|l| l.as_ref()).collect();
            print_json(&listings)?;
        }
        OutputFormat::Table => {
            if view.is_empty() {
                print_summary(view, &Bounds::default(), format);
                return Ok(());
            }

            let rows: Vec<ListingRow> = view
                .listings
                .iter()
                .take(PREVIEW_ROWS)
                .map(|l| ListingRow::from(l.as_ref()))
                .collect();
            print_table(&rows);
            println!(
                "\nShowing {} listings",
                color_count(view.len(), view.total)
            );
        }
    }

    Ok(())
}

/// One-line rendering of the constraints currently in effect
fn describe_filter(filter: &FilterState, bounds: &Bounds) -> String {
    let active = filter.active_dimensions(bounds);
    if active.is_empty() {
        return "No filters active".to_string();
    }

    let mut parts = Vec::new();
    if !filter.cpu_substring.trim().is_empty() {
        parts.push(format!("cpu~'{}'", filter.cpu_substring.trim()));
    }
    if filter.max_price > 0.0 && filter.max_price < bounds.max_price {
        parts.push(format!("price<={}", format_price(filter.max_price)));
    }
    if filter.min_ram > 0 || (filter.max_ram > 0 && filter.max_ram < bounds.max_ram) {
        parts.push(format!("ram={}", describe_ram(filter, bounds)));
    }
    for (class, class_filter) in filter.disks.iter() {
        if class_filter.is_active(&bounds.disks[class]) {
            parts.push(format!(
                "{}: size {}..{} GB, count {}..{}",
                class,
                class_filter.min_size,
                class_filter.max_size,
                class_filter.min_count,
                class_filter.max_count
            ));
        }
    }

    parts.join("; ")
}

fn is_superseded(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<ScoutError>()
        .map_or(false, ScoutError::is_superseded)
}
