//! Server auction scout CLI
//!
//! A command-line tool for browsing the dedicated-server auction feed,
//! filtering listings and exploring filters interactively.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{bounds, list, shell, Context};
use scout_lib::feed::create_source;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Server auction scout
#[derive(Parser)]
#[command(name = "scout")]
#[command(author, version, about = "Browse and filter dedicated-server auction listings", long_about = None)]
pub struct Cli {
    /// Feed URL or path to a saved feed document (overrides SCOUT_FEED_URL)
    #[arg(long, short, global = true)]
    pub source: Option<String>,

    /// Output format
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Print collected metrics to stderr on exit
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List listings matching the given filters
    List(list::ListArgs),

    /// Show the range of every filter for the current feed
    Bounds,

    /// Edit filters interactively from stdin
    Shell,
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    // Load configuration
    let config = config::ScoutConfig::load()?;
    let format = cli.format.or(config.default_format).unwrap_or_default();
    let feed = config.feed_config(cli.source.as_deref());
    debug!(source = %feed.location, "Configured feed");

    let ctx = Context::new(create_source(&feed)?, config.session_config(), format);

    // Execute command
    let result = match cli.command {
        Commands::List(args) => list::list_listings(&ctx, args).await,
        Commands::Bounds => bounds::show_bounds(&ctx).await,
        Commands::Shell => shell::run_shell(&ctx).await,
    };

    if cli.metrics {
        eprintln!("{}", ctx.metrics.gather_text());
    }

    result
}
