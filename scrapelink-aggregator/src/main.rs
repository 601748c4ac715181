//! Render the merged scrape configuration from a captured channel state.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use scrapelink_aggregator::{RenderConfig, ScrapeAggregator};
use scrapelink_common::{
    DEFAULT_ENDPOINT_NAME, EndpointDecl, EndpointRole, INTERFACE_NAME, init_tracing,
};

/// Render scrape jobs from a Scrapelink channel state.
#[derive(Parser, Debug)]
#[command(name = "scrapelink-aggregator")]
#[command(about = "Expand a captured channel state into concrete scrape jobs")]
#[command(version)]
struct Args {
    /// Path to the channel state file (JSON5 format).
    #[arg(short, long)]
    state: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Emit compact JSON instead of pretty-printed output.
    #[arg(long)]
    compact: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = RenderConfig::load(&args.state)?;
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    init_tracing(&config.logging)?;

    let declared = [EndpointDecl::new(
        DEFAULT_ENDPOINT_NAME,
        INTERFACE_NAME,
        EndpointRole::Requires,
    )];
    let aggregator = ScrapeAggregator::new(&declared, DEFAULT_ENDPOINT_NAME)?;

    let channel = config.build_channel();
    let jobs = aggregator.jobs(&channel);

    info!(
        publishers = config.publishers.len(),
        jobs = jobs.len(),
        "Rendered scrape configuration"
    );

    let output = if args.compact {
        serde_json::to_string(&jobs)?
    } else {
        serde_json::to_string_pretty(&jobs)?
    };
    println!("{output}");

    Ok(())
}
