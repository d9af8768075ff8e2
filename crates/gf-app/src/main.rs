//! Command-line entry point: filter the rows of a CSV file

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gf_core::Row;
use gf_data::{
    ClauseFilter, CsvRowSource, FilterConfig, FilterSpec, FilterableRowStore, SortArgs,
    SortDirection,
};

/// Filter and sort the rows of a CSV file with clause filters
#[derive(Debug, Parser)]
#[command(name = "gridfilter", version)]
struct Args {
    /// CSV file to load
    csv: PathBuf,

    /// JSON file with an array of filter clauses
    #[arg(long)]
    filter: Option<PathBuf>,

    /// JSON file with filter configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Field to sort the visible rows by
    #[arg(long)]
    sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    desc: bool,

    /// Print at most this many rows
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    run(Args::parse())
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => FilterConfig::load(path)
            .with_context(|| format!("reading filter config {}", path.display()))?,
        None => FilterConfig::default(),
    };

    let rows = CsvRowSource::new(&args.csv)
        .with_null_config(config.null_config.clone())
        .load()
        .with_context(|| format!("loading {}", args.csv.display()))?;

    let spec = match &args.filter {
        Some(path) => Some(
            FilterSpec::load(path).with_context(|| format!("reading filter {}", path.display()))?,
        ),
        None => None,
    };

    let filter_fn = spec
        .clone()
        .map(|spec| ClauseFilter::new(config.clone()).into_filter_fn(spec));
    let mut store: FilterableRowStore<Row> = FilterableRowStore::new(rows, filter_fn);

    let filter_events = Arc::new(AtomicUsize::new(0));
    let counter = filter_events.clone();
    store.on_filter_state_change(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    if let Some(spec) = &spec {
        info!(clauses = spec.len(), "Applying filter");
        store.filter().context("applying filter")?;
    }

    if let Some(field) = &args.sort {
        let direction = if args.desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        store.sort(SortArgs::new(field.clone(), direction));
    }

    info!(
        visible = store.get_length(),
        total = store.get_length_non_filtered(),
        filter_events = filter_events.load(Ordering::SeqCst),
        "Rows ready"
    );

    let limit = args.limit.unwrap_or(usize::MAX);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for row in store.get_items().iter().take(limit) {
        serde_json::to_writer(&mut out, &**row)?;
        writeln!(out)?;
    }
    out.flush()?;

    Ok(())
}
