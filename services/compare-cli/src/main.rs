//! Headless comparison front-end.
//!
//! Resolves the explore query, loads every comparison slot and writes tiles,
//! legends and a status file per slot.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ntl_common::tile::MAX_ZOOM;
use tokio::task::LocalSet;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use viewer::{ExploreQuery, ViewerConfig};

use compare_cli::{run, CompareOptions};

#[derive(Parser, Debug)]
#[command(name = "compare-cli")]
#[command(about = "Render a night-light comparison to PNG tiles and legends")]
struct Args {
    /// Viewer config file (YAML)
    #[arg(short, long, env = "NTL_CONFIG")]
    config: Option<PathBuf>,

    /// Backend base URL, overrides the config file
    #[arg(long, env = "NTL_API_URL")]
    api_url: Option<String>,

    /// Explore query, e.g. "date=2023-01-05&admin=CHE&compare=true"
    #[arg(short, long, default_value = "")]
    query: String,

    /// Output directory
    #[arg(short, long, default_value = "out")]
    out: PathBuf,

    /// Zoom level of the written tiles (default: the slot's fitted zoom)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=MAX_ZOOM as i64))]
    zoom_tiles: Option<u32>,

    /// Maximum number of tiles written per slot
    #[arg(long, default_value_t = 256)]
    max_tiles: usize,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args)?;

    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ViewerConfig::load_or_default(std::path::Path::new(
            viewer::config::DEFAULT_CONFIG_PATH,
        ))?,
    };
    config.apply_env_overrides();
    if let Some(url) = &args.api_url {
        config.api.base_url = url.clone();
    }

    let options = CompareOptions {
        config,
        query: ExploreQuery::parse(&args.query),
        out_dir: args.out.clone(),
        zoom: args.zoom_tiles,
        max_tiles: args.max_tiles,
        retries: 1,
    };

    // Surfaces and renderers are single-threaded.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let summary = LocalSet::new().block_on(&runtime, run(options))?;

    let failed = summary.failed_slots();
    info!(
        region = ?summary.region,
        date = ?summary.date,
        slots = summary.slots.len(),
        failed = failed,
        out = %args.out.display(),
        "Comparison written"
    );
    if failed > 0 {
        warn!(failed = failed, "Some slots could not be loaded");
    }
    Ok(())
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder().with_max_level(level);
    if args.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}
