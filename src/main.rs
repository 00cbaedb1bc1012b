//! videostore — export stored video segments for a time range.
//!
//! Usage:
//!   videostore concat --config config.toml --from 2026-03-01_12-00-05 --to 2026-03-01_12-00-25 --output clip.mp4
//!   videostore list   --config config.toml [--json]
//!   videostore sweep  --config config.toml

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use videostore::concat::sweep::sweep_plan_files;
use videostore::concat::Concater;
use videostore::config::Config;
use videostore::storage::catalog::{list_segments, parse_segment_stamp};

#[derive(Parser)]
#[command(name = "videostore", about = "Video segment store export tool", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Concatenate stored segments covering [from, to) into one file.
    Concat {
        /// Path to the TOML configuration file.
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
        /// Range start (RFC 3339 or YYYY-MM-DD_HH-MM-SS, UTC).
        #[arg(long, value_parser = parse_time)]
        from: DateTime<Utc>,
        /// Range end, exclusive.
        #[arg(long, value_parser = parse_time)]
        to: DateTime<Utc>,
        /// Output video path.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List stored segments in chronological order.
    List {
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Remove plan files left behind by an interrupted process.
    Sweep {
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    parse_segment_stamp(s)
        .ok_or_else(|| format!("'{s}' is neither RFC 3339 nor YYYY-MM-DD_HH-MM-SS"))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Concat { config, from, to, output } => run_concat(config, from, to, output).await,
        Command::List { config, json } => run_list(config, json),
        Command::Sweep { config } => run_sweep(config),
    };

    if let Err(e) = result {
        error!(error = ?e, "Command failed");
        std::process::exit(1);
    }
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    Config::from_file(path).with_context(|| format!("loading {}", path.display()))
}

async fn run_concat(
    config_path: PathBuf,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    output: PathBuf,
) -> anyhow::Result<()> {
    let cfg = load_config(&config_path)?;
    info!(
        storage = ?cfg.storage.path,
        plan_dir = ?cfg.concat.plan_dir,
        segment_secs = cfg.storage.segment_duration_secs,
        "Starting export"
    );

    let concater = Arc::new(Concater::from_config(&cfg)?);
    concater
        .concat_in_background(from, to, output.clone())
        .await
        .with_context(|| format!("exporting {from} — {to} to {}", output.display()))?;

    println!("{}", output.display());
    Ok(())
}

fn run_list(config_path: PathBuf, json: bool) -> anyhow::Result<()> {
    let cfg = load_config(&config_path)?;
    let segments = list_segments(
        &cfg.storage.path,
        cfg.storage.segment_duration(),
        &cfg.storage.extension,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&segments)?);
        return Ok(());
    }

    println!("=== Stored segments ({}) ===", segments.len());
    for seg in &segments {
        println!("{}  {}  {}", seg.start, seg.end(), seg.path.display());
    }
    Ok(())
}

fn run_sweep(config_path: PathBuf) -> anyhow::Result<()> {
    let cfg = load_config(&config_path)?;
    let dir = &cfg.concat.plan_dir;
    let removed = sweep_plan_files(dir).with_context(|| format!("sweeping {}", dir.display()))?;
    println!("Removed {removed} plan file(s) from {}", dir.display());
    Ok(())
}
