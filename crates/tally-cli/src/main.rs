//! tally binary: call analytics ETL for the legacy IVR store.
//!
//! Reads `tally.toml` (or the path given with `--config`), opens the
//! analytics store read-write and the legacy IVR store read-only, and runs
//! the requested command.
//!
//! # Usage
//!
//! ```
//! tally run --from 2024-01-01T00:00:00Z --to 2024-01-01T06:00:00Z
//! tally watch
//! tally jobs --limit 10
//! tally purge --days 365
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tally_core::{store::AnalyticsStore, window::TimeWindow};
use tally_etl::{Pipeline, PipelineConfig, Scheduler};
use tally_store_sqlite::{AnalyticsDb, DbRouter, IvrDb};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tally", about = "Call analytics ETL for the legacy IVR store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tally.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Run one extraction cycle and exit.
  Run {
    /// Window start (RFC 3339). Defaults to one frequency back from the end.
    #[arg(long)]
    from: Option<DateTime<Utc>>,

    /// Window end (RFC 3339). Defaults to now.
    #[arg(long)]
    to: Option<DateTime<Utc>>,
  },

  /// Run extraction on the configured cadence until interrupted.
  Watch,

  /// Show recent jobs from the run ledger.
  Jobs {
    /// Maximum rows to show.
    #[arg(long, default_value_t = 50)]
    limit: usize,
  },

  /// Delete call records older than the retention period.
  Purge {
    /// Override the configured retention, in days.
    #[arg(long)]
    days: Option<u32>,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `tally.toml`. Every key can be
/// overridden with a `TALLY__`-prefixed environment variable.
#[derive(Deserialize)]
struct TallyConfig {
  /// The analytics database. Created and migrated on open.
  primary_db: PathBuf,
  /// The legacy IVR database. Must exist; opened read-only.
  legacy_db:  PathBuf,
  #[serde(default)]
  pipeline:   PipelineConfig,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("TALLY").separator("__"))
    .build()
    .context("failed to read config file")?;

  let mut cfg: TallyConfig = settings
    .try_deserialize()
    .context("failed to deserialise TallyConfig")?;

  if let Command::Purge { days: Some(days) } = &cli.command {
    cfg.pipeline.retention_days = *days;
  }

  // Open both stores through the router.
  let primary = expand_tilde(&cfg.primary_db);
  let legacy = expand_tilde(&cfg.legacy_db);
  let router = DbRouter::open(&primary, &legacy)
    .await
    .with_context(|| format!("failed to open stores at {primary:?} / {legacy:?}"))?;

  let store = AnalyticsDb::new(router.clone());
  let pipeline =
    Pipeline::new(IvrDb::new(router), store.clone(), cfg.pipeline.clone());

  match cli.command {
    Command::Run { from, to } => {
      let window = resolve_window(from, to, cfg.pipeline.frequency_hours)?;
      let job = pipeline.run_window(window).await?;
      println!(
        "job {} {}: extracted {} transformed {} loaded {} skipped {} failed {}",
        job.job_id,
        job.status.discriminant(),
        job.counts.extracted,
        job.counts.transformed,
        job.counts.loaded,
        job.counts.skipped,
        job.counts.failed,
      );
    }

    Command::Watch => {
      let scheduler = Scheduler::start(pipeline, cfg.pipeline.frequency());
      tracing::info!(
        "running every {}h; press ctrl-c to stop",
        cfg.pipeline.frequency_hours
      );
      tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
      scheduler.stop().await;
    }

    Command::Jobs { limit } => {
      for job in store.recent_jobs(limit).await? {
        let rate = job
          .success_rate()
          .map(|r| format!("{:.0}%", r * 100.0))
          .unwrap_or_else(|| "-".to_string());
        let took = job
          .execution_seconds()
          .map(|s| format!("{s:.2}s"))
          .unwrap_or_else(|| "-".to_string());
        println!(
          "{}  {:<9}  {:<16}  loaded {}/{} ({rate}, {took})",
          job.created_at.format("%Y-%m-%d %H:%M:%S"),
          job.status.discriminant(),
          job.job_name,
          job.counts.loaded,
          job.counts.extracted,
        );
        if let Some(message) = &job.error_message {
          println!("    error: {message}");
        }
      }
    }

    Command::Purge { .. } => {
      let deleted = pipeline.purge_expired().await?;
      println!(
        "purged {deleted} call records older than {} days",
        cfg.pipeline.retention_days
      );
    }
  }

  Ok(())
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// The explicit window when either bound is given, else the window the
/// scheduler would use.
fn resolve_window(
  from: Option<DateTime<Utc>>,
  to: Option<DateTime<Utc>>,
  frequency_hours: u32,
) -> anyhow::Result<TimeWindow> {
  if from.is_none() && to.is_none() {
    return Ok(TimeWindow::last_hours(Utc::now(), frequency_hours));
  }
  let end = to.unwrap_or_else(Utc::now);
  let start =
    from.unwrap_or(end - Duration::hours(i64::from(frequency_hours)));
  Ok(TimeWindow::new(start, end)?)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
