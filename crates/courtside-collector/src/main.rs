//! `courtside` binary.
//!
//! Reads `courtside.toml` (or the path given with `--config`) and the
//! `COURTSIDE_*` environment, then either collects into the SQLite store or
//! reports what the store holds.
//!
//! ```text
//! courtside collect                      # every stage
//! courtside collect --stage observations # from observations on
//! courtside collect --stage metrics --only --season 2023-24
//! courtside status
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use courtside_collector::{
  CollectorConfig, HttpSource, Orchestrator,
  pace::{Pacer, TokioSleeper, UniformJitter},
};
use courtside_core::{season::SeasonId, stage::Stage, store::StatsStore};
use courtside_store_sqlite::SqliteStore;
use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Basketball statistics collector")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "courtside.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Collect from the upstream sources into the store.
  Collect {
    /// First stage to run.
    #[arg(long, default_value_t = Stage::Teams)]
    stage: Stage,

    /// Run only `--stage`, not the stages after it.
    #[arg(long)]
    only: bool,

    /// Season to collect, e.g. 2024-25. Defaults to the configured one.
    #[arg(long)]
    season: Option<SeasonId>,
  },

  /// Print the row count of every table.
  Status,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = CollectorConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let db_path = expand_tilde(&cfg.database.path);
  let store = SqliteStore::open(&db_path, cfg.database.pool_size)
    .await
    .with_context(|| format!("failed to open store at {db_path:?}"))?;

  match cli.command {
    Command::Collect { stage, only, season } => {
      collect(store, &cfg, stage, only, season).await
    }
    Command::Status => status(&store).await,
  }
}

async fn collect(
  store: SqliteStore,
  cfg: &CollectorConfig,
  stage: Stage,
  only: bool,
  season: Option<SeasonId>,
) -> anyhow::Result<()> {
  let source = HttpSource::new(cfg.provider.clone(), cfg.web.clone())?;
  let pacer = Pacer::new(TokioSleeper, UniformJitter);
  let mut orchestrator = Orchestrator::new(store, source, pacer, cfg);
  if let Some(season) = season {
    orchestrator = orchestrator.with_season(season);
  }

  let stop = orchestrator.stop_signal();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("interrupted; stopping after the current batch");
      stop.stop();
    }
  });

  if only {
    let report = orchestrator
      .run_stage(stage)
      .await
      .with_context(|| format!("stage {stage} aborted"))?;
    report.log();
    println!("{report}");
    return Ok(());
  }

  let summary = orchestrator.run(stage).await.context("collection aborted")?;
  for report in &summary.stages {
    println!("{report}");
  }
  if summary.stopped {
    println!("stopped before completion");
  }
  Ok(())
}

async fn status(store: &SqliteStore) -> anyhow::Result<()> {
  let counts = store.table_counts().await.context("failed to count rows")?;
  for count in counts {
    println!("{:<24}{:>10}", count.table, count.rows);
  }
  Ok(())
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
