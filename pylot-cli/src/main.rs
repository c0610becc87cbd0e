//! Pylot CLI
//!
//! Runs the navigation loop against the live screen, or inspects the
//! configuration it would run with.
//!
//! Usage:
//!   pylot run                   # explore until ctrl-c
//!   pylot run --dry-run         # log pointer actions instead of clicking
//!   pylot check                 # validate configuration files
//!   pylot resolve Otel0 Kin0    # show how OCR text would resolve

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pylot::config::CATALOG_FILE;
use pylot::sequencer::DEFAULT_RESERVED_TAIL;
use pylot::{CancellationToken, Catalog, Matcher, Navigator, PilotConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod utils;

#[derive(Parser)]
#[command(name = "pylot")]
#[command(about = "Screen-reading explorer for a fixed route of systems")]
struct Cli {
    /// Directory holding pochven.txt, screen_config.yaml, destination.txt and key.txt
    #[arg(long, global = true, default_value = ".", env = "PYLOT_CONFIG_DIR")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Explore the route until interrupted
    Run(RunArgs),
    /// Load and validate the configuration, then print a summary
    Check(Tuning),
    /// Resolve text against the catalog
    Resolve {
        #[command(flatten)]
        tuning: Tuning,

        /// Text as the OCR would read it
        #[arg(required = true)]
        texts: Vec<String>,
    },
}

#[derive(Args, Debug, Clone)]
struct Tuning {
    /// Reject catalog matches scoring below this (0 accepts any best match)
    #[arg(long, default_value_t = 0.0, env = "PYLOT_MIN_SCORE")]
    min_score: f64,

    /// Trailing catalog entries that are not part of the route
    #[arg(long, default_value_t = DEFAULT_RESERVED_TAIL)]
    reserved_tail: usize,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    tuning: Tuning,

    /// Grayscale cut-off applied before OCR
    #[arg(long, default_value_t = pylot::config::DEFAULT_THRESHOLD)]
    threshold: u8,

    /// Position polls after a jump before moving on
    #[arg(long, default_value_t = 50)]
    await_attempts: u32,

    /// Log pointer actions instead of performing them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::init_logging(&cli.config_dir)?;

    match cli.command {
        Commands::Run(args) => run(&cli.config_dir, args).await,
        Commands::Check(tuning) => check(&cli.config_dir, &tuning),
        Commands::Resolve { tuning, texts } => resolve(&cli.config_dir, &tuning, &texts),
    }
}

fn load_config(dir: &Path, tuning: &Tuning) -> Result<PilotConfig> {
    let config = PilotConfig::from_dir(dir)
        .with_context(|| format!("Failed to load configuration from {}", dir.display()))?
        .with_min_score(tuning.min_score)
        .with_reserved_tail(tuning.reserved_tail);
    config.sequencer()?;
    config.matcher()?;
    Ok(config)
}

async fn run(dir: &Path, args: RunArgs) -> Result<()> {
    let mut config = load_config(dir, &args.tuning)?.with_threshold(args.threshold);
    config.pacing.await_attempts = args.await_attempts;

    let navigator = Navigator::from_config(Arc::new(config), args.dry_run)?;
    let cancel = CancellationToken::new();
    tokio::spawn(watch_shutdown(cancel.clone()));

    tracing::info!(dry_run = args.dry_run, "Starting navigation loop");
    let stats = navigator.run(cancel).await?;
    tracing::info!(
        cycles = stats.cycles,
        arrivals = stats.arrivals,
        failures = stats.failures,
        "Navigation loop finished"
    );
    Ok(())
}

/// Cancel on ctrl-c or SIGTERM. The loop finishes its current cycle first.
async fn watch_shutdown(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }

    tracing::info!("Shutdown requested, stopping after the current cycle");
    cancel.cancel();
}

fn check(dir: &Path, tuning: &Tuning) -> Result<()> {
    let config = load_config(dir, tuning)?;
    let sequencer = config.sequencer()?;
    let names = config.catalog.names();

    println!("Catalog:   {} systems", names.len());
    println!(
        "Route:     {} -> {} ({} waypoints)",
        names[0],
        names[sequencer.cycle_len() - 1],
        sequencer.cycle_len()
    );
    if sequencer.cycle_len() < names.len() {
        println!("Reserved:  {}", names[sequencer.cycle_len()..].join(", "));
    }
    println!("Jump:      {}", config.screen.jump);
    println!("Scan:      {}", config.screen.scan);
    println!("Overview:  {}", config.screen.overview);
    println!("System:    {}", config.screen.system);
    println!("Probe:     {}", config.screen.probe);
    println!("DScan:     {}", config.screen.dscan);
    println!("Endpoint:  {}", config.endpoint);
    println!("Key:       {} characters", config.key.chars().count());
    Ok(())
}

fn resolve(dir: &Path, tuning: &Tuning, texts: &[String]) -> Result<()> {
    let catalog = Catalog::load(dir.join(CATALOG_FILE))?;
    let matcher = Matcher::new(Arc::new(catalog)).with_min_score(tuning.min_score)?;
    for text in texts {
        println!("{text:>20}  =>  {}", matcher.resolve(text));
    }
    Ok(())
}
