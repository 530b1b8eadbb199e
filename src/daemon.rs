//! NoteMover Daemon (notemoverd)
//!
//! Watches a vault and routes notes as they are created, edited or renamed.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often pending watch events are drained
const TICK: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(name = "notemoverd")]
#[command(author, version, about = "NoteMover background daemon")]
struct Cli {
    /// Path to settings file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Vault root directory
    #[arg(long, value_name = "DIR", default_value = ".")]
    vault: PathBuf,

    /// Seconds a note must go quiet before it is routed
    #[arg(long, default_value_t = 2)]
    debounce: u64,

    /// Poll interval in seconds for backends without native events
    #[arg(long, default_value_t = 5)]
    poll: u64,

    /// Show desktop notifications
    #[arg(long)]
    notify: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("NOTEMOVER_LOG").unwrap_or_else(|_| "info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    notemover::notifications::init(cli.notify);
    run_daemon(cli).await
}

async fn run_daemon(cli: Cli) -> Result<()> {
    let settings = notemover::Settings::load(cli.config.as_deref())?;
    info!(
        "Loaded settings with {} rule groups and {} rules",
        settings.groups.len(),
        settings.rule_count()
    );
    if settings.status_bar_trigger_indicator {
        info!("Trigger: {}", settings.trigger_auto_manual.indicator());
    }

    let root = notemover::expand_path(&cli.vault);
    let root = std::fs::canonicalize(&root)
        .with_context(|| format!("Vault not found: {}", root.display()))?;
    let vault = notemover::Vault::new(root.clone());
    let router = notemover::Router::new(&settings, notemover::FsMover::new(root));

    let debounce = Duration::from_secs(cli.debounce);
    let mut watcher = notemover::Watcher::new(vault, router, cli.poll, debounce)?;
    watcher.watch()?;

    info!("Daemon running. Press Ctrl+C to stop.");

    let mut ticker = tokio::time::interval(TICK);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = watcher.process_events() {
                    error!("Event processing failed: {:#}", e);
                }
            }
            res = tokio::signal::ctrl_c() => {
                res?;
                break;
            }
        }
    }

    info!("Shutting down... {} notes moved", watcher.files_moved());
    watcher.unwatch()?;
    Ok(())
}
