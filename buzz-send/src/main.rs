//! buzz-send - Background daemon for scheduled posting
//!
//! Polls the scheduled post queue and publishes each post to Twitter and/or
//! LinkedIn once it comes due.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use libbuzz::{BuzzError, BuzzService, Config};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "buzz-send")]
#[command(version)]
#[command(about = "Background daemon for scheduled posting")]
#[command(long_about = "\
buzz-send - Background daemon for scheduled posting

DESCRIPTION:
    buzz-send is a long-running daemon that watches the Buzzalicious queue
    and publishes scheduled posts to Twitter and LinkedIn when they are due.

    Every poll it claims each due post before calling any platform, so a
    post is published at most once even with several daemons running.
    Results for each platform are written back to the post.

USAGE:
    # Run in foreground (logs to stderr)
    buzz-send

    # Run with custom poll interval
    buzz-send --poll-interval 30

    # Enable verbose logging
    buzz-send --verbose

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (finishes the current poll)

CONFIGURATION:
    Configuration file: ~/.config/buzzalicious/config.toml
    Database location: ~/.local/share/buzzalicious/buzz.db

    [dispatch]
    poll_interval = 60       # seconds between polls
    publish_timeout = 30     # seconds allowed per platform call
    stale_claim_after = 900  # fail posts stuck mid-publish after this long
    concurrency = 1          # posts processed at once

    Override with environment variables:
        BUZZ_CONFIG      - Path to config file
        BUZZ_DB_PATH     - Path to database file
        BUZZ_LOG_FORMAT  - text, json or pretty
        BUZZ_LOG_LEVEL   - error, warn, info, debug, trace

EXIT CODES:
    0 - Clean shutdown
    1 - Runtime error
    2 - Configuration or database error
")]
struct Cli {
    /// Poll interval in seconds (overrides config)
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    #[arg(help = "How often to check for due posts (default: 60)")]
    poll_interval: Option<u64>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    #[arg(help = "Enable verbose logging (useful for debugging)")]
    verbose: bool,

    /// Run once and exit (for testing)
    #[arg(long, hide = true)]
    #[arg(help = "Process due posts once, print the tick report as JSON and exit")]
    once: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libbuzz::logging::init_from_env("info", cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<BuzzError>()
            .map(BuzzError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(poll_interval) = cli.poll_interval {
        config.dispatch.poll_interval = poll_interval;
    }

    let service = BuzzService::from_config(config).await?;
    let dispatcher = service.dispatcher();

    if cli.once {
        let report = dispatcher.tick().await;
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    info!("buzz-send daemon starting");

    let shutdown = Arc::new(AtomicBool::new(false));
    spawn_signal_listener(shutdown.clone()).context("failed to install signal handlers")?;

    dispatcher.run(shutdown).await;

    info!("buzz-send daemon stopped");
    Ok(())
}

/// Set `shutdown` on the first SIGINT or SIGTERM
#[cfg(unix)]
fn spawn_signal_listener(shutdown: Arc<AtomicBool>) -> std::io::Result<()> {
    use futures::stream::StreamExt;
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook_tokio::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    tokio::spawn(async move {
        if let Some(signal) = signals.next().await {
            info!(signal, "received shutdown signal, stopping after the current poll");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    Ok(())
}

#[cfg(not(unix))]
fn spawn_signal_listener(shutdown: Arc<AtomicBool>) -> std::io::Result<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl-C, stopping after the current poll");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    Ok(())
}
