#![doc = include_str!("../README.md")]

mod challenge;
mod config;
mod telemetry;

use challenge::ChallengeFinder;
use clap::Parser;
use config::{ChallengeConfig, CliArgs};
use dataqueue::CancellationToken;
use std::time::{Duration, Instant};
use telemetry::init_tracing;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ChallengeConfig::try_from(args)?;

    init_tracing(config.json_logs)?;
    log_startup_info(&config);

    let token = CancellationToken::new();
    let deadline = tokio::spawn(cancel_on_deadline(token.clone(), config.timeout));

    let finder = ChallengeFinder::new(config.difficulty, config.threshold);
    let started = Instant::now();
    dataqueue::start(&token, &finder, config.producers, config.consumers).await?;
    let elapsed = started.elapsed();

    // Release the deadline task if the run finished on its own.
    token.cancel();
    deadline.await?;

    match finder.hit() {
        Some(hit) => tracing::info!(
            "Found {hit} after {} draws in {}ms",
            finder.draws(),
            elapsed.as_millis()
        ),
        None => tracing::info!(
            "No challenge found after {} draws in {}ms",
            finder.draws(),
            elapsed.as_millis()
        ),
    }

    Ok(())
}

fn log_startup_info(config: &ChallengeConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting challenge with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting challenge with {} producers and {} consumers",
            config.producers,
            config.consumers
        );
    }
}

/// Cancels `token` once `timeout` elapses or Ctrl+C is received, whichever
/// comes first. Returns early if `token` is cancelled elsewhere.
async fn cancel_on_deadline(token: CancellationToken, timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = token.cancelled() => return,
        () = tokio::time::sleep(timeout) => {
            tracing::info!("Deadline of {}ms reached", timeout.as_millis());
        },
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
    }

    token.cancel();
}
