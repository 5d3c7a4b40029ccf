//! Structured logging for the challenge binary.
//!
//! - Filtering comes from `RUST_LOG`, defaulting to `info`.
//! - Human-readable output carries thread ID, file and line, timestamped with
//!   local time (RFC 3339).
//! - With `json` set, every event is a single JSON line instead.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global `tracing` subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(json: bool) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()));

    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_thread_ids(true)
                    .with_target(false)
                    .with_timer(fmt::time::ChronoLocal::rfc_3339()),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_target(false)
                    .with_file(true)
                    .with_timer(fmt::time::ChronoLocal::rfc_3339()),
            )
            .try_init()?;
    }

    Ok(())
}
