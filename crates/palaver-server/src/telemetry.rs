//! Tracing setup for the Palaver server.
//!
//! Console-oriented structured logging; the filter comes from `RUST_LOG`
//! with a development-friendly default.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// # Configuration
///
/// Environment variables:
/// - `RUST_LOG`: log filter (default:
///   `info,palaver_server=debug,palaver_signaling=debug`)
pub fn init() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,palaver_server=debug,palaver_signaling=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!("Telemetry initialized");

    Ok(())
}
