use anyhow::Result;
use tracing::info;

mod config;
mod server;
mod telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init()?;

    info!("Palaver signaling server starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = config::ServerConfig::from_env();

    server::start(config).await?;

    Ok(())
}
