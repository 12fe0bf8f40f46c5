use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use alert_relay::{config::Config, metrics, server::Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    info!("Loaded configuration: {:?}", config);
    if config.webhook.secret.is_empty() {
        warn!("FEISHU_SECRET is not set. Messages will be signed with an empty secret.");
    }

    metrics::register_metrics();

    let server = Server::from_config(&config).context("failed to build webhook client")?;

    info!("Starting server on {}", config.server.addr);
    server.start(&config.server.addr).await?;

    Ok(())
}
