use anyhow::Context;
use tracing_subscriber::EnvFilter;

use tidekv::config::ServerConfig;
use tidekv::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_args(std::env::args())
        .context("failed to parse command line flags")?;

    Server::new(config).run().await
}
