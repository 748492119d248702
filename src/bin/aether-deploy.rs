use aether_deploy::cli::{self, AetherDeployCli};
use anyhow::Result;
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = AetherDeployCli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("Starting aether-deploy v{}", env!("CARGO_PKG_VERSION"));

    cli::run(cli).await
}
