use std::sync::Arc;

use anyhow::Result;
use bct_console::cli::Cli;
use bct_console::{Console, ConsoleConfig, PrintRedirector, logging};
use clap::Parser;
use tracing::{debug, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ConsoleConfig::load(cli.config.as_deref())?;
    logging::init(&config.logging)?;
    match &config.source {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => debug!("No config file found, using defaults and environment"),
    }

    let mut console = Console::bootstrap(config, Arc::new(PrintRedirector)).await?;
    console.run(cli.command).await
}
