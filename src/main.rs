mod app;
mod cli;
mod config;

use app::DispenserApp;
use clap::Parser;
use cli::{Cli, Commands};
use crate::config::{AppConfig, LogFormat};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Application error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_tracing("info", LogFormat::Pretty);
            return Err(e);
        }
    };
    init_tracing(&config.logging.level, config.logging.format);

    match cli.command {
        Some(Commands::Run) | None => {
            info!("===================================");
            info!("Ballot Dispenser");
            info!("===================================");
            DispenserApp::new(config)?.run().await?;
        }
        Some(Commands::Sign { message_hex }) => {
            let cipher = app::load_cipher(&config)?;
            println!("{}", cipher.sign(&message_hex)?);
        }
        Some(Commands::Verify { message, signature }) => {
            let cipher = app::load_cipher(&config)?;
            println!("{}", cipher.verify(&message, &signature));
        }
    }

    Ok(())
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
