mod archive;
mod auth;
mod chat;
mod cli;
mod config;
mod error;
mod message;
mod models;
mod pipeline;
mod report;
mod ticket;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Values already present in the environment win over the .env file.
    let dotenv = dotenvy::dotenv();
    env_logger::init();
    if let Ok(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    let cli = Cli::parse();
    info!("Starting ci-notify");
    cli.execute().await?;

    Ok(())
}
