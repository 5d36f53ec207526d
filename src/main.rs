// src/main.rs

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use litterbox::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (from ~/.litterbox/.env or current dir)
    let env_path = dirs::home_dir()
        .map(|h| h.join(".litterbox").join(".env"))
        .filter(|p| p.exists());
    if let Some(path) = env_path {
        let _ = dotenvy::from_path(&path);
    } else {
        let _ = dotenvy::dotenv();
    }

    let args = Cli::parse();
    let config = args.config.resolve()?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => cli::run_server(config).await,
        Commands::Edit { request } => Ok(cli::run_edit(config, request).await?),
    }
}
