//! Heartbeat CLI
//!
//! Command-line interface for the website uptime monitor.

use std::path::PathBuf;

use clap::Parser;
use heartbeat::Config;
use tracing::Level;

#[derive(Parser)]
#[command(name = "heartbeat")]
#[command(about = "Website uptime monitor with Discord notifications")]
#[command(version)]
struct Args {
    /// Path to an env file loaded before reading the environment
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Path to the status code descriptions (overrides STATUS_DESCRIPTIONS_PATH)
    #[arg(long)]
    status_descriptions: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: env_file={:?}, status_descriptions={:?}, log_level={:?}",
        args.env_file,
        args.status_descriptions,
        args.log_level
    );

    match dotenvy::from_path(&args.env_file) {
        Ok(()) => tracing::debug!("Loaded environment from {:?}", args.env_file),
        Err(e) if e.not_found() => {
            tracing::debug!("No env file at {:?}", args.env_file)
        }
        Err(e) => return Err(e.into()),
    }

    let mut config = Config::from_env()?;

    if let Some(path) = args.status_descriptions {
        config.status_descriptions_path = path;
    }

    tracing::info!("Starting heartbeat service");
    heartbeat::run(config).await?;

    Ok(())
}
