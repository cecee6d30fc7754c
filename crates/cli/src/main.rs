//! ContextGate CLI — the main entry point.
//!
//! Commands:
//! - `verify` — Check a compressed pack against its original
//! - `config` — Show, locate or validate configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "contextgate",
    about = "ContextGate — fidelity gate for compressed agent context",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify that a compressed pack may replace the original
    Verify {
        /// JSON file holding the original pack
        #[arg(short, long)]
        before: PathBuf,

        /// JSON file holding the compressed pack
        #[arg(short, long)]
        after: PathBuf,

        /// Required saving ratio (defaults to the configured value)
        #[arg(short, long, env = "CONTEXTGATE_REQUIRED_SAVING_RATIO")]
        ratio: Option<f64>,

        /// Print the verdict as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Validate the config file
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Verify {
            before,
            after,
            ratio,
            json,
        } => {
            let passed = commands::verify::run(&before, &after, ratio, json).await?;
            if !passed {
                std::process::exit(1);
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
    }

    Ok(())
}
