//! Plinth CLI - static-site asset pipeline with live-reload dev server.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "plinth")]
#[command(about = "Static-site asset pipeline with live-reload dev server")]
#[command(version)]
pub struct Cli {
    /// Runs the dev session when no command is given.
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the starter source tree (existing starter files are overwritten)
    Setup,

    /// Build everything once, then serve with live reload
    Dev {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },

    /// Run all transform stages once and exit
    Build,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    // Execute command
    match cli.command {
        Some(Commands::Setup) => {
            commands::setup::run()?;
        }
        Some(Commands::Build) => {
            commands::build::run().await?;
        }
        Some(Commands::Dev { port, no_open }) => {
            commands::dev::run(port, !no_open).await?;
        }
        None => {
            commands::dev::run(None, true).await?;
        }
    }

    Ok(())
}
