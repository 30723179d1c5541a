//! Proximity CLI - Database migrations, demo data and maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! prox-cli migrate
//!
//! # Load the demo venue
//! prox-cli seed
//!
//! # Run one eviction sweep
//! prox-cli sweep
//! ```
//!
//! # Environment Variables
//!
//! - `PROXIMITY_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `PROXIMITY_*_IDLE_SECS` - Idle thresholds used by `sweep`

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "prox-cli")]
#[command(author, version, about = "Proximity CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load the demo venue (skipped when clients already exist)
    Seed,
    /// Run a single eviction sweep
    Sweep,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Sweep => commands::sweep::run().await?,
    }
    Ok(())
}
