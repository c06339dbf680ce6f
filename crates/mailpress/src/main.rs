//! `mailpress` - email to project folder automation.
//!
//! Turns discrete inbound messages (a drop folder of `.eml` files, or
//! Gmail search results) into an organized, deduplicated folder tree
//! keyed by a project code extracted from the subject line.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod fetch;
mod local;
mod report;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "mailpress",
    version,
    about = "Turns inbox chaos into organized project folders"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Organize local .eml files from a drop folder
    Drop(local::DropArgs),
    /// Fetch messages from Gmail and organize them per query
    Fetch(fetch::FetchArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailpress=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting mailpress");

    let cli = Cli::parse();
    match cli.command {
        Commands::Drop(args) => local::run(&args),
        Commands::Fetch(args) => fetch::run(&args),
    }
}
