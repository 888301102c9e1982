//! dispatchctl - CLI for the dispatch kitchen API.
//!
//! Drives orders through their lifecycle by hand and generates synthetic
//! Poisson load for demos and soak testing.

use anyhow::Result;
use clap::Parser;

mod client;
mod commands;
mod error;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Run the command
    if let Err(e) = cli.run().await {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
