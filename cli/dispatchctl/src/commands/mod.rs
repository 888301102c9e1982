//! CLI commands.

mod orders;
mod simulate;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::client::ApiClient;
use crate::output::{print_success, OutputFormat};

/// dispatchctl - drive and observe a dispatch kitchen.
#[derive(Debug, Parser)]
#[command(name = "dispatchctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// Base URL of the dispatch API.
    #[arg(
        long,
        global = true,
        env = "DISPATCH_API_URL",
        default_value = "http://127.0.0.1:8080"
    )]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage orders.
    Order(orders::OrderCommand),

    /// Generate synthetic Poisson load against the kitchen.
    Simulate(simulate::SimulateCommand),

    /// Check API health.
    Health,
}

/// Shared context handed to every command.
pub struct CommandContext {
    pub client: ApiClient,
    pub format: OutputFormat,
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let format = match self.format.as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        };

        let ctx = CommandContext {
            client: ApiClient::new(&self.api_url)?,
            format,
        };

        match self.command {
            Commands::Order(cmd) => cmd.run(&ctx).await,
            Commands::Simulate(cmd) => cmd.run(&ctx).await,
            Commands::Health => {
                if ctx.client.healthy().await {
                    print_success("API is healthy");
                    Ok(())
                } else {
                    anyhow::bail!("API is not reachable")
                }
            }
        }
    }
}
