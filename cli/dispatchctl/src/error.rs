//! CLI error type and reporting.

use colored::Colorize;
use thiserror::Error;

/// Errors from talking to the dispatch API.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

/// Print an error in a user-friendly way.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {err:#}", "error:".red().bold());
}
