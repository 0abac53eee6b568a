//! srcdeps CLI entry point
//!
//! Parses the command line, runs the command and turns errors into
//! user-friendly messages with suggestions.

use anyhow::Result;
use clap::Parser;
use srcdeps::cli;
use srcdeps::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
