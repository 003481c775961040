//! # nuget-resolve CLI
//!
//! Binary entry point for the `nuget-resolve` command-line tool. It parses
//! arguments with `clap`, sets up logging and color output, and hands off to
//! the matching command. All resolution and migration logic lives in the
//! `nuget_resolve` library crate.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
