//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use nuget_resolve::output::OutputConfig;

use crate::commands;

/// nuget-resolve - Inspect NuGet sources and package versions, migrate packages.config
#[derive(Parser, Debug)]
#[command(name = "nuget-resolve")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the effective package sources for a directory
    Sources(commands::sources::SourcesArgs),

    /// Show the resolved version and its origin for each package of a project
    Packages(commands::packages::PackagesArgs),

    /// Read or edit central package versions in Directory.Packages.props
    Central(commands::central::CentralArgs),

    /// Migrate packages.config projects to PackageReference
    Migrate(commands::migrate::MigrateArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let out = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Sources(args) => commands::sources::execute(args, &out),
            Commands::Packages(args) => commands::packages::execute(args, &out),
            Commands::Central(args) => commands::central::execute(args, &out),
            Commands::Migrate(args) => commands::migrate::execute(args, &out),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when running under a test harness.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
