//! # Migrate Command Implementation
//!
//! Converts `packages.config` projects to `PackageReference`.
//!
//! Given a project file, that project is migrated. Given a directory, every
//! `packages.config` below it is located and its sibling project migrated,
//! one at a time, with a spinner on stderr.
//!
//! Each project is transactional: it is backed up to `<project>.bak` first
//! and restored if anything fails. The command exits non-zero if any project
//! failed.

use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use nuget_resolve::migrate::{self, CancellationToken, MigrationResult};
use nuget_resolve::output::{Marker, OutputConfig};

/// Migrate packages.config projects to PackageReference
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Project file, or a directory to search for packages.config files.
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Print the results as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the `migrate` command.
pub fn execute(args: MigrateArgs, out: &OutputConfig) -> Result<()> {
    if !args.path.exists() {
        anyhow::bail!("Path not found: {}", args.path.display());
    }

    let results = if args.path.is_dir() {
        migrate_folder(&args)?
    } else {
        vec![migrate::migrate_project(&args.path)]
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_results(&results, out);
    }

    let failed = results.iter().filter(|r| !r.success()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} migration(s) failed", failed, results.len());
    }
    Ok(())
}

fn migrate_folder(args: &MigrateArgs) -> Result<Vec<MigrationResult>> {
    let spinner = if args.json {
        ProgressBar::hidden()
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    };

    let report: &dyn Fn(&str) = &|message: &str| spinner.set_message(message.to_string());
    let outcome = migrate::migrate_all_in_folder(&args.path, &CancellationToken::new(), Some(report));
    spinner.finish_and_clear();

    Ok(outcome?)
}

fn print_results(results: &[MigrationResult], out: &OutputConfig) {
    if results.is_empty() {
        println!("No packages.config files found.");
        return;
    }

    for result in results {
        let path = result.project_path().display().to_string();
        match result.error() {
            None => println!(
                "{} {}  {}",
                out.marker(Marker::Success),
                out.paint_name(&path),
                out.paint_detail(&format!("{} package(s)", result.packages_migrated()))
            ),
            Some(error) => println!(
                "{} {}  {}",
                out.marker(Marker::Failure),
                out.paint_name(&path),
                error
            ),
        }
    }

    let succeeded = results.iter().filter(|r| r.success()).count();
    println!();
    println!("{} of {} project(s) migrated", succeeded, results.len());
}
