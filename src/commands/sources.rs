//! # Sources Command Implementation
//!
//! Lists the package sources NuGet would use for a directory: every
//! `nuget.config` from the filesystem root down to the directory, preceded by
//! the user-level config, merged with NuGet's precedence rules. Sources with
//! unsupported addresses are left out.
//!
//! This command is read-only.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use nuget_resolve::defaults;
use nuget_resolve::output::{Marker, OutputConfig};
use nuget_resolve::sources::{ConfigHierarchy, SourceRecord};

/// List the effective package sources for a directory
#[derive(Args, Debug)]
pub struct SourcesArgs {
    /// Directory (or file inside it) to resolve sources for.
    #[arg(value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,

    /// Also list the config files that were applied, outermost first.
    #[arg(long)]
    pub files: bool,

    /// Ignore the user-level NuGet.Config.
    #[arg(long, conflicts_with = "user_config")]
    pub no_user_config: bool,

    /// Use this file as the user-level config.
    ///
    /// Defaults to `~/.nuget/NuGet/NuGet.Config` (`%APPDATA%\NuGet\NuGet.Config`
    /// on Windows). Can also be set with `NUGET_RESOLVE_USER_CONFIG`.
    #[arg(long, value_name = "FILE")]
    pub user_config: Option<PathBuf>,
}

#[derive(Serialize)]
struct SourcesReport<'a> {
    config_files: &'a [PathBuf],
    sources: &'a [SourceRecord],
}

/// Execute the `sources` command.
pub fn execute(args: SourcesArgs, out: &OutputConfig) -> Result<()> {
    if !args.dir.exists() {
        anyhow::bail!("Path not found: {}", args.dir.display());
    }

    let mut hierarchy = ConfigHierarchy::new();
    if !args.no_user_config {
        if let Some(user_config) = args.user_config.or_else(defaults::user_config_path) {
            hierarchy = hierarchy.with_user_config(user_config);
        }
    }

    let files = hierarchy.config_file_paths(&args.dir);
    let sources = hierarchy.effective_sources(&args.dir);

    if args.json {
        let report = SourcesReport {
            config_files: &files,
            sources: &sources,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if args.files {
        println!("Config files (outermost first):");
        if files.is_empty() {
            println!("  (none)");
        }
        for file in &files {
            println!("  {}", out.paint_detail(&file.display().to_string()));
        }
        println!();
    }

    if sources.is_empty() {
        println!("No package sources configured.");
        return Ok(());
    }

    let width = sources.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for source in &sources {
        let marker = if source.enabled {
            Marker::Success
        } else {
            Marker::Disabled
        };
        let mut notes = Vec::new();
        if !source.enabled {
            notes.push("disabled".to_string());
        }
        if source.requires_auth {
            match &source.username {
                Some(user) => notes.push(format!("auth: {}", user)),
                None => notes.push("auth".to_string()),
            }
        }
        if let Some(version) = source.protocol_version {
            notes.push(format!("v{}", version));
        }

        let padding = " ".repeat(width - source.name.len());
        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!(" {}", out.paint_detail(&format!("({})", notes.join(", "))))
        };
        println!(
            "{} {}{}  {}{}",
            out.marker(marker),
            out.paint_name(&source.name),
            padding,
            source.url,
            notes
        );
    }

    Ok(())
}
