//! # Central Command Implementation
//!
//! Reads and edits `Directory.Packages.props`.
//!
//! Every subcommand takes a location that may be the props file itself, the
//! directory holding it, or a project file. For a project file the nearest
//! props file above it is used.
//!
//! - `show`: list declarations and whether central management is enabled
//! - `set`: change the version of a declared package
//! - `add`: declare a new package, creating the file if needed
//! - `remove`: drop a declaration

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use nuget_resolve::central;
use nuget_resolve::defaults::PROPS_FILE_NAME;
use nuget_resolve::output::{Marker, OutputConfig};

/// Read or edit central package versions
#[derive(Args, Debug)]
pub struct CentralArgs {
    #[command(subcommand)]
    pub command: CentralCommand,
}

#[derive(Subcommand, Debug)]
pub enum CentralCommand {
    /// List central package versions
    Show {
        /// Props file, its directory, or a project file.
        #[arg(value_name = "PATH", default_value = ".")]
        path: PathBuf,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Change the version of a declared package
    Set {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        #[arg(value_name = "ID")]
        id: String,
        #[arg(value_name = "VERSION")]
        version: String,
    },

    /// Declare a new package version
    Add {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        #[arg(value_name = "ID")]
        id: String,
        #[arg(value_name = "VERSION")]
        version: String,
    },

    /// Remove a package declaration
    Remove {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        #[arg(value_name = "ID")]
        id: String,
    },
}

/// Execute the `central` command.
pub fn execute(args: CentralArgs, out: &OutputConfig) -> Result<()> {
    match args.command {
        CentralCommand::Show { path, json } => show(&path, json, out),
        CentralCommand::Set { path, id, version } => {
            let props = props_location(&path)?;
            central::update_package_version(&props, &id, &version)?;
            println!(
                "{} {} = {}  {}",
                out.marker(Marker::Success),
                out.paint_name(&id),
                version,
                out.paint_detail(&props.display().to_string())
            );
            Ok(())
        }
        CentralCommand::Add { path, id, version } => {
            let props = props_location(&path)?;
            central::add_package_version(&props, &id, &version)?;
            println!(
                "{} Added {} {}  {}",
                out.marker(Marker::Success),
                out.paint_name(&id),
                version,
                out.paint_detail(&props.display().to_string())
            );
            Ok(())
        }
        CentralCommand::Remove { path, id } => {
            let props = props_location(&path)?;
            if central::remove_package_version(&props, &id)? {
                println!("{} Removed {}", out.marker(Marker::Success), out.paint_name(&id));
            } else {
                println!(
                    "{} {} is not declared in {}",
                    out.marker(Marker::Skipped),
                    id,
                    props.display()
                );
            }
            Ok(())
        }
    }
}

fn show(path: &Path, json: bool, out: &OutputConfig) -> Result<()> {
    let props = props_location(path)?;
    if !props.is_file() {
        anyhow::bail!("No {} found at {}", PROPS_FILE_NAME, props.display());
    }

    let versions = central::read_package_versions(&props);
    let enabled = central::is_central_management_enabled(&props);

    if json {
        let report = serde_json::json!({
            "path": props,
            "central_management": enabled,
            "versions": versions,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", out.paint_detail(&props.display().to_string()));
    println!(
        "Central package management: {}",
        if enabled { "enabled" } else { "disabled" }
    );
    if versions.is_empty() {
        println!("No package versions declared.");
        return Ok(());
    }

    let width = versions.iter().map(|v| v.id.len()).max().unwrap_or(0);
    for entry in versions.iter() {
        let padding = " ".repeat(width - entry.id.len());
        println!("  {}{}  {}", out.paint_name(&entry.id), padding, entry.version);
    }
    Ok(())
}

/// Map a user-supplied location onto a props file path.
fn props_location(path: &Path) -> Result<PathBuf> {
    if path.is_dir() {
        return Ok(path.join(PROPS_FILE_NAME));
    }

    let is_props = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.eq_ignore_ascii_case(PROPS_FILE_NAME));
    if is_props || !path.exists() {
        return Ok(path.to_path_buf());
    }

    central::find_props_file(path)
        .with_context(|| format!("No {} applies to {}", PROPS_FILE_NAME, path.display()))
}
