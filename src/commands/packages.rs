//! # Packages Command Implementation
//!
//! Shows each `PackageReference` of a project with the version it resolves
//! to and where that version comes from (`inline`, `central`, `override`).

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use nuget_resolve::output::OutputConfig;
use nuget_resolve::version_source::resolve_project_packages;

/// Show resolved package versions for a project
#[derive(Args, Debug)]
pub struct PackagesArgs {
    /// Project file (.csproj, .vbproj, .fsproj).
    #[arg(value_name = "PROJECT")]
    pub project: PathBuf,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the `packages` command.
pub fn execute(args: PackagesArgs, out: &OutputConfig) -> Result<()> {
    let packages = resolve_project_packages(&args.project)
        .with_context(|| format!("Failed to read project {}", args.project.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&packages)?);
        return Ok(());
    }

    if packages.is_empty() {
        println!("No package references in {}", args.project.display());
        return Ok(());
    }

    let width = packages.iter().map(|p| p.id.len()).max().unwrap_or(0);
    for package in &packages {
        let padding = " ".repeat(width - package.id.len());
        println!(
            "{}{}  {}  {}",
            out.paint_name(&package.id),
            padding,
            package.version.as_deref().unwrap_or("(none)"),
            out.paint_detail(&format!("[{}]", package.source))
        );
    }

    Ok(())
}
