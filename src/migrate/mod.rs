//! # packages.config Migration
//!
//! Converts a project that lists its NuGet dependencies in `packages.config`
//! into one that declares them as `PackageReference` items in the project
//! file itself.
//!
//! ## Per-project steps
//!
//! 1.  **Locate**: `packages.config` must sit next to the project file.
//! 2.  **Parse**: read its `(id, version)` entries.
//! 3.  **Check**: refuse projects that already use `PackageReference`.
//! 4.  **Backup**: copy the project byte-for-byte to `<project>.bak`.
//! 5.  **Rewrite**: edit the project in memory, then save it atomically.
//! 6.  **Finalize**: delete `packages.config`.
//!
//! Any failure after step 4 restores the project from the backup before the
//! failure is reported (see [`backup::ProjectBackup`]). The backup itself is
//! never deleted.
//!
//! Every attempt produces exactly one [`MigrationResult`]; per-project
//! failures are data, not errors.
//!
//! ## Batch mode
//!
//! [`migrate_all_in_folder`] finds every `packages.config` below a root and
//! migrates the sibling project of each, one at a time. Projects may share a
//! `Directory.Packages.props`, so they are never migrated concurrently.

pub mod backup;
pub mod cancel;
pub mod legacy;
pub mod rewrite;

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;

use crate::defaults::{LEGACY_PACKAGES_FILE_NAME, PROJECT_EXTENSIONS};
use crate::error::{Error, Result};
use crate::xml::XmlDocument;

pub use backup::ProjectBackup;
pub use cancel::CancellationToken;
pub use legacy::{read_legacy_packages, LegacyPackage};

/// Directories never searched for `packages.config` in batch mode.
const SKIP_DIRS: &[&str] = &[
    "bin",          // Build output
    "obj",          // Intermediate build output
    "packages",     // Restored packages.config packages
    "node_modules", // Node.js dependencies
    ".git",         // Git repository data
    ".vs",          // Visual Studio
];

/// Outcome of one migration attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationResult {
    project_path: PathBuf,
    success: bool,
    packages_migrated: usize,
    error: Option<String>,
}

impl MigrationResult {
    fn succeeded(project_path: &Path, packages_migrated: usize) -> Self {
        Self {
            project_path: project_path.to_path_buf(),
            success: true,
            packages_migrated,
            error: None,
        }
    }

    fn failed(project_path: &Path, error: impl Into<String>) -> Self {
        Self {
            project_path: project_path.to_path_buf(),
            success: false,
            packages_migrated: 0,
            error: Some(error.into()),
        }
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn packages_migrated(&self) -> usize {
        self.packages_migrated
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Migrate one project from `packages.config` to `PackageReference`.
pub fn migrate_project(project: &Path) -> MigrationResult {
    match try_migrate(project) {
        Ok(count) => {
            info!("Migrated {} package(s) in {}", count, project.display());
            MigrationResult::succeeded(project, count)
        }
        Err(e) => {
            warn!("Migration of {} failed: {}", project.display(), e);
            MigrationResult::failed(project, e.to_string())
        }
    }
}

fn try_migrate(project: &Path) -> Result<usize> {
    let project_dir = project.parent().unwrap_or_else(|| Path::new("."));
    let legacy_file = project_dir.join(LEGACY_PACKAGES_FILE_NAME);
    if !legacy_file.is_file() {
        return Err(Error::Migration {
            project: project.to_path_buf(),
            message: format!(
                "{} not found in {}",
                LEGACY_PACKAGES_FILE_NAME,
                project_dir.display()
            ),
        });
    }

    let packages = read_legacy_packages(&legacy_file)?;
    let mut doc = XmlDocument::load(project)?;
    if rewrite::has_package_references(&doc) {
        return Err(Error::Migration {
            project: project.to_path_buf(),
            message: "project already uses the PackageReference format".to_string(),
        });
    }

    let backup = ProjectBackup::create(project)?;

    let summary = rewrite::rewrite_project(&mut doc, &packages)?;
    doc.save()?;
    info!(
        "Rewrote {}: removed {} assembly reference(s) and {} restore import(s), added {} package reference(s)",
        project.display(),
        summary.removed_references,
        summary.removed_imports,
        summary.added_references
    );
    fs::remove_file(&legacy_file).map_err(|e| Error::Filesystem {
        message: format!("Failed to delete '{}': {}", legacy_file.display(), e),
    })?;

    backup.commit();
    Ok(packages.len())
}

/// Migrate every project below `root` that has a `packages.config`.
///
/// `cancel` is checked before each project starts; once it is set the batch
/// stops with [`Error::Cancelled`] and no results. `progress` receives one
/// message per project attempted.
pub fn migrate_all_in_folder(
    root: &Path,
    cancel: &CancellationToken,
    progress: Option<&dyn Fn(&str)>,
) -> Result<Vec<MigrationResult>> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let legacy_files = find_legacy_files(root);
    let mut results = Vec::with_capacity(legacy_files.len());

    for legacy_file in legacy_files {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let dir = legacy_file.parent().unwrap_or(root);
        match find_sibling_project(dir) {
            Some(project) => {
                if let Some(report) = progress {
                    report(&format!("Migrating {}", project.display()));
                }
                results.push(migrate_project(&project));
            }
            None => {
                if let Some(report) = progress {
                    report(&format!("Skipping {}: no project file", dir.display()));
                }
                let expected = PROJECT_EXTENSIONS
                    .iter()
                    .map(|ext| format!(".{ext}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                results.push(MigrationResult::failed(
                    &legacy_file,
                    format!(
                        "No project file ({}) found next to {}",
                        expected,
                        legacy_file.display()
                    ),
                ));
            }
        }
    }

    Ok(results)
}

/// Every `packages.config` below `root`, in path order.
pub fn find_legacy_files(root: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let file_name = e.file_name().to_str().unwrap_or("");
            !SKIP_DIRS
                .iter()
                .any(|skip| file_name.eq_ignore_ascii_case(skip))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == LEGACY_PACKAGES_FILE_NAME)
        .map(|e| e.into_path())
        .collect()
}

/// The project file in `dir`, trying extensions in priority order.
///
/// Within one extension the alphabetically first file wins.
pub fn find_sibling_project(dir: &Path) -> Option<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    PROJECT_EXTENSIONS.iter().find_map(|ext| {
        files
            .iter()
            .find(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(ext))
            })
            .cloned()
    })
}
