//! Backup and automatic restore of a project file.
//!
//! ```ignore
//! let backup = ProjectBackup::create(&project)?;
//! // mutate the project file...
//! backup.commit(); // keep the new content
//! ```
//!
//! If the guard is dropped without `commit` (early return through `?`, or a
//! panic unwinding through the migration), the project file is restored from
//! the backup. Restore failures are logged and never replace the original
//! error. The `.bak` file is left on disk in every case.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::defaults::backup_path_for;
use crate::error::{Error, Result};
use crate::filesystem::atomic_write;

/// A byte-exact copy of a project file, restored on drop unless committed.
#[derive(Debug)]
pub struct ProjectBackup {
    project: PathBuf,
    backup: PathBuf,
    committed: bool,
}

impl ProjectBackup {
    /// Copy `project` to `<project>.bak`.
    pub fn create(project: &Path) -> Result<Self> {
        let backup = backup_path_for(project);
        fs::copy(project, &backup).map_err(|e| Error::Filesystem {
            message: format!(
                "Failed to back up '{}' to '{}': {}",
                project.display(),
                backup.display(),
                e
            ),
        })?;

        Ok(Self {
            project: project.to_path_buf(),
            backup,
            committed: false,
        })
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    /// Keep the current project content.
    pub fn commit(mut self) {
        self.committed = true;
    }

    fn restore(&self) -> Result<()> {
        let original = fs::read(&self.backup)?;
        atomic_write(&self.project, &original)
    }
}

impl Drop for ProjectBackup {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match self.restore() {
            Ok(()) => info!(
                "Restored {} from {}",
                self.project.display(),
                self.backup.display()
            ),
            Err(e) => warn!(
                "Failed to restore {} from {}: {}",
                self.project.display(),
                self.backup.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(temp: &TempDir) -> PathBuf {
        let path = temp.path().join("App.csproj");
        fs::write(&path, "<Project>original</Project>").unwrap();
        path
    }

    #[test]
    fn test_backup_is_exact_copy() {
        let temp = TempDir::new().unwrap();
        let path = project(&temp);

        let backup = ProjectBackup::create(&path).unwrap();
        assert_eq!(
            fs::read(backup.backup_path()).unwrap(),
            fs::read(&path).unwrap()
        );
        backup.commit();
    }

    #[test]
    fn test_drop_without_commit_restores() {
        let temp = TempDir::new().unwrap();
        let path = project(&temp);

        {
            let _backup = ProjectBackup::create(&path).unwrap();
            fs::write(&path, "<Project>changed</Project>").unwrap();
        }

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "<Project>original</Project>"
        );
        assert!(backup_path_for(&path).exists());
    }

    #[test]
    fn test_commit_keeps_changes_and_backup() {
        let temp = TempDir::new().unwrap();
        let path = project(&temp);

        let backup = ProjectBackup::create(&path).unwrap();
        fs::write(&path, "<Project>changed</Project>").unwrap();
        backup.commit();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "<Project>changed</Project>"
        );
        assert!(backup_path_for(&path).exists());
    }

    #[test]
    fn test_restore_on_panic() {
        let temp = TempDir::new().unwrap();
        let path = project(&temp);
        let panicking_path = path.clone();

        let outcome = std::panic::catch_unwind(move || {
            let _backup = ProjectBackup::create(&panicking_path).unwrap();
            fs::write(&panicking_path, "<Project>half-written").unwrap();
            panic!("simulated failure");
        });

        assert!(outcome.is_err());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "<Project>original</Project>"
        );
    }

    #[test]
    fn test_missing_project_cannot_be_backed_up() {
        let temp = TempDir::new().unwrap();
        let result = ProjectBackup::create(&temp.path().join("Missing.csproj"));
        assert!(matches!(result, Err(Error::Filesystem { .. })));
    }
}
