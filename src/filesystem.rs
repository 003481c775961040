//! Whole-file reads and atomic writes.
//!
//! Every mutation in this crate is a full read, an in-memory edit and a full
//! write. Writes go to a temporary file in the target's directory which is
//! then renamed over the target, so a concurrent reader sees either the old
//! or the new content. A replaced file keeps its permissions.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};

/// Read a file into a string, mapping failures to `Error::Filesystem`.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::Filesystem {
        message: format!("Failed to read file '{}': {}", path.display(), e),
    })
}

/// Write `content` to `target` atomically using temp-file + rename.
pub fn atomic_write(target: &Path, content: &[u8]) -> Result<()> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| Error::Filesystem {
        message: format!(
            "Failed to create temp file in '{}': {}",
            parent.display(),
            e
        ),
    })?;

    tmp.write_all(content).map_err(|e| Error::Filesystem {
        message: format!("Failed to write temp file for '{}': {}", target.display(), e),
    })?;

    // The temp file is created owner-only; carry the target's mode over.
    if let Ok(metadata) = fs::metadata(target) {
        tmp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(|e| Error::Filesystem {
                message: format!(
                    "Failed to copy permissions of '{}': {}",
                    target.display(),
                    e
                ),
            })?;
    }

    tmp.persist(target).map_err(|e| Error::Filesystem {
        message: format!("Failed to persist '{}': {}", target.display(), e.error),
    })?;

    Ok(())
}
