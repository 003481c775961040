//! Default values and well-known file names.
//!
//! This module provides centralized names used across the resolver, the
//! central version repository and the migrator, so the on-disk layout is
//! described in one place.

use std::path::PathBuf;

/// Config file names probed in each directory, first existing wins.
///
/// Linux filesystems are case-sensitive, so the common spellings are tried
/// explicitly.
pub const CONFIG_FILE_NAMES: &[&str] = &["nuget.config", "NuGet.config", "NuGet.Config"];

/// Central version-declaration file name.
pub const PROPS_FILE_NAME: &str = "Directory.Packages.props";

/// Legacy package-list file name.
pub const LEGACY_PACKAGES_FILE_NAME: &str = "packages.config";

/// Project file extensions in the order they are tried for a sibling project.
pub const PROJECT_EXTENSIONS: &[&str] = &["csproj", "vbproj", "fsproj"];

/// Suffix appended to a project path to form its backup path.
pub const BACKUP_SUFFIX: &str = "bak";

/// Environment variable overriding the user-level config location.
pub const USER_CONFIG_ENV: &str = "NUGET_RESOLVE_USER_CONFIG";

/// Returns the user-level NuGet config path.
///
/// - Windows: `%APPDATA%\NuGet\NuGet.Config`
/// - Other platforms: `~/.nuget/NuGet/NuGet.Config`
///
/// The `NUGET_RESOLVE_USER_CONFIG` environment variable takes precedence.
/// Returns `None` if no home directory can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(USER_CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }

    if cfg!(windows) {
        dirs::config_dir().map(|dir| dir.join("NuGet").join("NuGet.Config"))
    } else {
        dirs::home_dir().map(|home| home.join(".nuget").join("NuGet").join("NuGet.Config"))
    }
}

/// Returns the backup path for a project file (`App.csproj` -> `App.csproj.bak`).
pub fn backup_path_for(project: &std::path::Path) -> PathBuf {
    let mut name = project.as_os_str().to_os_string();
    name.push(".");
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}
