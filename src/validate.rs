//! Package source address validation.
//!
//! A source is usable if it is an absolute `http`/`https` URL or a local
//! filesystem path. Every other scheme (`ftp`, `file`, `javascript`, ...) is
//! refused, as are empty values. Validation is the last gate before a source
//! enters the merged result; failing sources are dropped, not reported.

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static URI_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("static regex is valid"));

/// Returns true if `source` is an acceptable package source address.
///
/// # Examples
///
/// ```
/// use nuget_resolve::validate::is_valid_source_url;
///
/// assert!(is_valid_source_url("https://api.nuget.org/v3/index.json"));
/// assert!(is_valid_source_url("/var/feeds/local"));
/// assert!(is_valid_source_url(r"C:\feeds\local"));
/// assert!(!is_valid_source_url("file:///etc/passwd"));
/// assert!(!is_valid_source_url("   "));
/// ```
pub fn is_valid_source_url(source: &str) -> bool {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return false;
    }

    if is_local_path(trimmed) {
        return true;
    }

    match Url::parse(trimmed) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

/// Returns true for absolute, drive-rooted or UNC filesystem paths.
pub fn is_local_path(source: &str) -> bool {
    source.starts_with('/') || source.starts_with(r"\\") || is_drive_rooted(source)
}

fn is_drive_rooted(source: &str) -> bool {
    let bytes = source.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

/// Resolve a relative local feed against the directory of the config file
/// that declared it.
///
/// URLs, absolute paths and values with any URI scheme are returned
/// unchanged, so they still go through [`is_valid_source_url`] as written.
pub fn resolve_relative_feed(config_dir: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() || is_local_path(trimmed) || URI_SCHEME.is_match(trimmed) {
        return value.to_string();
    }

    let relative = if cfg!(windows) {
        trimmed.to_string()
    } else {
        trimmed.replace('\\', "/")
    };
    config_dir
        .join(relative)
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect::<PathBuf>()
        .display()
        .to_string()
}
