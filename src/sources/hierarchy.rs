//! Config chain discovery and source resolution.
//!
//! For a start directory, one config file is taken from each directory on the
//! path to the filesystem root. Files are applied outer → inner, optionally
//! preceded by the user-level config. Missing or unreadable files are skipped;
//! resolution never fails.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use super::credentials::{NoDecryption, PasswordDecryptor};
use super::directive::{parse_document_at, ConfigDirective, DirectiveKind};
use super::fold::fold_directives;
use super::{SourceOrigin, SourceRecord};
use crate::defaults::CONFIG_FILE_NAMES;
use crate::validate::{is_valid_source_url, resolve_relative_feed};

/// Resolves effective package sources for directories.
pub struct ConfigHierarchy {
    user_config: Option<PathBuf>,
    decryptor: Box<dyn PasswordDecryptor>,
}

impl Default for ConfigHierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigHierarchy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigHierarchy")
            .field("user_config", &self.user_config)
            .finish_non_exhaustive()
    }
}

impl ConfigHierarchy {
    /// A resolver over the directory chain only, without password decryption.
    pub fn new() -> Self {
        Self {
            user_config: None,
            decryptor: Box::new(NoDecryption),
        }
    }

    /// Apply `path` as the outermost config layer when it exists.
    pub fn with_user_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_config = Some(path.into());
        self
    }

    /// Use `decryptor` for encrypted `Password` credentials.
    pub fn with_decryptor(mut self, decryptor: impl PasswordDecryptor + 'static) -> Self {
        self.decryptor = Box::new(decryptor);
        self
    }

    /// Config files that apply to `start`, ordered outer → inner.
    pub fn config_file_paths(&self, start: &Path) -> Vec<PathBuf> {
        let mut paths = directory_chain_configs(start);

        if let Some(user_config) = &self.user_config {
            if user_config.is_file() && !paths.iter().any(|p| p == user_config) {
                paths.insert(0, user_config.clone());
            }
        }

        paths
    }

    /// Effective, validated sources for `start`.
    pub fn effective_sources(&self, start: &Path) -> Vec<SourceRecord> {
        let layers: Vec<Vec<ConfigDirective>> = self
            .config_file_paths(start)
            .iter()
            .map(|path| load_layer(path))
            .collect();

        fold_directives(layers.iter().map(Vec::as_slice), self.decryptor.as_ref())
            .into_iter()
            .filter(|source| {
                let valid = is_valid_source_url(&source.url);
                if !valid {
                    debug!(
                        "Dropping source '{}': unsupported address '{}'",
                        source.name, source.url
                    );
                }
                valid
            })
            .collect()
    }
}

/// Config files found between `start` and the filesystem root, outer → inner.
pub fn config_file_paths(start: &Path) -> Vec<PathBuf> {
    ConfigHierarchy::new().config_file_paths(start)
}

/// Effective sources for `start` from the directory chain alone.
pub fn effective_sources(start: &Path) -> Vec<SourceRecord> {
    ConfigHierarchy::new().effective_sources(start)
}

/// Add application-provided sources whose names are not already configured.
///
/// Config-file sources win on a name collision. Invalid addresses are
/// dropped.
pub fn merge_app_sources<I, N, U>(mut sources: Vec<SourceRecord>, app_sources: I) -> Vec<SourceRecord>
where
    I: IntoIterator<Item = (N, U)>,
    N: Into<String>,
    U: Into<String>,
{
    for (name, url) in app_sources {
        let record = SourceRecord::new(name, url, SourceOrigin::AppSettings);
        if sources.iter().any(|existing| existing.is_named(&record.name)) {
            continue;
        }
        if !is_valid_source_url(&record.url) {
            debug!(
                "Dropping app source '{}': unsupported address '{}'",
                record.name, record.url
            );
            continue;
        }
        sources.push(record);
    }
    sources
}

fn directory_chain_configs(start: &Path) -> Vec<PathBuf> {
    let absolute = start
        .canonicalize()
        .or_else(|_| std::path::absolute(start))
        .unwrap_or_else(|_| start.to_path_buf());
    let first_dir = if absolute.is_file() {
        absolute.parent().map(Path::to_path_buf).unwrap_or(absolute)
    } else {
        absolute
    };

    let mut inner_to_outer: Vec<PathBuf> = first_dir
        .ancestors()
        .filter_map(|dir| {
            CONFIG_FILE_NAMES
                .iter()
                .map(|name| dir.join(name))
                .find(|candidate| candidate.is_file())
        })
        .collect();
    inner_to_outer.reverse();
    inner_to_outer
}

fn load_layer(path: &Path) -> Vec<ConfigDirective> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Skipping unreadable config {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_document_at(&bytes, path)
        .into_iter()
        .map(|mut directive| {
            if let DirectiveKind::Add { url, .. } = &mut directive.kind {
                *url = resolve_relative_feed(config_dir, url);
            }
            directive
        })
        .collect()
}
