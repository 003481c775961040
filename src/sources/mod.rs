//! # Effective Package Sources
//!
//! NuGet reads one `nuget.config` per directory level, from the filesystem
//! root down to the project directory, and merges them: closer files override
//! farther ones, `<clear/>` discards what farther files contributed, and
//! `<remove/>` deletes a single source. This module reproduces that merge.
//!
//! ## Structure
//!
//! - [`directive`]: parses one config document into an ordered list of
//!   [`ConfigDirective`]s. Malformed or unsafe documents contribute nothing.
//! - [`fold`]: a pure left fold of directive lists into source records. All
//!   precedence rules live here and are tested without touching disk.
//! - [`credentials`]: the [`PasswordDecryptor`] capability used for
//!   platform-encrypted `Password` entries.
//! - [`hierarchy`]: discovers the config chain for a directory and runs the
//!   parse → fold → validate pipeline.
//!
//! Results are rebuilt from disk on every call; nothing is cached.

pub mod credentials;
pub mod directive;
pub mod fold;
pub mod hierarchy;

use serde::Serialize;

pub use credentials::{NoDecryption, PasswordDecryptor};
pub use directive::{parse_document, ConfigDirective, CredentialKey, DirectiveKind};
pub use fold::{fold_directives, SourceMap};
pub use hierarchy::{config_file_paths, effective_sources, merge_app_sources, ConfigHierarchy};

/// Where a source record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceOrigin {
    /// Declared in a `nuget.config` file.
    ConfigFile,
    /// Supplied by the calling application's own settings.
    AppSettings,
}

/// One effective package source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRecord {
    /// Source name, unique case-insensitively within a merged result.
    pub name: String,
    /// Feed URL or local path.
    pub url: String,
    /// False if listed under `disabledPackageSources` with `true`.
    pub enabled: bool,
    /// True when a username or password is attached.
    pub requires_auth: bool,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub clear_text_password: Option<String>,
    /// Value of the `protocolVersion` attribute, if declared.
    pub protocol_version: Option<u8>,
    pub origin: SourceOrigin,
}

impl SourceRecord {
    /// Create an enabled, unauthenticated source.
    pub fn new(name: impl Into<String>, url: impl Into<String>, origin: SourceOrigin) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            enabled: true,
            requires_auth: false,
            username: None,
            clear_text_password: None,
            protocol_version: None,
            origin,
        }
    }

    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}
