//! Folding directive lists into source records.
//!
//! Layers are applied outer → inner (filesystem root first). The fold is a
//! pure function of its inputs so the precedence rules can be tested
//! directly:
//!
//! - `Clear` empties the map.
//! - `Add` upserts. An existing entry keeps its position and its
//!   enabled/credential state; only the URL and protocol version change, so a
//!   closer file's URL wins.
//! - `Remove` deletes the entry if present. Re-adding it later appends it at
//!   the end.
//! - `Disable` and `Credential` only affect entries that are present.
//! - Credentials are last-write-wins: a later `ClearTextPassword`, or a later
//!   `Password` that the decryptor can read, replaces the earlier password.

use log::debug;

use super::credentials::PasswordDecryptor;
use super::directive::{ConfigDirective, CredentialKey, DirectiveKind};
use super::{SourceOrigin, SourceRecord};

/// An ordered, case-insensitively keyed map of sources.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    entries: Vec<SourceRecord>,
}

impl SourceMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one directive.
    pub fn apply(&mut self, directive: &ConfigDirective, decryptor: &dyn PasswordDecryptor) {
        match &directive.kind {
            DirectiveKind::Clear => self.entries.clear(),
            DirectiveKind::Add {
                name,
                url,
                protocol_version,
            } => match self.get_mut(name) {
                Some(existing) => {
                    existing.url = url.clone();
                    existing.protocol_version = *protocol_version;
                }
                None => {
                    let mut record = SourceRecord::new(name, url, SourceOrigin::ConfigFile);
                    record.protocol_version = *protocol_version;
                    self.entries.push(record);
                }
            },
            DirectiveKind::Remove { name } => {
                self.entries.retain(|entry| !entry.is_named(name));
            }
            DirectiveKind::Disable { name, disabled } => {
                if let Some(existing) = self.get_mut(name) {
                    existing.enabled = !disabled;
                }
            }
            DirectiveKind::Credential { source, key, value } => {
                let Some(existing) = self.get_mut(source) else {
                    debug!("Ignoring credentials for unknown source '{}'", source);
                    return;
                };
                match key {
                    CredentialKey::Username => existing.username = Some(value.clone()),
                    CredentialKey::ClearTextPassword => {
                        existing.clear_text_password = Some(value.clone())
                    }
                    CredentialKey::Password => match decryptor.decrypt(value) {
                        Some(password) => existing.clear_text_password = Some(password),
                        None => debug!(
                            "Encrypted password for '{}' cannot be decrypted on this platform",
                            source
                        ),
                    },
                }
                existing.requires_auth =
                    existing.username.is_some() || existing.clear_text_password.is_some();
            }
        }
    }

    /// Look up a source by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&SourceRecord> {
        self.entries.iter().find(|entry| entry.is_named(name))
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut SourceRecord> {
        self.entries.iter_mut().find(|entry| entry.is_named(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the map, returning records in insertion order.
    pub fn into_records(self) -> Vec<SourceRecord> {
        self.entries
    }
}

/// Fold per-file directive lists, outer → inner, into source records.
///
/// URLs are not validated here; see [`crate::validate`].
pub fn fold_directives<'a, I>(layers: I, decryptor: &dyn PasswordDecryptor) -> Vec<SourceRecord>
where
    I: IntoIterator<Item = &'a [ConfigDirective]>,
{
    let mut map = SourceMap::new();
    for layer in layers {
        for directive in layer {
            map.apply(directive, decryptor);
        }
    }
    map.into_records()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::credentials::NoDecryption;

    fn layer(kinds: Vec<DirectiveKind>) -> Vec<ConfigDirective> {
        kinds
            .into_iter()
            .enumerate()
            .map(|(position, kind)| ConfigDirective { position, kind })
            .collect()
    }

    fn add(name: &str, url: &str) -> DirectiveKind {
        DirectiveKind::Add {
            name: name.to_string(),
            url: url.to_string(),
            protocol_version: None,
        }
    }

    fn credential(source: &str, key: CredentialKey, value: &str) -> DirectiveKind {
        DirectiveKind::Credential {
            source: source.to_string(),
            key,
            value: value.to_string(),
        }
    }

    fn fold(layers: &[Vec<ConfigDirective>]) -> Vec<SourceRecord> {
        fold_directives(layers.iter().map(Vec::as_slice), &NoDecryption)
    }

    #[test]
    fn test_clear_discards_outer_sources() {
        let parent = layer(vec![add("nuget.org", "https://a")]);
        let child = layer(vec![DirectiveKind::Clear, add("LocalOnly", "https://b")]);
        let sources = fold(&[parent, child]);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "LocalOnly");
        assert_eq!(sources[0].url, "https://b");
    }

    #[test]
    fn test_remove_deletes_outer_source() {
        let parent = layer(vec![
            add("nuget.org", "https://a"),
            add("PrivateFeed", "https://b"),
        ]);
        let child = layer(vec![DirectiveKind::Remove {
            name: "PrivateFeed".to_string(),
        }]);
        let sources = fold(&[parent, child]);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "nuget.org");
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let only = layer(vec![
            add("nuget.org", "https://a"),
            DirectiveKind::Remove {
                name: "Nope".to_string(),
            },
        ]);
        assert_eq!(fold(&[only]).len(), 1);
    }

    #[test]
    fn test_closer_config_overrides_url_in_place() {
        let parent = layer(vec![
            add("nuget.org", "https://parent"),
            add("Other", "https://other"),
        ]);
        let child = layer(vec![add("NUGET.ORG", "https://child")]);
        let sources = fold(&[parent, child]);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name, "nuget.org");
        assert_eq!(sources[0].url, "https://child");
    }

    #[test]
    fn test_remove_then_readd_appends() {
        let parent = layer(vec![add("A", "https://a"), add("B", "https://b")]);
        let child = layer(vec![
            DirectiveKind::Remove {
                name: "A".to_string(),
            },
            add("A", "https://a2"),
        ]);
        let names: Vec<_> = fold(&[parent, child]).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_disable_applies_to_present_sources_only() {
        let only = layer(vec![
            add("A", "https://a"),
            DirectiveKind::Disable {
                name: "a".to_string(),
                disabled: true,
            },
            DirectiveKind::Disable {
                name: "Missing".to_string(),
                disabled: true,
            },
        ]);
        let sources = fold(&[only]);
        assert_eq!(sources.len(), 1);
        assert!(!sources[0].enabled);
    }

    #[test]
    fn test_clear_text_after_password_wins_without_decryption() {
        let only = layer(vec![
            add("Private", "https://private"),
            credential("private", CredentialKey::Username, "me"),
            credential("Private", CredentialKey::Password, "OPAQUE"),
            credential("Private", CredentialKey::ClearTextPassword, "secret"),
        ]);
        let sources = fold(&[only]);
        assert_eq!(sources[0].clear_text_password.as_deref(), Some("secret"));
        assert_eq!(sources[0].username.as_deref(), Some("me"));
        assert!(sources[0].requires_auth);
    }

    #[test]
    fn test_clear_text_after_password_wins_with_decryption() {
        let only = layer(vec![
            add("Private", "https://private"),
            credential("Private", CredentialKey::Password, "OPAQUE"),
            credential("Private", CredentialKey::ClearTextPassword, "secret"),
        ]);
        let decryptor = |_: &str| Some("decrypted".to_string());
        let sources = fold_directives([only.as_slice()], &decryptor);
        assert_eq!(sources[0].clear_text_password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_later_password_wins_when_decryptable() {
        let only = layer(vec![
            add("Private", "https://private"),
            credential("Private", CredentialKey::ClearTextPassword, "old"),
            credential("Private", CredentialKey::Password, "OPAQUE"),
        ]);
        let decryptor = |_: &str| Some("decrypted".to_string());
        let capable = fold_directives([only.as_slice()], &decryptor);
        assert_eq!(capable[0].clear_text_password.as_deref(), Some("decrypted"));

        let incapable = fold_directives([only.as_slice()], &NoDecryption);
        assert_eq!(incapable[0].clear_text_password.as_deref(), Some("old"));
    }

    #[test]
    fn test_credentials_across_files_last_write_wins() {
        let parent = layer(vec![
            add("Private", "https://private"),
            credential("Private", CredentialKey::ClearTextPassword, "outer"),
        ]);
        let child = layer(vec![credential(
            "Private",
            CredentialKey::ClearTextPassword,
            "inner",
        )]);
        let sources = fold(&[parent, child]);
        assert_eq!(sources[0].clear_text_password.as_deref(), Some("inner"));
    }

    #[test]
    fn test_credentials_for_unknown_source_are_ignored() {
        let only = layer(vec![credential("Ghost", CredentialKey::Username, "me")]);
        assert!(fold(&[only]).is_empty());
    }
}
