//! Parsing a single `nuget.config` into directives.
//!
//! The parser never fails: a document that cannot be decoded, is malformed,
//! or declares a DTD contributes an empty directive list and the caller
//! carries on with the remaining files.
//!
//! Directives from `packageSources` come first, then `disabledPackageSources`,
//! then `packageSourceCredentials`, so that disable and credential entries
//! always see the sources declared in the same file. Within a section,
//! directives keep document order, and every directive records its document
//! position.

use std::path::Path;
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;

use crate::error::Error;
use crate::xml::XmlDocument;

static ENCODED_NAME_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_x([0-9A-Fa-f]{4})_").expect("static regex is valid"));

/// Credential entry kinds under `packageSourceCredentials`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKey {
    Username,
    ClearTextPassword,
    /// Platform-encrypted password.
    Password,
}

impl CredentialKey {
    fn parse(key: &str) -> Option<Self> {
        if key.eq_ignore_ascii_case("Username") {
            Some(Self::Username)
        } else if key.eq_ignore_ascii_case("ClearTextPassword") {
            Some(Self::ClearTextPassword)
        } else if key.eq_ignore_ascii_case("Password") {
            Some(Self::Password)
        } else {
            None
        }
    }
}

/// What a directive does to the accumulated source map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveKind {
    Clear,
    Add {
        name: String,
        url: String,
        protocol_version: Option<u8>,
    },
    Remove {
        name: String,
    },
    Disable {
        name: String,
        disabled: bool,
    },
    Credential {
        source: String,
        key: CredentialKey,
        value: String,
    },
}

/// A directive and the document position it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDirective {
    pub position: usize,
    pub kind: DirectiveKind,
}

/// Parse raw config bytes into directives.
pub fn parse_document(bytes: &[u8]) -> Vec<ConfigDirective> {
    parse_document_at(bytes, Path::new("<memory>"))
}

/// Parse raw config bytes into directives, naming `path` in log messages.
pub fn parse_document_at(bytes: &[u8], path: &Path) -> Vec<ConfigDirective> {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!("Ignoring config {}: not valid UTF-8: {}", path.display(), e);
            return Vec::new();
        }
    };

    let doc = match XmlDocument::parse(text, path) {
        Ok(doc) => doc,
        Err(Error::UnsafeDocument { .. }) => {
            warn!(
                "Ignoring config {}: document declares a DOCTYPE or ENTITY",
                path.display()
            );
            return Vec::new();
        }
        Err(e) => {
            warn!("Ignoring malformed config {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    if !doc.is_named(doc.root(), "configuration") {
        debug!(
            "Ignoring config {}: root element is not <configuration>",
            path.display()
        );
        return Vec::new();
    }

    directives_from(&doc)
}

fn directives_from(doc: &XmlDocument) -> Vec<ConfigDirective> {
    let mut sources = Vec::new();
    let mut disabled = Vec::new();
    let mut credentials = Vec::new();
    let mut position = 0usize;
    let mut next = |kind: DirectiveKind| {
        let directive = ConfigDirective { position, kind };
        position += 1;
        directive
    };

    for section in doc.child_elements(doc.root()) {
        match doc.local_name(section) {
            Some("packageSources") => {
                for item in doc.child_elements(section) {
                    if let Some(kind) = source_directive(doc, item) {
                        sources.push(next(kind));
                    }
                }
            }
            Some("disabledPackageSources") => {
                for item in doc.children_named(section, "add") {
                    if let Some(kind) = disable_directive(doc, item) {
                        disabled.push(next(kind));
                    }
                }
            }
            Some("packageSourceCredentials") => {
                for source in doc.child_elements(section) {
                    let Some(encoded) = doc.local_name(source) else {
                        continue;
                    };
                    let source_name = decode_element_name(encoded);
                    for item in doc.children_named(source, "add") {
                        let key = doc.attribute(item, "key").and_then(CredentialKey::parse);
                        let value = doc.attribute(item, "value");
                        if let (Some(key), Some(value)) = (key, value) {
                            credentials.push(next(DirectiveKind::Credential {
                                source: source_name.clone(),
                                key,
                                value: value.to_string(),
                            }));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    sources.extend(disabled);
    sources.extend(credentials);
    sources
}

fn source_directive(doc: &XmlDocument, item: xot::Node) -> Option<DirectiveKind> {
    match doc.local_name(item)? {
        "clear" => Some(DirectiveKind::Clear),
        "add" => {
            let name = doc.attribute(item, "key")?;
            let url = doc.attribute(item, "value")?;
            let protocol_version = doc
                .attribute(item, "protocolVersion")
                .and_then(|v| v.trim().parse().ok());
            Some(DirectiveKind::Add {
                name: name.to_string(),
                url: url.to_string(),
                protocol_version,
            })
        }
        "remove" => doc.attribute(item, "key").map(|name| DirectiveKind::Remove {
            name: name.to_string(),
        }),
        _ => None,
    }
}

fn disable_directive(doc: &XmlDocument, item: xot::Node) -> Option<DirectiveKind> {
    let name = doc.attribute(item, "key")?;
    let value = doc.attribute(item, "value")?.trim();
    let disabled = if value.eq_ignore_ascii_case("true") {
        true
    } else if value.eq_ignore_ascii_case("false") {
        false
    } else {
        debug!("Skipping disabled-source entry '{}' with value '{}'", name, value);
        return None;
    };
    Some(DirectiveKind::Disable {
        name: name.to_string(),
        disabled,
    })
}

/// Decode `_xHHHH_` escapes used for source names that are not valid XML
/// element names (`My_x0020_Feed` -> `My Feed`).
pub fn decode_element_name(name: &str) -> String {
    ENCODED_NAME_CHAR
        .replace_all(name, |caps: &regex::Captures| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(xml: &str) -> Vec<DirectiveKind> {
        parse_document(xml.as_bytes())
            .into_iter()
            .map(|d| d.kind)
            .collect()
    }

    #[test]
    fn test_parse_sources_in_order() {
        let parsed = kinds(
            r#"<configuration>
  <packageSources>
    <clear />
    <add key="nuget.org" value="https://api.nuget.org/v3/index.json" protocolVersion="3" />
    <remove key="Old" />
  </packageSources>
</configuration>"#,
        );
        assert_eq!(
            parsed,
            vec![
                DirectiveKind::Clear,
                DirectiveKind::Add {
                    name: "nuget.org".to_string(),
                    url: "https://api.nuget.org/v3/index.json".to_string(),
                    protocol_version: Some(3),
                },
                DirectiveKind::Remove {
                    name: "Old".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_add_without_key_is_skipped() {
        let parsed = kinds(
            r#"<configuration><packageSources>
    <add value="https://nokey" />
    <add key="Good" value="https://good" />
</packageSources></configuration>"#,
        );
        assert_eq!(parsed.len(), 1);
        assert!(matches!(&parsed[0], DirectiveKind::Add { name, .. } if name == "Good"));
    }

    #[test]
    fn test_disabled_sources_parse_booleans_case_insensitively() {
        let parsed = kinds(
            r#"<configuration><disabledPackageSources>
    <add key="A" value="TRUE" />
    <add key="B" value="False" />
    <add key="C" value="maybe" />
</disabledPackageSources></configuration>"#,
        );
        assert_eq!(
            parsed,
            vec![
                DirectiveKind::Disable {
                    name: "A".to_string(),
                    disabled: true
                },
                DirectiveKind::Disable {
                    name: "B".to_string(),
                    disabled: false
                },
            ]
        );
    }

    #[test]
    fn test_credentials_keep_document_order() {
        let parsed = parse_document(
            br#"<configuration><packageSourceCredentials>
    <Private>
      <add key="Username" value="me" />
      <add key="Password" value="ENCRYPTED" />
      <add key="ClearTextPassword" value="secret" />
      <add key="ValidAuthenticationTypes" value="basic" />
    </Private>
</packageSourceCredentials></configuration>"#,
        );
        assert_eq!(parsed.len(), 3);
        assert!(parsed.windows(2).all(|w| w[0].position < w[1].position));
        assert!(matches!(
            &parsed[2].kind,
            DirectiveKind::Credential { key: CredentialKey::ClearTextPassword, value, .. } if value == "secret"
        ));
    }

    #[test]
    fn test_credential_section_names_are_decoded() {
        let parsed = kinds(
            r#"<configuration><packageSourceCredentials>
    <My_x0020_Feed><add key="Username" value="me" /></My_x0020_Feed>
</packageSourceCredentials></configuration>"#,
        );
        assert!(matches!(
            &parsed[0],
            DirectiveKind::Credential { source, .. } if source == "My Feed"
        ));
    }

    #[test]
    fn test_sections_emit_sources_first() {
        let parsed = kinds(
            r#"<configuration>
  <disabledPackageSources><add key="A" value="true" /></disabledPackageSources>
  <packageSources><add key="A" value="https://a" /></packageSources>
</configuration>"#,
        );
        assert!(matches!(parsed[0], DirectiveKind::Add { .. }));
        assert!(matches!(parsed[1], DirectiveKind::Disable { .. }));
    }

    #[test]
    fn test_doctype_document_is_rejected_wholesale() {
        let parsed = kinds(
            r#"<?xml version="1.0"?>
<!DOCTYPE configuration [<!ENTITY feed SYSTEM "file:///etc/passwd">]>
<configuration><packageSources><add key="Evil" value="https://evil" /></packageSources></configuration>"#,
        );
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_malformed_document_is_empty() {
        assert!(kinds("<configuration><packageSources>").is_empty());
        assert!(parse_document(&[0xff, 0xfe, 0x00]).is_empty());
        assert!(kinds("<notconfig><packageSources><add key=\"a\" value=\"https://a\"/></packageSources></notconfig>").is_empty());
    }

    #[test]
    fn test_rejected_document_logs_warning() {
        testing_logger::setup();
        let _ = parse_document_at(
            b"<!DOCTYPE x [<!ENTITY a \"b\">]><configuration/>",
            Path::new("evil/nuget.config"),
        );
        testing_logger::validate(|captured_logs| {
            assert!(captured_logs.iter().any(|log| {
                log.level == log::Level::Warn && log.body.contains("evil/nuget.config")
            }));
        });
    }

    #[test]
    fn test_decode_element_name() {
        assert_eq!(decode_element_name("My_x0020_Feed"), "My Feed");
        assert_eq!(decode_element_name("plain"), "plain");
        assert_eq!(decode_element_name("a_x002E_b"), "a.b");
    }
}
