//! Reading `packages.config`.
//!
//! ```xml
//! <packages>
//!   <package id="Newtonsoft.Json" version="13.0.3" targetFramework="net48" />
//! </packages>
//! ```

use std::path::Path;

use log::debug;

use crate::error::{Error, Result};
use crate::xml::XmlDocument;

/// One `<package>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyPackage {
    pub id: String,
    pub version: String,
    pub target_framework: Option<String>,
    /// `developmentDependency="true"`; migrated as `PrivateAssets="all"`.
    pub development_dependency: bool,
}

/// Read every complete `(id, version)` entry from a `packages.config` file.
///
/// Entries missing an id or a version are skipped. A file that is not
/// well-formed XML, or whose root is not `<packages>`, is an error.
pub fn read_legacy_packages(path: &Path) -> Result<Vec<LegacyPackage>> {
    let doc = XmlDocument::load(path)?;
    if !doc.is_named(doc.root(), "packages") {
        return Err(Error::Xml {
            path: path.to_path_buf(),
            message: "root element is not <packages>".to_string(),
        });
    }

    let mut packages = Vec::new();
    for node in doc.children_named(doc.root(), "package") {
        let id = doc.attribute(node, "id").map(str::trim).unwrap_or_default();
        let version = doc
            .attribute(node, "version")
            .map(str::trim)
            .unwrap_or_default();
        if id.is_empty() || version.is_empty() {
            debug!(
                "Skipping incomplete package entry (id '{}', version '{}') in {}",
                id,
                version,
                path.display()
            );
            continue;
        }

        packages.push(LegacyPackage {
            id: id.to_string(),
            version: version.to_string(),
            target_framework: doc.attribute(node, "targetFramework").map(str::to_string),
            development_dependency: doc
                .attribute(node, "developmentDependency")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("true")),
        });
    }
    Ok(packages)
}
