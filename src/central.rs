//! # Central Package Versions
//!
//! With central package management, versions are declared once in a
//! `Directory.Packages.props` file and projects reference packages without a
//! version. This module locates that file for a project, reads it, and edits
//! individual declarations.
//!
//! ## Encodings
//!
//! Both MSBuild encodings of a declaration are supported and may be mixed in
//! one file:
//!
//! ```xml
//! <PackageVersion Include="Serilog" Version="3.1.1" />
//! <PackageVersion Include="Polly">
//!   <Version>8.2.0</Version>
//! </PackageVersion>
//! ```
//!
//! An update rewrites the version in whichever encoding the entry already
//! uses. Ids are compared case-insensitively.
//!
//! ## Failure behavior
//!
//! Reading never fails: a missing or malformed file yields an empty map.
//! Updating an undeclared id is an error rather than an implicit insert; new
//! declarations go through [`add_package_version`]. Removing an undeclared id
//! is a no-op.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;
use xot::Node;

use crate::defaults::PROPS_FILE_NAME;
use crate::error::{Error, Result};
use crate::xml::XmlDocument;

const PROPS_TEMPLATE: &str = r#"<Project>
  <PropertyGroup>
    <ManagePackageVersionsCentrally>true</ManagePackageVersionsCentrally>
  </PropertyGroup>
  <ItemGroup>
  </ItemGroup>
</Project>
"#;

/// How a declaration carries its version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionEncoding {
    /// `<PackageVersion Include="Id" Version="1.0" />`
    Attribute,
    /// `<PackageVersion Include="Id"><Version>1.0</Version></PackageVersion>`
    Element,
}

/// One central version declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CentralVersion {
    pub id: String,
    pub version: String,
    pub encoding: VersionEncoding,
}

/// Package id → version map with case-insensitive lookup, in declaration
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CentralVersionMap {
    entries: Vec<CentralVersion>,
}

impl CentralVersionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the declaration for `entry.id`.
    pub fn insert(&mut self, entry: CentralVersion) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.id.eq_ignore_ascii_case(&entry.id))
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Version declared for `id`, case-insensitively.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entry(id).map(|entry| entry.version.as_str())
    }

    /// Full declaration for `id`, case-insensitively.
    pub fn entry(&self, id: &str) -> Option<&CentralVersion> {
        self.entries
            .iter()
            .find(|entry| entry.id.eq_ignore_ascii_case(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entry(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CentralVersion> {
        self.entries.iter()
    }
}

/// Find the `Directory.Packages.props` that applies to `project`.
///
/// The search starts in the project's own directory and walks upward; the
/// nearest file wins.
pub fn find_props_file(project: &Path) -> Option<PathBuf> {
    let start = if project.is_dir() {
        project
    } else {
        project.parent()?
    };
    let start = start
        .canonicalize()
        .unwrap_or_else(|_| start.to_path_buf());

    start
        .ancestors()
        .map(|dir| dir.join(PROPS_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Read every declaration in `props`.
///
/// Returns an empty map if the file is missing or cannot be parsed.
pub fn read_package_versions(props: &Path) -> CentralVersionMap {
    if !props.is_file() {
        return CentralVersionMap::new();
    }

    let doc = match XmlDocument::load(props) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Ignoring central versions in {}: {}", props.display(), e);
            return CentralVersionMap::new();
        }
    };

    let mut map = CentralVersionMap::new();
    for node in declarations(&doc) {
        if let Some(entry) = read_declaration(&doc, node) {
            map.insert(entry);
        }
    }
    map
}

/// Rewrite the version of an existing declaration.
///
/// Fails with [`Error::PackageVersionNotFound`] if `id` is not declared; the
/// file is left untouched in that case.
pub fn update_package_version(props: &Path, id: &str, new_version: &str) -> Result<()> {
    let mut doc = XmlDocument::load(props)?;
    let node = find_declaration(&doc, id).ok_or_else(|| Error::PackageVersionNotFound {
        id: id.to_string(),
        path: props.to_path_buf(),
    })?;

    if doc.attribute(node, "Version").is_some() {
        doc.set_attribute(node, "Version", new_version);
    } else if let Some(version) = doc.first_child_named(node, "Version") {
        doc.set_text(version, new_version)?;
    } else {
        doc.set_attribute(node, "Version", new_version);
    }

    doc.save()?;
    info!(
        "Updated central version of {} to {} in {}",
        id,
        new_version,
        props.display()
    );
    Ok(())
}

/// Remove the declaration for `id`.
///
/// Returns `Ok(false)` when there was nothing to remove.
pub fn remove_package_version(props: &Path, id: &str) -> Result<bool> {
    if !props.is_file() {
        return Ok(false);
    }

    let mut doc = XmlDocument::load(props)?;
    let Some(node) = find_declaration(&doc, id) else {
        return Ok(false);
    };

    doc.remove(node)?;
    doc.save()?;
    info!("Removed central version of {} from {}", id, props.display());
    Ok(true)
}

/// Declare a new central version.
///
/// Fails with [`Error::PackageVersionExists`] if `id` is already declared.
/// Creates `props` with central management enabled if it does not exist.
pub fn add_package_version(props: &Path, id: &str, version: &str) -> Result<()> {
    let mut doc = if props.is_file() {
        XmlDocument::load(props)?
    } else {
        XmlDocument::parse(PROPS_TEMPLATE, props)?
    };

    if find_declaration(&doc, id).is_some() {
        return Err(Error::PackageVersionExists {
            id: id.to_string(),
            path: props.to_path_buf(),
        });
    }

    let group = match target_item_group(&doc) {
        Some(group) => group,
        None => {
            let group = doc.create_element("ItemGroup");
            let root = doc.root();
            doc.append_element(root, group)?;
            group
        }
    };

    let declaration = doc.create_element("PackageVersion");
    doc.set_attribute(declaration, "Include", id);
    doc.set_attribute(declaration, "Version", version);
    doc.append_element(group, declaration)?;

    doc.save()?;
    info!(
        "Added central version {} {} to {}",
        id,
        version,
        props.display()
    );
    Ok(())
}

/// Whether `props` turns on central package management.
pub fn is_central_management_enabled(props: &Path) -> bool {
    match XmlDocument::load(props) {
        Ok(doc) => manages_versions_centrally(&doc),
        Err(_) => false,
    }
}

/// Whether a loaded MSBuild document sets `ManagePackageVersionsCentrally`.
pub(crate) fn manages_versions_centrally(doc: &XmlDocument) -> bool {
    management_flag(doc).unwrap_or(false)
}

/// The last `ManagePackageVersionsCentrally` value in a document, if any.
pub(crate) fn management_flag(doc: &XmlDocument) -> Option<bool> {
    doc.descendants_named(doc.root(), "ManagePackageVersionsCentrally")
        .into_iter()
        .filter_map(|node| doc.text(node))
        .last()
        .map(|value| value.eq_ignore_ascii_case("true"))
}

fn declarations(doc: &XmlDocument) -> Vec<Node> {
    doc.descendants_named(doc.root(), "PackageVersion")
        .into_iter()
        .filter(|node| doc.attribute(*node, "Include").is_some())
        .collect()
}

fn find_declaration(doc: &XmlDocument, id: &str) -> Option<Node> {
    declarations(doc).into_iter().find(|node| {
        doc.attribute(*node, "Include")
            .is_some_and(|include| include.trim().eq_ignore_ascii_case(id))
    })
}

fn read_declaration(doc: &XmlDocument, node: Node) -> Option<CentralVersion> {
    let id = doc.attribute(node, "Include")?.trim().to_string();
    if id.is_empty() {
        return None;
    }

    if let Some(version) = doc.attribute(node, "Version") {
        return Some(CentralVersion {
            id,
            version: version.trim().to_string(),
            encoding: VersionEncoding::Attribute,
        });
    }

    let version = doc
        .first_child_named(node, "Version")
        .and_then(|element| doc.text(element))?;
    Some(CentralVersion {
        id,
        version,
        encoding: VersionEncoding::Element,
    })
}

fn target_item_group(doc: &XmlDocument) -> Option<Node> {
    if let Some(first) = declarations(doc).first() {
        return doc.parent(*first);
    }
    doc.children_named(doc.root(), "ItemGroup")
        .into_iter()
        .find(|group| doc.attribute(*group, "Condition").is_none())
}
