//! Where a package reference's version comes from.
//!
//! A `PackageReference` gets its version from one of three places:
//!
//! - **Override**: a `VersionOverride` on the reference. Wins even when
//!   central management is active.
//! - **Central**: central management is active and `Directory.Packages.props`
//!   declares the package.
//! - **Inline**: anything else; the version (if any) is on the reference.

use std::path::Path;

use serde::Serialize;
use xot::Node;

use crate::central::{self, CentralVersionMap};
use crate::error::Result;
use crate::xml::XmlDocument;

/// Provenance of a resolved package version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionSource {
    Inline,
    Central,
    Override,
}

impl std::fmt::Display for VersionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inline => write!(f, "inline"),
            Self::Central => write!(f, "central"),
            Self::Override => write!(f, "override"),
        }
    }
}

/// A `PackageReference` item as declared in a project file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReference {
    pub id: String,
    pub version: Option<String>,
    pub version_override: Option<String>,
}

/// A package reference with its effective version and provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPackage {
    pub id: String,
    pub version: Option<String>,
    pub source: VersionSource,
}

/// Decide where `reference` gets its version from.
pub fn classify(
    reference: &PackageReference,
    central_active: bool,
    central: &CentralVersionMap,
) -> VersionSource {
    if reference.version_override.is_some() {
        VersionSource::Override
    } else if central_active && central.contains(&reference.id) {
        VersionSource::Central
    } else {
        VersionSource::Inline
    }
}

/// Classify `reference` and pick the version that applies.
pub fn resolve(
    reference: &PackageReference,
    central_active: bool,
    central: &CentralVersionMap,
) -> ResolvedPackage {
    let source = classify(reference, central_active, central);
    let version = match source {
        VersionSource::Override => reference.version_override.clone(),
        VersionSource::Central => central.get(&reference.id).map(str::to_string),
        VersionSource::Inline => reference.version.clone(),
    };
    ResolvedPackage {
        id: reference.id.clone(),
        version,
        source,
    }
}

/// All `PackageReference` items with an `Include` in a project document.
pub fn read_package_references(doc: &XmlDocument) -> Vec<PackageReference> {
    doc.descendants_named(doc.root(), "PackageReference")
        .into_iter()
        .filter_map(|node| {
            let id = doc.attribute(node, "Include")?.trim();
            if id.is_empty() {
                return None;
            }
            Some(PackageReference {
                id: id.to_string(),
                version: metadata(doc, node, "Version"),
                version_override: metadata(doc, node, "VersionOverride"),
            })
        })
        .collect()
}

/// Resolve every package reference of `project` against its central
/// version file.
///
/// Central management is active if the project itself sets
/// `ManagePackageVersionsCentrally`, or otherwise if the applicable
/// `Directory.Packages.props` does.
pub fn resolve_project_packages(project: &Path) -> Result<Vec<ResolvedPackage>> {
    let doc = XmlDocument::load(project)?;
    let references = read_package_references(&doc);

    let props = central::find_props_file(project);
    let central_map = props
        .as_deref()
        .map(central::read_package_versions)
        .unwrap_or_default();
    let central_active = central::management_flag(&doc).unwrap_or_else(|| {
        props
            .as_deref()
            .is_some_and(central::is_central_management_enabled)
    });

    Ok(references
        .iter()
        .map(|reference| resolve(reference, central_active, &central_map))
        .collect())
}

/// Item metadata given either as an attribute or as a child element.
fn metadata(doc: &XmlDocument, node: Node, name: &str) -> Option<String> {
    doc.attribute(node, name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| {
            doc.first_child_named(node, name)
                .and_then(|child| doc.text(child))
        })
}
