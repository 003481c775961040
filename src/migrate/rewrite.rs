//! In-memory rewrite of a legacy project file.
//!
//! The rewrite removes what `packages.config` restore needed and adds one
//! `PackageReference` per migrated package:
//!
//! 1. `Reference` items whose `HintPath` points into a `packages` folder,
//!    pruning item groups left without elements;
//! 2. `Import`s of NuGet restore targets (`.nuget\NuGet.targets`,
//!    `packages\...\build\*.targets`) and the `EnsureNuGetPackageBuildImports`
//!    target that checks them;
//! 3. new `PackageReference` items, created in the project's namespace.

use xot::Node;

use super::legacy::LegacyPackage;
use crate::error::Result;
use crate::xml::XmlDocument;

const RESTORE_GUARD_TARGET: &str = "EnsureNuGetPackageBuildImports";

/// Counts of what a rewrite changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    pub removed_references: usize,
    pub removed_imports: usize,
    pub added_references: usize,
}

/// Whether the project already declares any `PackageReference` item.
pub fn has_package_references(doc: &XmlDocument) -> bool {
    !doc.descendants_named(doc.root(), "PackageReference")
        .is_empty()
}

/// Apply the full migration rewrite to `doc`.
pub fn rewrite_project(doc: &mut XmlDocument, packages: &[LegacyPackage]) -> Result<RewriteSummary> {
    let removed_references = remove_package_assembly_references(doc)?;
    let removed_imports = remove_restore_imports(doc)?;
    let added_references = append_package_references(doc, packages)?;

    Ok(RewriteSummary {
        removed_references,
        removed_imports,
        added_references,
    })
}

/// Returns true if any segment of `hint_path` is a `packages` folder.
pub fn is_packages_hint_path(hint_path: &str) -> bool {
    hint_path
        .split(['/', '\\'])
        .any(|segment| segment.eq_ignore_ascii_case("packages"))
}

/// Returns true for imports of NuGet restore targets.
pub fn is_restore_import(project: &str) -> bool {
    let lower = project.to_ascii_lowercase();
    lower.contains(".nuget") || (lower.trim_end().ends_with(".targets") && lower.contains("packages"))
}

fn remove_package_assembly_references(doc: &mut XmlDocument) -> Result<usize> {
    let references: Vec<Node> = doc
        .descendants_named(doc.root(), "Reference")
        .into_iter()
        .filter(|reference| {
            doc.first_child_named(*reference, "HintPath")
                .and_then(|hint| doc.text(hint))
                .is_some_and(|hint| is_packages_hint_path(&hint))
        })
        .collect();

    let mut touched_groups: Vec<Node> = Vec::new();
    for reference in &references {
        if let Some(group) = doc.parent(*reference) {
            if doc.is_named(group, "ItemGroup") && !touched_groups.contains(&group) {
                touched_groups.push(group);
            }
        }
        doc.remove(*reference)?;
    }

    for group in touched_groups {
        if doc.child_elements(group).is_empty() {
            doc.remove(group)?;
        }
    }

    Ok(references.len())
}

fn remove_restore_imports(doc: &mut XmlDocument) -> Result<usize> {
    let imports: Vec<Node> = doc
        .descendants_named(doc.root(), "Import")
        .into_iter()
        .filter(|import| {
            doc.attribute(*import, "Project")
                .is_some_and(is_restore_import)
        })
        .collect();
    for import in &imports {
        doc.remove(*import)?;
    }

    let guards: Vec<Node> = doc
        .children_named(doc.root(), "Target")
        .into_iter()
        .filter(|target| doc.attribute(*target, "Name") == Some(RESTORE_GUARD_TARGET))
        .collect();
    for guard in guards {
        doc.remove(guard)?;
    }

    Ok(imports.len())
}

fn append_package_references(doc: &mut XmlDocument, packages: &[LegacyPackage]) -> Result<usize> {
    if packages.is_empty() {
        return Ok(0);
    }

    let group = match reference_item_group(doc) {
        Some(group) => group,
        None => {
            let group = doc.create_element("ItemGroup");
            let root = doc.root();
            doc.append_element(root, group)?;
            group
        }
    };

    for package in packages {
        let reference = doc.create_element("PackageReference");
        doc.set_attribute(reference, "Include", &package.id);
        doc.set_attribute(reference, "Version", &package.version);
        if package.development_dependency {
            doc.set_attribute(reference, "PrivateAssets", "all");
        }
        doc.append_element(group, reference)?;
    }

    Ok(packages.len())
}

/// First unconditioned top-level item group that still holds `Reference` items.
fn reference_item_group(doc: &XmlDocument) -> Option<Node> {
    doc.children_named(doc.root(), "ItemGroup")
        .into_iter()
        .find(|group| {
            doc.attribute(*group, "Condition").is_none()
                && doc.first_child_named(*group, "Reference").is_some()
        })
}
