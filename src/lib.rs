//! # NuGet Resolution Library
//!
//! This library answers the questions a .NET build asks before it restores
//! packages, without running MSBuild or NuGet itself:
//!
//! - which package sources are in effect for a directory,
//! - which version of each referenced package a project gets, and from where,
//!
//! and it performs the one-way migration of legacy `packages.config` projects
//! to `PackageReference` items.
//!
//! ## Quick Example
//!
//! ```
//! use nuget_resolve::sources::{directive, fold_directives, NoDecryption};
//!
//! let machine = directive::parse_document(br#"<configuration>
//!   <packageSources>
//!     <add key="nuget.org" value="https://api.nuget.org/v3/index.json" />
//!   </packageSources>
//! </configuration>"#);
//! let repo = directive::parse_document(br#"<configuration>
//!   <disabledPackageSources>
//!     <add key="nuget.org" value="true" />
//!   </disabledPackageSources>
//! </configuration>"#);
//!
//! let sources = fold_directives([machine.as_slice(), repo.as_slice()], &NoDecryption);
//! assert_eq!(sources.len(), 1);
//! assert!(!sources[0].enabled);
//! ```
//!
//! ## Core Concepts
//!
//! - **Sources (`sources`)**: `nuget.config` documents are parsed into ordered
//!   directives, then folded from the most general file (user level) to the
//!   most specific one (closest to the start directory).
//! - **Central versions (`central`)**: reading and editing
//!   `Directory.Packages.props`.
//! - **Version provenance (`version_source`)**: whether a reference's version
//!   is inline, central, or an override.
//! - **Migration (`migrate`)**: transactional `packages.config` to
//!   `PackageReference` conversion, one project or a whole tree.
//! - **XML (`xml`)**: namespace-agnostic, format-preserving document editing
//!   shared by all of the above.

pub mod central;
pub mod defaults;
pub mod error;
pub mod filesystem;
pub mod migrate;
pub mod output;
pub mod sources;
pub mod validate;
pub mod version_source;
pub mod xml;

#[cfg(test)]
mod validate_proptest;
