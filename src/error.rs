//! # Error Handling
//!
//! This module defines the centralized error type for `nuget-resolve`. It
//! uses the `thiserror` library to create an `Error` enum covering every
//! failure a caller can observe.
//!
//! Most configuration problems never reach this type: malformed or missing
//! `nuget.config` files, invalid feed URLs and unreadable props files are
//! logged and treated as "no contribution". The variants here cover the
//! reported failures:
//!
//! - XML documents that cannot be parsed or serialized when the caller asked
//!   for a mutation.
//! - Documents rejected because they declare a DTD or entities.
//! - Central version updates naming an unknown package, or additions naming
//!   an existing one.
//! - Migration preconditions and batch cancellation.
//! - Filesystem and I/O failures.
//!
//! The `Result` type alias is used to return `Result<T, Error>` from
//! functions throughout the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for nuget-resolve operations
#[derive(Error, Debug)]
pub enum Error {
    /// An XML document could not be parsed or written back.
    #[error("XML error in {}: {message}", path.display())]
    Xml { path: PathBuf, message: String },

    /// A document declared a DTD or entities and was refused.
    #[error("Refusing to load {}: document declares a DOCTYPE or ENTITY", path.display())]
    UnsafeDocument { path: PathBuf },

    /// A central version update named a package that is not declared.
    #[error("Package '{id}' is not declared in {}", path.display())]
    PackageVersionNotFound { id: String, path: PathBuf },

    /// A central version addition named a package that is already declared.
    #[error("Package '{id}' is already declared in {}", path.display())]
    PackageVersionExists { id: String, path: PathBuf },

    /// A migration precondition failed or a migration step could not run.
    #[error("Migration error for {}: {message}", project.display())]
    Migration { project: PathBuf, message: String },

    /// A batch operation was cancelled before it completed.
    #[error("Operation cancelled")]
    Cancelled,

    /// A filesystem operation failed.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
