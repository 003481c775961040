//! # CLI Command Implementations
//!
//! One module per `nuget-resolve` subcommand. Each module defines an `Args`
//! struct derived with `clap` and an `execute` function that calls into the
//! `nuget_resolve` library and prints the result, either as text or, where
//! supported, as JSON with `--json`.

pub mod central;
pub mod completions;
pub mod migrate;
pub mod packages;
pub mod sources;
