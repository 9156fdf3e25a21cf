#![warn(missing_docs)]
//! Library support for the starli CLI.

/// Tar extraction for the specs archive.
mod archive;
/// Template catalog over the specs cache.
mod catalog;
/// Command-line interface wiring and dispatch.
mod cli;
/// Command implementations.
mod commands;
/// Configuration loading and validation.
mod config;
/// Error handling for the crate.
mod error;
/// Project generation from templates.
mod generate;
/// Advisory locking for the specs cache.
mod lock;
/// Diagnostic logging setup.
mod logging;
/// Color palette and styling for CLI output.
mod palette;
/// Cache layout and path utilities.
mod paths;
/// Spinner and status lines.
mod progress;
/// Remote object storage access.
mod remote;
/// Specs cache synchronization.
mod sync;
/// Template descriptor parsing.
mod template;
/// Fixtures shared by unit tests.
#[cfg(test)]
mod testutil;

pub use crate::error::{Error, Result};

/// Run the CLI, returning a structured error on failure.
pub async fn run() -> Result<()> {
    cli::run().await
}
