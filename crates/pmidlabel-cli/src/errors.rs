//! Error types for the pmidlabel command line.
//!
//! Library failures (bad PMID, missing file, fetch and parse errors, rename
//! errors) arrive as [`LabelError`] and keep their message. The remaining
//! variants cover what only the front ends do:
//! - Prompting the user
//! - Listing PDFs for `:pick`
//! - Setting up the log file of the drop target
//!
//! `main` prints any of these as `Error: <message>` on standard error and exits
//! with status 1.

use pmidlabel::errors::LabelError;
use thiserror::Error;

/// Errors that can occur while running a front end.
#[derive(Error, Debug)]
pub enum CliErrors {
  /// Errors from user interaction dialogs
  #[error(transparent)]
  Dialoguer(#[from] dialoguer::Error),

  /// Errors from the underlying pmidlabel library
  #[error(transparent)]
  Label(#[from] LabelError),

  /// File system and IO operation errors
  #[error(transparent)]
  IO(#[from] std::io::Error),

  /// Glob pattern matching errors
  #[error(transparent)]
  Glob(#[from] glob::PatternError),

  /// The log file appender could not be created
  #[error(transparent)]
  LogInit(#[from] tracing_appender::rolling::InitError),
}
