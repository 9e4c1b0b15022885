//! Error types for the pmidlabel library.
//!
//! Every step of a rename can fail in its own way:
//! - The identifier is not an 8-digit PMID
//! - The source PDF is missing
//! - The E-utilities request fails or returns a non-success status
//! - The MEDLINE record lacks one of the fields the filename needs
//! - The rename itself fails on the filesystem
//!
//! # Examples
//!
//! ```no_run
//! use pmidlabel::{errors::LabelError, CollisionPolicy, Config, DeclineOverwrite, PubMedClient, Renamer};
//!
//! # async fn example() -> Result<(), LabelError> {
//! let renamer = Renamer::new(PubMedClient::new(&Config::default())?);
//! let dir = std::path::Path::new(".");
//! match renamer
//!   .rename_in_dir(dir, "4023768", "notes", CollisionPolicy::Prompt, &DeclineOverwrite)
//!   .await
//! {
//!   Err(LabelError::InvalidIdentifier(id)) => println!("not a PMID: {id}"),
//!   Err(LabelError::Network(e)) => println!("PubMed request failed: {e}"),
//!   Err(e) => println!("Other error: {e}"),
//!   Ok(outcome) => println!("{outcome:?}"),
//! }
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::medline::Field;

/// Errors that can occur while renaming a PDF.
///
/// Variants either carry a short message describing what was wrong with the
/// input, or wrap the underlying error from the HTTP client, the filesystem or
/// the configuration parser.
#[derive(Error, Debug)]
pub enum LabelError {
  /// The identifier is not exactly eight ASCII digits.
  #[error("PMID must be 8 digits, got '{0}'")]
  InvalidIdentifier(String),

  /// The source PDF does not exist.
  #[error("PDF file not found: {}", .0.display())]
  NotFound(PathBuf),

  /// The metadata request failed.
  ///
  /// This covers:
  /// - The network being unavailable or the host unreachable
  /// - The request exceeding the configured timeout
  /// - A non-success HTTP status from E-utilities
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// The MEDLINE record did not contain a field needed for the filename.
  #[error("Could not find {field} for PMID {pmid}")]
  MissingField {
    /// Which field was absent
    field: Field,
    /// The PMID whose record was parsed
    pmid:  String,
  },

  /// A filesystem operation failed, most commonly the rename itself.
  #[error(transparent)]
  IO(#[from] std::io::Error),

  /// The configured endpoint is not a valid URL.
  #[error(transparent)]
  InvalidUrl(#[from] url::ParseError),

  /// The configuration file could not be parsed.
  #[error(transparent)]
  Config(#[from] toml::de::Error),

  /// The configuration parsed but holds an unusable value.
  #[error("Invalid configuration: {0}")]
  InvalidConfig(String),
}

