//! A library for renaming PubMed PDFs using the bibliographic metadata of the
//! record they were downloaded from.
//!
//! A file named after its PubMed identifier (`40237684.pdf`) is renamed to
//! `{journal} {year} {first author} {description} {pmid}.pdf`, with the journal,
//! year and author taken from the MEDLINE record that NCBI E-utilities serves for
//! that identifier.
//!
//! # Example
//! ```rust,no_run
//! use pmidlabel::{CollisionPolicy, Config, DeclineOverwrite, PubMedClient, Renamer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!   let config = Config::default();
//!   let renamer = Renamer::new(PubMedClient::new(&config)?);
//!
//!   let outcome = renamer
//!     .rename_in_dir(
//!       std::path::Path::new("."),
//!       "40237684",
//!       "Core outcomes male infert",
//!       CollisionPolicy::SkipSilently,
//!       &DeclineOverwrite,
//!     )
//!     .await?;
//!   println!("{outcome:?}");
//!
//!   Ok(())
//! }
//! ```

#![warn(missing_docs, clippy::missing_docs_in_private_items)]
use std::{
  fmt,
  path::{Path, PathBuf},
  str::FromStr,
  time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
#[cfg(test)] use tracing_test::traced_test;

pub mod batch;
pub mod clients;
pub mod config;
pub mod errors;
pub mod format;
pub mod medline;
pub mod pmid;
pub mod rename;

pub use batch::{BatchReport, BatchTally, BatchWorker, FileOutcome};
pub use clients::PubMedClient;
pub use config::Config;
use errors::LabelError;
pub use medline::{Citation, Field, MedlineRecord};
pub use pmid::Pmid;
pub use rename::{CollisionPolicy, DeclineOverwrite, OverwritePrompt, RenameOutcome, Renamer};
