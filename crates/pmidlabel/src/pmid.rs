//! PubMed identifiers.
//!
//! A [`Pmid`] is the fixed 8-digit numeric identifier that names both the
//! downloaded PDF (`40237684.pdf`) and the PubMed record it came from. Parsing is
//! strict: the command line rejects anything that is not exactly eight ASCII
//! digits before touching the network.
//!
//! # Examples
//!
//! ```
//! use pmidlabel::Pmid;
//!
//! let pmid: Pmid = "40237684".parse().unwrap();
//! assert_eq!(pmid.pdf_file_name(), "40237684.pdf");
//!
//! assert!("4023768".parse::<Pmid>().is_err());
//! assert!("4023 7684".parse::<Pmid>().is_err());
//! ```

use lazy_static::lazy_static;
use regex::Regex;

use super::*;

lazy_static! {
  static ref PMID: Regex = Regex::new(r"^[0-9]{8}$").unwrap();
}

/// A validated 8-digit PubMed identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pmid(String);

impl Pmid {
  /// Extracts the identifier from the file stem of a dropped PDF.
  ///
  /// Returns `None` when the path does not have a `.pdf` extension (in any
  /// case) or when its stem, with surrounding whitespace removed, is not a
  /// valid PMID. Batch processing skips such files without reporting an error.
  pub fn from_pdf_path(path: &Path) -> Option<Self> {
    let extension = path.extension()?.to_str()?;
    if !extension.eq_ignore_ascii_case("pdf") {
      return None;
    }

    let stem = path.file_stem()?.to_str()?;
    stem.trim().parse().ok()
  }

  /// The identifier as a string slice.
  pub fn as_str(&self) -> &str { &self.0 }

  /// The file name a PDF for this identifier is expected to have.
  pub fn pdf_file_name(&self) -> String { format!("{}.pdf", self.0) }
}

impl FromStr for Pmid {
  type Err = LabelError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if PMID.is_match(s) {
      Ok(Self(s.to_owned()))
    } else {
      Err(LabelError::InvalidIdentifier(s.to_owned()))
    }
  }
}

impl fmt::Display for Pmid {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}
