//! Filename construction and sanitization.
//!
//! Renamed files are labelled `{journal} {year} {first author} {description}
//! {pmid}.pdf`. Journal abbreviations and free-text descriptions can contain
//! characters that are not allowed in filenames on every platform, so the
//! composed name is passed through [`sanitize_filename`] before use.
//!
//! # Examples
//!
//! ```
//! use pmidlabel::format;
//!
//! assert_eq!(format::sanitize_filename("Cell Rep: Med  2024?.pdf"), "Cell Rep Med 2024 .pdf");
//! assert_eq!(format::sanitize_filename("  a/b\\c  "), "a b c");
//! ```

use super::*;

/// Characters that are replaced by a space.
const ILLEGAL_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Makes a string safe to use as a filename.
///
/// - Replaces each of `< > : " / \ | ? *` with a space
/// - Collapses any run of whitespace into a single space
/// - Trims leading and trailing whitespace
///
/// The result never contains the replaced characters, never has two
/// consecutive spaces and never starts or ends with whitespace. Applying the
/// function twice gives the same result as applying it once.
///
/// # Examples
///
/// ```
/// use pmidlabel::format::sanitize_filename;
///
/// assert_eq!(sanitize_filename("J Clin Invest 2023 Smith a|b 40237684.pdf"),
///            "J Clin Invest 2023 Smith a b 40237684.pdf");
/// assert_eq!(sanitize_filename("No    Extra\tSpaces"), "No Extra Spaces");
/// ```
pub fn sanitize_filename(name: &str) -> String {
  name
    .chars()
    .map(|c| if ILLEGAL_CHARS.contains(&c) { ' ' } else { c })
    .collect::<String>()
    .split_whitespace() // This splits on any whitespace and removes empty strings
    .collect::<Vec<&str>>()
    .join(" ")
}

/// Composes the sanitized filename a PDF is renamed to.
///
/// The description is inserted verbatim before sanitization, so it is subject
/// to the same character replacement as the metadata.
pub fn target_filename(citation: &Citation, description: &str, pmid: &Pmid) -> String {
  sanitize_filename(&format!(
    "{} {} {} {} {}.pdf",
    citation.venue, citation.year, citation.first_author_surname, description, pmid
  ))
}
