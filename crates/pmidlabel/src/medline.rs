//! Parsing of MEDLINE-formatted PubMed records.
//!
//! E-utilities returns `rettype=medline` records as plain text with one field
//! per line: a tag left-justified in a four column field, a dash, and the value.
//!
//! ```text
//! PMID- 40237684
//! DP  - 2023 Jan
//! TA  - J Clin Invest
//! FAU - Smith, John A
//! AU  - Smith JA
//! ```
//!
//! Long values wrap onto continuation lines indented by six spaces. None of the
//! fields used for filenames wrap, so continuation lines are ignored.
//!
//! [`MedlineRecord`] splits the text into tagged fields, and [`Citation`] pulls
//! out the three values a filename is built from.
//!
//! # Examples
//!
//! ```
//! use pmidlabel::{Citation, Pmid};
//!
//! let text = "\nPMID- 40237684\nDP  - 2023 Jan\nTA  - J Clin Invest\nAU  - Smith JA\n";
//! let pmid: Pmid = "40237684".parse().unwrap();
//! let citation = Citation::from_medline(text, &pmid).unwrap();
//!
//! assert_eq!(citation.venue, "J Clin Invest");
//! assert_eq!(citation.year, "2023");
//! assert_eq!(citation.first_author_surname, "Smith");
//! ```

use lazy_static::lazy_static;
use regex::Regex;

use super::*;

lazy_static! {
  /// A tagged field line: `TA  - J Clin Invest`.
  static ref FIELD_LINE: Regex = Regex::new(r"^([A-Z0-9]{1,4})\s*-\s+(.*)$").unwrap();
  /// Publication year at the start of a `DP` value: `2023 Jan 15`.
  static ref LEADING_YEAR: Regex = Regex::new(r"^([0-9]{4})").unwrap();
}

/// The MEDLINE fields a filename is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  /// Journal title abbreviation, tagged `TA`
  Venue,
  /// Date of publication, tagged `DP`
  Year,
  /// Author, tagged `AU`
  Author,
}

impl Field {
  /// The MEDLINE tag this field is read from.
  pub fn tag(&self) -> &'static str {
    match self {
      Field::Venue => "TA",
      Field::Year => "DP",
      Field::Author => "AU",
    }
  }
}

impl fmt::Display for Field {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Field::Venue => write!(f, "journal abbreviation"),
      Field::Year => write!(f, "publication year"),
      Field::Author => write!(f, "author"),
    }
  }
}

/// A MEDLINE record split into its tagged field lines, in document order.
#[derive(Debug, Clone, Default)]
pub struct MedlineRecord<'a> {
  /// `(tag, value)` pairs with the value trimmed
  fields: Vec<(&'a str, &'a str)>,
}

impl<'a> MedlineRecord<'a> {
  /// Splits `text` into tagged fields.
  ///
  /// Lines that are not of the form `TAG - value` (blank lines, continuation
  /// lines, anything else) are skipped.
  pub fn parse(text: &'a str) -> Self {
    let fields = text
      .lines()
      .filter_map(|line| {
        let captures = FIELD_LINE.captures(line)?;
        let tag = captures.get(1)?.as_str();
        let value = captures.get(2)?.as_str().trim();
        Some((tag, value))
      })
      .collect();

    Self { fields }
  }

  /// The value of the first line carrying `tag`, if any.
  ///
  /// Tags match exactly, so `AU` never matches a `FAU` line.
  pub fn first(&self, tag: &str) -> Option<&'a str> {
    self.fields.iter().find(|(t, _)| *t == tag).map(|(_, value)| *value)
  }

  /// Whether the text contained no tagged lines at all.
  pub fn is_empty(&self) -> bool { self.fields.is_empty() }
}

/// The bibliographic values a renamed file is labelled with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
  /// Journal title abbreviation, e.g. `J Clin Invest`
  pub venue:                String,
  /// Four digit publication year
  pub year:                 String,
  /// Surname of the first listed author
  pub first_author_surname: String,
}

impl Citation {
  /// Extracts the journal abbreviation, year and first author from a MEDLINE
  /// record.
  ///
  /// The first `TA`, `DP` and `AU` lines are used. The year is the four digits
  /// at the start of the `DP` value. The surname is everything before the first
  /// space of the `AU` value (`Smith JA` gives `Smith`), or the whole value when
  /// it has no space.
  ///
  /// # Errors
  ///
  /// Returns [`LabelError::MissingField`] naming the first field that is
  /// absent, empty, or (for the year) does not start with four digits.
  pub fn from_medline(text: &str, pmid: &Pmid) -> Result<Self, LabelError> {
    let record = MedlineRecord::parse(text);
    trace!("MEDLINE record for {pmid} has {} tagged lines", record.fields.len());
    if record.is_empty() {
      debug!("No MEDLINE fields in response for {pmid}, the record probably does not exist");
    }

    let missing = |field: Field| LabelError::MissingField { field, pmid: pmid.to_string() };

    let venue = record
      .first(Field::Venue.tag())
      .filter(|value| !value.is_empty())
      .ok_or_else(|| missing(Field::Venue))?;

    let year = record
      .first(Field::Year.tag())
      .and_then(|value| LEADING_YEAR.captures(value))
      .and_then(|captures| captures.get(1))
      .map(|m| m.as_str())
      .ok_or_else(|| missing(Field::Year))?;

    let author = record
      .first(Field::Author.tag())
      .filter(|value| !value.is_empty())
      .ok_or_else(|| missing(Field::Author))?;
    let surname = author.split(' ').next().unwrap_or(author);

    Ok(Self {
      venue:                venue.to_string(),
      year:                 year.to_string(),
      first_author_surname: surname.to_string(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Trimmed down response for PMID 40237684.
  const RECORD: &str = "
PMID- 40237684
OWN - NLM
STAT- MEDLINE
DP  - 2023 Jan
TI  - Core outcome sets for male infertility research: a systematic
      review.
FAU - Smith, John A
AU  - Smith JA
FAU - Doe, Jane
AU  - Doe J
LA  - eng
TA  - J Clin Invest
JT  - The Journal of clinical investigation
";

  fn pmid() -> Pmid { "40237684".parse().unwrap() }

  #[test]
  fn test_parse_record() {
    let citation = Citation::from_medline(RECORD, &pmid()).unwrap();
    assert_eq!(citation, Citation {
      venue:                "J Clin Invest".to_string(),
      year:                 "2023".to_string(),
      first_author_surname: "Smith".to_string(),
    });
  }

  #[test]
  fn test_record_fields_in_order() {
    let record = MedlineRecord::parse(RECORD);
    assert!(!record.is_empty());
    assert_eq!(record.first("PMID"), Some("40237684"));
    assert_eq!(record.first("AU"), Some("Smith JA"));
    assert_eq!(record.first("FAU"), Some("Smith, John A"));
    // continuation lines are not fields
    assert_eq!(record.first("TI"), Some("Core outcome sets for male infertility research: a systematic"));
    assert_eq!(record.first("AB"), None);
  }

  #[test]
  fn test_missing_fields() {
    let cases = [
      (RECORD.replace("TA  - J Clin Invest\n", ""), Field::Venue),
      (RECORD.replace("DP  - 2023 Jan\n", ""), Field::Year),
      (RECORD.replace("AU  - Smith JA\n", "").replace("AU  - Doe J\n", ""), Field::Author),
    ];

    for (text, expected) in cases {
      match Citation::from_medline(&text, &pmid()) {
        Err(LabelError::MissingField { field, pmid }) => {
          assert_eq!(field, expected);
          assert_eq!(pmid, "40237684");
        },
        other => panic!("expected missing {expected}, got {other:?}"),
      }
    }
  }

  #[test]
  fn test_missing_field_message() {
    let err = Citation::from_medline("", &pmid()).unwrap_err();
    assert_eq!(err.to_string(), "Could not find journal abbreviation for PMID 40237684");
  }

  #[test]
  fn test_year_must_lead_date() {
    let text = RECORD.replace("DP  - 2023 Jan", "DP  - Winter 2023");
    assert!(matches!(
      Citation::from_medline(&text, &pmid()),
      Err(LabelError::MissingField { field: Field::Year, .. })
    ));

    let text = RECORD.replace("DP  - 2023 Jan", "DP  - 2023");
    assert_eq!(Citation::from_medline(&text, &pmid()).unwrap().year, "2023");
  }

  #[test]
  fn test_fau_is_not_au() {
    let text = "FAU - Smith, John A\nTA  - J Clin Invest\nDP  - 2023\n";
    assert!(matches!(
      Citation::from_medline(text, &pmid()),
      Err(LabelError::MissingField { field: Field::Author, .. })
    ));
  }

  #[test]
  fn test_surname_heuristic() {
    let single = RECORD.replace("AU  - Smith JA", "AU  - Consortium");
    assert_eq!(Citation::from_medline(&single, &pmid()).unwrap().first_author_surname, "Consortium");

    // Multi-word surnames are cut at the first space.
    let compound = RECORD.replace("AU  - Smith JA", "AU  - van der Berg A");
    assert_eq!(Citation::from_medline(&compound, &pmid()).unwrap().first_author_surname, "van");
  }

  #[test]
  fn test_values_are_trimmed() {
    let text = "TA  -   Hum Reprod Open  \r\nDP  - 2024 Mar 12\r\nAU  - Lee K\r\n";
    let citation = Citation::from_medline(text, &pmid()).unwrap();
    assert_eq!(citation.venue, "Hum Reprod Open");
    assert_eq!(citation.year, "2024");
    assert_eq!(citation.first_author_surname, "Lee");
  }

  #[test]
  fn test_empty_venue_is_missing() {
    let text = "TA  -  \nDP  - 2024\nAU  - Lee K\n";
    assert!(matches!(
      Citation::from_medline(text, &pmid()),
      Err(LabelError::MissingField { field: Field::Venue, .. })
    ));
  }
}
