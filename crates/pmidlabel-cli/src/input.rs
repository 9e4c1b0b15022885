//! Parsing of lines typed or dropped into the drop target.
//!
//! Dragging files onto a terminal pastes their paths, quoted or escaped the way
//! a shell would need them; Tk-style drop payloads group paths with braces, and
//! some terminals paste `file://` URIs instead. [`split_dropped_paths`] accepts
//! all of these.

use std::path::PathBuf;

use url::Url;

/// Splits a dropped or pasted line into paths.
///
/// - Whitespace separates entries
/// - `'…'`, `"…"` and `{…}` group an entry containing whitespace
/// - Outside quotes, `\` escapes the next character (except on Windows, where it
///   is a path separator)
/// - `file://` URIs are decoded into paths
pub fn split_dropped_paths(line: &str) -> Vec<PathBuf> {
  let mut tokens = Vec::new();
  let mut current = String::new();
  let mut in_token = false;
  let mut chars = line.chars();

  while let Some(c) = chars.next() {
    match c {
      c if c.is_whitespace() =>
        if in_token {
          tokens.push(std::mem::take(&mut current));
          in_token = false;
        },
      '\'' | '"' => {
        in_token = true;
        for inner in chars.by_ref() {
          if inner == c {
            break;
          }
          current.push(inner);
        }
      },
      '{' if !in_token => {
        in_token = true;
        for inner in chars.by_ref() {
          if inner == '}' {
            break;
          }
          current.push(inner);
        }
      },
      '\\' if !cfg!(windows) => {
        in_token = true;
        if let Some(escaped) = chars.next() {
          current.push(escaped);
        }
      },
      c => {
        in_token = true;
        current.push(c);
      },
    }
  }
  if in_token {
    tokens.push(current);
  }

  tokens.into_iter().filter(|token| !token.is_empty()).map(|token| to_path(&token)).collect()
}

/// Interprets a token as a path, decoding `file://` URIs.
fn to_path(token: &str) -> PathBuf {
  if token.starts_with("file://") {
    if let Some(path) = Url::parse(token).ok().and_then(|url| url.to_file_path().ok()) {
      return path;
    }
  }
  PathBuf::from(token)
}

/// Whether `path` has a `.pdf` extension, in any case.
pub fn is_pdf(path: &std::path::Path) -> bool {
  path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Parses a `:pick` answer into zero-based indices into a list of `len` items.
///
/// Accepts 1-based numbers and ranges separated by spaces or commas (`1 3
/// 5-7`), or `all`/`*`. Returns `None` if anything is out of range or not a
/// number.
pub fn parse_selection(answer: &str, len: usize) -> Option<Vec<usize>> {
  let answer = answer.trim();
  if answer.eq_ignore_ascii_case("all") || answer == "*" {
    return Some((0..len).collect());
  }

  let mut selected = Vec::new();
  for part in answer.split(|c: char| c == ',' || c.is_whitespace()).filter(|p| !p.is_empty()) {
    let (start, end) = match part.split_once('-') {
      Some((start, end)) => (start.parse::<usize>().ok()?, end.parse::<usize>().ok()?),
      None => {
        let n = part.parse::<usize>().ok()?;
        (n, n)
      },
    };
    if start == 0 || end > len || start > end {
      return None;
    }
    selected.extend((start - 1)..end);
  }

  selected.sort_unstable();
  selected.dedup();
  Some(selected)
}
