//! Renaming a PDF from its PubMed metadata.
//!
//! [`Renamer`] runs the whole pipeline for one file: check the source exists,
//! fetch the MEDLINE record, extract the [`Citation`], compose and sanitize the
//! target filename, resolve a collision according to a [`CollisionPolicy`], and
//! finally rename within the source's directory.
//!
//! Both front ends share this code. They differ only in the collision policy
//! they pass: the command line asks before overwriting, the drop target skips
//! silently so a batch never blocks on input.

use super::*;

/// What to do when the target filename already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
  /// Ask through an [`OverwritePrompt`]; declining cancels the rename
  #[default]
  Prompt,
  /// Leave the source untouched and report the file as skipped
  SkipSilently,
  /// Replace the existing file without asking
  Overwrite,
}

impl fmt::Display for CollisionPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CollisionPolicy::Prompt => write!(f, "prompt"),
      CollisionPolicy::SkipSilently => write!(f, "skip-silently"),
      CollisionPolicy::Overwrite => write!(f, "overwrite"),
    }
  }
}

impl FromStr for CollisionPolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match &s.to_lowercase() as &str {
      "prompt" => Ok(CollisionPolicy::Prompt),
      "skip-silently" | "skip" => Ok(CollisionPolicy::SkipSilently),
      "overwrite" => Ok(CollisionPolicy::Overwrite),
      s => Err(format!("unknown collision policy '{s}', expected prompt, skip-silently or overwrite")),
    }
  }
}

/// Asks whether an existing file may be replaced.
pub trait OverwritePrompt {
  /// Returns `true` if `target` may be overwritten.
  fn confirm_overwrite(&self, target: &Path) -> std::io::Result<bool>;
}

/// An [`OverwritePrompt`] that always declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineOverwrite;

impl OverwritePrompt for DeclineOverwrite {
  fn confirm_overwrite(&self, _target: &Path) -> std::io::Result<bool> { Ok(false) }
}

/// The result of a rename attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
  /// The file was renamed.
  Renamed {
    /// Original path
    from: PathBuf,
    /// New path
    to:   PathBuf,
  },
  /// The target existed and the policy was [`CollisionPolicy::SkipSilently`].
  Skipped {
    /// The existing file that was left alone
    target: PathBuf,
  },
  /// The target existed and overwriting was declined at the prompt.
  Cancelled {
    /// The existing file that was left alone
    target: PathBuf,
  },
}

/// Renames PDFs using metadata fetched through a [`PubMedClient`].
#[derive(Debug, Clone)]
pub struct Renamer {
  /// Client used to fetch MEDLINE records.
  client: PubMedClient,
}

impl Renamer {
  /// Creates a renamer fetching through `client`.
  pub fn new(client: PubMedClient) -> Self { Self { client } }

  /// Renames `{dir}/{identifier}.pdf`.
  ///
  /// The identifier is validated before anything else, so a malformed one never
  /// reaches the network.
  ///
  /// # Errors
  ///
  /// - [`LabelError::InvalidIdentifier`] if `identifier` is not 8 ASCII digits
  /// - Any error of [`Renamer::rename_file`]
  pub async fn rename_in_dir(
    &self,
    dir: &Path,
    identifier: &str,
    description: &str,
    policy: CollisionPolicy,
    prompt: &dyn OverwritePrompt,
  ) -> Result<RenameOutcome, LabelError> {
    let pmid: Pmid = identifier.parse()?;
    let source = dir.join(pmid.pdf_file_name());
    self.rename_file(&source, &pmid, description, policy, prompt).await
  }

  /// Renames `source`, the PDF for `pmid`, to its labelled filename in the same
  /// directory.
  ///
  /// If the target already exists and is a different file, `policy` decides:
  /// [`CollisionPolicy::Prompt`] asks `prompt`, [`CollisionPolicy::SkipSilently`]
  /// returns [`RenameOutcome::Skipped`], and [`CollisionPolicy::Overwrite`]
  /// replaces it. Nothing on disk changes unless the outcome is
  /// [`RenameOutcome::Renamed`].
  ///
  /// # Errors
  ///
  /// - [`LabelError::NotFound`] if `source` does not exist
  /// - [`LabelError::Network`] if the metadata request fails
  /// - [`LabelError::MissingField`] if the record lacks a required field
  /// - [`LabelError::IO`] if prompting or the rename itself fails
  pub async fn rename_file(
    &self,
    source: &Path,
    pmid: &Pmid,
    description: &str,
    policy: CollisionPolicy,
    prompt: &dyn OverwritePrompt,
  ) -> Result<RenameOutcome, LabelError> {
    if !tokio::fs::try_exists(source).await? {
      return Err(LabelError::NotFound(source.to_path_buf()));
    }

    let medline = self.client.fetch_medline(pmid).await?;
    let citation = Citation::from_medline(&medline, pmid)?;
    debug!("Citation for {pmid}: {citation:?}");

    let file_name = format::target_filename(&citation, description, pmid);
    let target = source.parent().unwrap_or_else(|| Path::new("")).join(&file_name);
    trace!("Target path: {}", target.display());

    if tokio::fs::try_exists(&target).await? && !is_same_file(source, &target).await {
      match policy {
        CollisionPolicy::SkipSilently => {
          debug!("Target exists, skipping: {}", target.display());
          return Ok(RenameOutcome::Skipped { target });
        },
        CollisionPolicy::Prompt =>
          if !prompt.confirm_overwrite(&target)? {
            debug!("Overwrite declined: {}", target.display());
            return Ok(RenameOutcome::Cancelled { target });
          },
        CollisionPolicy::Overwrite => debug!("Overwriting existing file: {}", target.display()),
      }
    }

    tokio::fs::rename(source, &target).await?;
    info!("Renamed {} to {}", source.display(), target.display());

    Ok(RenameOutcome::Renamed { from: source.to_path_buf(), to: target })
  }
}

/// Whether two existing paths refer to the same file, e.g. when only the case
/// of the name differs on a case-insensitive filesystem.
async fn is_same_file(a: &Path, b: &Path) -> bool {
  match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
    (Ok(a), Ok(b)) => a == b,
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;

  use mockito::{Matcher, Mock, Server, ServerGuard};
  use tempfile::tempdir;

  use super::*;

  const MEDLINE: &str = "\nPMID- 40237684\nDP  - 2023 Jan\nTA  - J Clin Invest\nAU  - Smith JA\n";
  const RENAMED: &str = "J Clin Invest 2023 Smith Core outcomes male infert 40237684.pdf";

  /// Records how often it was asked and answers with a fixed value.
  struct FixedAnswer {
    answer: bool,
    asked:  Cell<usize>,
  }

  impl FixedAnswer {
    fn new(answer: bool) -> Self { Self { answer, asked: Cell::new(0) } }
  }

  impl OverwritePrompt for FixedAnswer {
    fn confirm_overwrite(&self, _target: &Path) -> std::io::Result<bool> {
      self.asked.set(self.asked.get() + 1);
      Ok(self.answer)
    }
  }

  async fn medline_server() -> (ServerGuard, Mock) {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", "/efetch.fcgi")
      .match_query(Matcher::UrlEncoded("id".into(), "40237684".into()))
      .with_body(MEDLINE)
      .create_async()
      .await;
    (server, mock)
  }

  fn renamer_for(server: &ServerGuard) -> Renamer {
    let config = Config { endpoint: format!("{}/efetch.fcgi", server.url()), ..Config::default() };
    Renamer::new(PubMedClient::new(&config).unwrap())
  }

  #[test]
  fn test_collision_policy_strings() {
    for policy in [CollisionPolicy::Prompt, CollisionPolicy::SkipSilently, CollisionPolicy::Overwrite] {
      assert_eq!(policy.to_string().parse::<CollisionPolicy>().unwrap(), policy);
    }
    assert_eq!("SKIP".parse::<CollisionPolicy>().unwrap(), CollisionPolicy::SkipSilently);
    assert!("sometimes".parse::<CollisionPolicy>().is_err());
  }

  #[traced_test]
  #[tokio::test]
  async fn test_rename_in_dir() -> anyhow::Result<()> {
    let (server, _mock) = medline_server().await;
    let dir = tempdir()?;
    std::fs::write(dir.path().join("40237684.pdf"), b"%PDF-1.7")?;

    let outcome = renamer_for(&server)
      .rename_in_dir(
        dir.path(),
        "40237684",
        "Core outcomes male infert",
        CollisionPolicy::Prompt,
        &DeclineOverwrite,
      )
      .await?;

    assert_eq!(outcome, RenameOutcome::Renamed {
      from: dir.path().join("40237684.pdf"),
      to:   dir.path().join(RENAMED),
    });
    assert!(!dir.path().join("40237684.pdf").exists());
    assert_eq!(std::fs::read(dir.path().join(RENAMED))?, b"%PDF-1.7");
    Ok(())
  }

  #[tokio::test]
  async fn test_invalid_identifier_skips_network() -> anyhow::Result<()> {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;
    let dir = tempdir()?;

    let result = renamer_for(&server)
      .rename_in_dir(dir.path(), "4023768", "x", CollisionPolicy::Prompt, &DeclineOverwrite)
      .await;

    assert!(matches!(result, Err(LabelError::InvalidIdentifier(id)) if id == "4023768"));
    mock.assert_async().await;
    Ok(())
  }

  #[tokio::test]
  async fn test_missing_source() -> anyhow::Result<()> {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;
    let dir = tempdir()?;

    let result = renamer_for(&server)
      .rename_in_dir(dir.path(), "40237684", "x", CollisionPolicy::Prompt, &DeclineOverwrite)
      .await;

    assert!(matches!(result, Err(LabelError::NotFound(path)) if path == dir.path().join("40237684.pdf")));
    mock.assert_async().await;
    Ok(())
  }

  #[tokio::test]
  async fn test_prompt_declined() -> anyhow::Result<()> {
    let (server, _mock) = medline_server().await;
    let dir = tempdir()?;
    std::fs::write(dir.path().join("40237684.pdf"), b"new")?;
    std::fs::write(dir.path().join(RENAMED), b"old")?;

    let prompt = FixedAnswer::new(false);
    let outcome = renamer_for(&server)
      .rename_in_dir(dir.path(), "40237684", "Core outcomes male infert", CollisionPolicy::Prompt, &prompt)
      .await?;

    assert_eq!(outcome, RenameOutcome::Cancelled { target: dir.path().join(RENAMED) });
    assert_eq!(prompt.asked.get(), 1);
    assert_eq!(std::fs::read(dir.path().join("40237684.pdf"))?, b"new");
    assert_eq!(std::fs::read(dir.path().join(RENAMED))?, b"old");
    Ok(())
  }

  #[tokio::test]
  async fn test_prompt_accepted() -> anyhow::Result<()> {
    let (server, _mock) = medline_server().await;
    let dir = tempdir()?;
    std::fs::write(dir.path().join("40237684.pdf"), b"new")?;
    std::fs::write(dir.path().join(RENAMED), b"old")?;

    let prompt = FixedAnswer::new(true);
    let outcome = renamer_for(&server)
      .rename_in_dir(dir.path(), "40237684", "Core outcomes male infert", CollisionPolicy::Prompt, &prompt)
      .await?;

    assert!(matches!(outcome, RenameOutcome::Renamed { .. }));
    assert!(!dir.path().join("40237684.pdf").exists());
    assert_eq!(std::fs::read(dir.path().join(RENAMED))?, b"new");
    Ok(())
  }

  #[tokio::test]
  async fn test_skip_silently() -> anyhow::Result<()> {
    let (server, _mock) = medline_server().await;
    let dir = tempdir()?;
    std::fs::write(dir.path().join("40237684.pdf"), b"new")?;
    std::fs::write(dir.path().join(RENAMED), b"old")?;

    let prompt = FixedAnswer::new(true);
    let outcome = renamer_for(&server)
      .rename_in_dir(
        dir.path(),
        "40237684",
        "Core outcomes male infert",
        CollisionPolicy::SkipSilently,
        &prompt,
      )
      .await?;

    assert_eq!(outcome, RenameOutcome::Skipped { target: dir.path().join(RENAMED) });
    assert_eq!(prompt.asked.get(), 0);
    assert_eq!(std::fs::read(dir.path().join("40237684.pdf"))?, b"new");
    assert_eq!(std::fs::read(dir.path().join(RENAMED))?, b"old");
    Ok(())
  }

  #[tokio::test]
  async fn test_overwrite() -> anyhow::Result<()> {
    let (server, _mock) = medline_server().await;
    let dir = tempdir()?;
    std::fs::write(dir.path().join("40237684.pdf"), b"new")?;
    std::fs::write(dir.path().join(RENAMED), b"old")?;

    let prompt = FixedAnswer::new(false);
    let outcome = renamer_for(&server)
      .rename_in_dir(
        dir.path(),
        "40237684",
        "Core outcomes male infert",
        CollisionPolicy::Overwrite,
        &prompt,
      )
      .await?;

    assert!(matches!(outcome, RenameOutcome::Renamed { .. }));
    assert_eq!(prompt.asked.get(), 0);
    assert_eq!(std::fs::read(dir.path().join(RENAMED))?, b"new");
    Ok(())
  }

  #[tokio::test]
  async fn test_missing_field_leaves_file() -> anyhow::Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("GET", "/efetch.fcgi")
      .match_query(Matcher::Any)
      .with_body("\nPMID- 40237684\nDP  - 2023 Jan\nAU  - Smith JA\n")
      .create_async()
      .await;
    let dir = tempdir()?;
    std::fs::write(dir.path().join("40237684.pdf"), b"%PDF")?;

    let result = renamer_for(&server)
      .rename_in_dir(dir.path(), "40237684", "x", CollisionPolicy::Prompt, &DeclineOverwrite)
      .await;

    assert!(matches!(result, Err(LabelError::MissingField { field: Field::Venue, .. })));
    assert!(dir.path().join("40237684.pdf").exists());
    Ok(())
  }

  #[tokio::test]
  async fn test_same_file() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("a.pdf");
    std::fs::write(&path, b"x")?;
    std::fs::write(dir.path().join("b.pdf"), b"x")?;

    assert!(is_same_file(&path, &dir.path().join(".").join("a.pdf")).await);
    assert!(!is_same_file(&path, &dir.path().join("b.pdf")).await);
    assert!(!is_same_file(&path, &dir.path().join("missing.pdf")).await);
    Ok(())
  }

  #[tokio::test]
  async fn test_already_labelled_is_not_a_collision() -> anyhow::Result<()> {
    let (server, _mock) = medline_server().await;
    let dir = tempdir()?;
    let source = dir.path().join(RENAMED);
    std::fs::write(&source, b"%PDF")?;
    let pmid: Pmid = "40237684".parse()?;

    let prompt = FixedAnswer::new(false);
    let outcome = renamer_for(&server)
      .rename_file(
        &source,
        &pmid,
        "Core outcomes male infert",
        CollisionPolicy::Prompt,
        &prompt,
      )
      .await?;

    assert_eq!(outcome, RenameOutcome::Renamed { from: source.clone(), to: source.clone() });
    assert_eq!(prompt.asked.get(), 0);
    assert_eq!(std::fs::read(&source)?, b"%PDF");
    Ok(())
  }
}
