//! Batch renaming for the drop target.
//!
//! Dropped files are processed one after another on a single background thread
//! owned by a [`BatchWorker`], so whatever thread feeds it (a terminal event
//! loop, for instance) never blocks on the network or the filesystem. Each file
//! ends in a [`FileOutcome`] instead of an error: files that are not named after
//! a PMID are skipped, collisions are skipped silently, and every failure is
//! logged with the file it concerns. The caller only receives one
//! [`BatchReport`] per batch once every file has been handled.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::mpsc;
//!
//! use pmidlabel::{BatchWorker, Config, PubMedClient, Renamer};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let renamer = Renamer::new(PubMedClient::new(&Config::default())?);
//! let (tx, rx) = mpsc::channel();
//! let mut worker = BatchWorker::spawn(renamer, move |report| {
//!   let _ = tx.send(report);
//! })?;
//!
//! worker.submit(vec!["40237684.pdf".into()], "Core outcomes male infert".into())?;
//! let report = rx.recv()?;
//! println!("{}", report.tally);
//! # Ok(())
//! # }
//! ```

use std::{
  sync::mpsc,
  thread::{self, JoinHandle},
};

use super::*;

/// How a single file of a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
  /// The file was renamed.
  Success,
  /// The file was left alone on purpose: not a PMID-named PDF, or the target
  /// name was already taken.
  Skip,
  /// Renaming failed; the reason is in the log.
  Error,
}

/// Per-outcome counts for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchTally {
  /// Files renamed
  pub success: usize,
  /// Files skipped
  pub skip:    usize,
  /// Files that failed
  pub error:   usize,
}

impl BatchTally {
  /// Counts one more file with the given outcome.
  pub fn record(&mut self, outcome: FileOutcome) {
    match outcome {
      FileOutcome::Success => self.success += 1,
      FileOutcome::Skip => self.skip += 1,
      FileOutcome::Error => self.error += 1,
    }
  }

  /// Number of files counted.
  pub fn total(&self) -> usize { self.success + self.skip + self.error }
}

impl fmt::Display for BatchTally {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} renamed, {} skipped, {} failed", self.success, self.skip, self.error)
  }
}

/// Renames one dropped file, never failing.
///
/// Collisions are always resolved with [`CollisionPolicy::SkipSilently`]: a
/// batch runs unattended, so it must not wait for an answer.
pub async fn process_file(renamer: &Renamer, path: &Path, description: &str) -> FileOutcome {
  let Some(pmid) = Pmid::from_pdf_path(path) else {
    debug!("Not a PMID-named PDF, skipping: {}", path.display());
    return FileOutcome::Skip;
  };

  match renamer
    .rename_file(path, &pmid, description, CollisionPolicy::SkipSilently, &DeclineOverwrite)
    .await
  {
    Ok(RenameOutcome::Renamed { .. }) => FileOutcome::Success,
    Ok(RenameOutcome::Skipped { target } | RenameOutcome::Cancelled { target }) => {
      info!("Skipped {}: {} already exists", path.display(), target.display());
      FileOutcome::Skip
    },
    Err(e) => {
      warn!("Failed to rename {}: {e}", path.display());
      FileOutcome::Error
    },
  }
}

/// Renames every file in `files`, strictly one after another.
pub async fn process_batch(renamer: &Renamer, files: &[PathBuf], description: &str) -> BatchTally {
  let mut tally = BatchTally::default();
  for path in files {
    tally.record(process_file(renamer, path, description).await);
  }
  info!("Batch of {} files finished: {tally}", files.len());
  tally
}

/// Completion signal for one submitted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
  /// Sequence number returned by [`BatchWorker::submit`]
  pub id:    u64,
  /// Outcome counts
  pub tally: BatchTally,
}

/// A batch waiting for the worker.
struct Job {
  /// Sequence number reported back on completion.
  id:          u64,
  /// Files to rename.
  files:       Vec<PathBuf>,
  /// Shared description for every file.
  description: String,
}

/// A dedicated thread renaming submitted batches in order.
///
/// The thread owns a single-threaded tokio runtime; batches queue up behind one
/// another and are never processed concurrently. Dropping the worker lets the
/// queued batches finish and then joins the thread.
pub struct BatchWorker {
  /// Queue feeding the worker thread, `None` once shut down.
  jobs:    Option<mpsc::Sender<Job>>,
  /// Handle of the worker thread, `None` once joined.
  handle:  Option<JoinHandle<()>>,
  /// Sequence number of the next batch.
  next_id: u64,
}

impl BatchWorker {
  /// Starts the worker thread.
  ///
  /// `on_complete` is called on the worker thread after each batch. Callers
  /// with a UI thread forward the report to it, typically through a channel.
  ///
  /// # Errors
  ///
  /// Returns [`LabelError::IO`] if the runtime or the thread cannot be created.
  pub fn spawn<F>(renamer: Renamer, on_complete: F) -> Result<Self, LabelError>
  where F: Fn(BatchReport) + Send + 'static {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let (jobs, queue) = mpsc::channel::<Job>();

    let handle = thread::Builder::new().name("pmidlabel-batch".into()).spawn(move || {
      while let Ok(job) = queue.recv() {
        debug!("Starting batch {} with {} files", job.id, job.files.len());
        let tally = runtime.block_on(process_batch(&renamer, &job.files, &job.description));
        on_complete(BatchReport { id: job.id, tally });
      }
      trace!("Batch queue closed, worker exiting");
    })?;

    Ok(Self { jobs: Some(jobs), handle: Some(handle), next_id: 0 })
  }

  /// Queues `files` for renaming with `description` and returns the batch's
  /// sequence number.
  ///
  /// # Errors
  ///
  /// Returns [`LabelError::IO`] if the worker thread is no longer running.
  pub fn submit(&mut self, files: Vec<PathBuf>, description: String) -> Result<u64, LabelError> {
    let id = self.next_id;
    let stopped = || std::io::Error::new(std::io::ErrorKind::BrokenPipe, "batch worker stopped");

    self
      .jobs
      .as_ref()
      .ok_or_else(stopped)?
      .send(Job { id, files, description })
      .map_err(|_| stopped())?;

    self.next_id += 1;
    Ok(id)
  }
}

impl Drop for BatchWorker {
  fn drop(&mut self) {
    self.jobs.take();
    if let Some(handle) = self.handle.take() {
      if handle.join().is_err() {
        warn!("Batch worker thread panicked");
      }
    }
  }
}
