//! The drop target: an interactive terminal surface for renaming many PDFs.
//!
//! The calling thread runs the event loop. It reads lines from a stdin reader
//! thread and hands batches to a [`BatchWorker`]; the worker reports each
//! finished batch back through the same channel, so every message the user sees
//! is printed by the event loop thread while fetching and renaming happen on
//! the worker.
//!
//! A line is either a command (`:desc`, `:pick`, ...) or one or more dropped
//! paths. Non-PDF paths are ignored. Every dropped PDF is renamed with the shared
//! description; files named like a PMID are renamed, anything else is skipped,
//! and existing targets are never overwritten. Individual failures only go to
//! the log file; the terminal shows one tally per batch and rings the bell when
//! something was renamed.

use std::{
  io::{self, BufRead},
  path::PathBuf,
  sync::mpsc,
  thread,
};

use console::{style, Term};
use pmidlabel::{BatchReport, BatchWorker, Renamer};
use tracing::{debug, info, trace};

use super::*;
use crate::input::{is_pdf, parse_selection, split_dropped_paths};

/// Something the event loop reacts to.
enum Event {
  /// A line was read from standard input.
  Line(String),
  /// Standard input was closed.
  InputClosed,
  /// The worker finished a batch.
  Finished(BatchReport),
}

/// Whether the event loop keeps going after a line.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
  Continue,
  Quit,
}

/// State of the drop target, owned by the event loop thread.
struct DropTarget {
  /// Worker renaming the submitted batches.
  worker:      BatchWorker,
  /// Shared description for every dropped file.
  description: String,
  /// Launch files waiting for a description.
  pending:     Vec<PathBuf>,
  /// PDFs listed by `:pick`, waiting for the user's selection.
  picking:     Option<Vec<PathBuf>>,
  /// Batches submitted but not reported yet.
  in_flight:   usize,
  /// Directory `:pick` lists and relative paths are resolved against.
  dir:         PathBuf,
  /// Terminal the user interacts with.
  term:        Term,
}

/// Runs the drop target until `:quit` or end of input, waiting for submitted
/// batches to finish before returning.
pub fn run(
  renamer: Renamer,
  description: Option<String>,
  launch_files: Vec<PathBuf>,
  dir: PathBuf,
) -> Result<(), CliErrors> {
  let term = Term::stdout();
  let description = match description {
    Some(description) => description,
    None if term.features().is_attended() => dialoguer::Input::<String>::new()
      .with_prompt("Description")
      .allow_empty(true)
      .interact_text()?,
    None => String::new(),
  };

  let (events, inbox) = mpsc::channel();
  let finished = events.clone();
  let worker = BatchWorker::spawn(renamer, move |report| {
    let _ = finished.send(Event::Finished(report));
  })?;

  thread::Builder::new().name("pmidlabel-stdin".into()).spawn(move || {
    for line in io::stdin().lock().lines() {
      match line {
        Ok(line) =>
          if events.send(Event::Line(line)).is_err() {
            return;
          },
        Err(e) => {
          debug!("Stopped reading input: {e}");
          break;
        },
      }
    }
    let _ = events.send(Event::InputClosed);
  })?;

  let mut target = DropTarget {
    worker,
    description: description.trim().to_string(),
    pending: Vec::new(),
    picking: None,
    in_flight: 0,
    dir,
    term,
  };

  target.banner()?;
  target.queue_launch_files(launch_files)?;

  let mut closing = false;
  while !closing || target.in_flight > 0 {
    let Ok(event) = inbox.recv() else { break };
    match event {
      Event::Line(line) => closing |= target.handle_line(&line)? == Flow::Quit,
      Event::InputClosed => {
        trace!("Input closed");
        closing = true;
      },
      Event::Finished(report) => target.finished(&report)?,
    }
  }

  if !target.pending.is_empty() {
    target.term.write_line(&format!(
      "{} {} launch files were not processed, no description was set",
      style(WARNING).yellow(),
      target.pending.len()
    ))?;
  }
  Ok(())
}

impl DropTarget {
  /// Prints the usage summary.
  fn banner(&self) -> io::Result<()> {
    self.term.write_line(&format!(
      "{} Drop PMID-named PDFs here, or type {} for commands",
      style(BOOKS).cyan(),
      style(":help").yellow()
    ))?;
    self.show_description()
  }

  /// Prints the current description.
  fn show_description(&self) -> io::Result<()> {
    if self.description.is_empty() {
      self.term.write_line(&format!(
        "{} No description set, use {}",
        style(WARNING).yellow(),
        style(":desc TEXT").yellow()
      ))
    } else {
      self.term.write_line(&format!(
        "{} Description: {}",
        style(PAPER).cyan(),
        style(&self.description).white().bold()
      ))
    }
  }

  /// Queues files given on the command line, submitting them right away if a
  /// description is already set.
  fn queue_launch_files(&mut self, files: Vec<PathBuf>) -> Result<(), CliErrors> {
    self.pending.extend(files.into_iter().filter(|path| is_pdf(path)).map(|path| self.dir.join(path)));
    self.flush_pending()
  }

  /// Submits waiting launch files once there is a description.
  fn flush_pending(&mut self) -> Result<(), CliErrors> {
    if self.pending.is_empty() || self.description.is_empty() {
      return Ok(());
    }
    let files = std::mem::take(&mut self.pending);
    self.submit(files)
  }

  /// Hands a batch to the worker.
  fn submit(&mut self, files: Vec<PathBuf>) -> Result<(), CliErrors> {
    let count = files.len();
    let id = self.worker.submit(files, self.description.clone())?;
    self.in_flight += 1;
    info!("Submitted batch {id} with {count} files");
    self.term.write_line(&format!(
      "{} Renaming {} {}...",
      style(LOOKING_GLASS).cyan(),
      style(count).yellow(),
      if count == 1 { "file" } else { "files" }
    ))?;
    Ok(())
  }

  /// Reports a finished batch.
  fn finished(&mut self, report: &BatchReport) -> io::Result<()> {
    self.in_flight = self.in_flight.saturating_sub(1);
    let tally = &report.tally;
    let icon = if tally.error > 0 { style(WARNING).yellow() } else { style(SUCCESS).green() };
    self.term.write_line(&format!("{icon} Done: {tally}"))?;
    if tally.success > 0 {
      self.term.write_str("\x07")?;
    }
    Ok(())
  }

  /// Reacts to one line of input.
  fn handle_line(&mut self, line: &str) -> Result<Flow, CliErrors> {
    let line = line.trim();

    // A command abandons a pending `:pick`.
    if let Some(command) = line.strip_prefix(':') {
      self.picking = None;
      return self.command(command);
    }

    if let Some(candidates) = self.picking.take() {
      return self.pick_selection(line, candidates).map(|()| Flow::Continue);
    }

    let files: Vec<PathBuf> =
      split_dropped_paths(line).into_iter().filter(|path| is_pdf(path)).map(|path| self.dir.join(path)).collect();
    if files.is_empty() {
      trace!("Nothing to do for input: {line:?}");
      return Ok(Flow::Continue);
    }
    if self.description.is_empty() {
      debug!("Ignoring {} dropped files, no description", files.len());
      self.show_description()?;
      return Ok(Flow::Continue);
    }

    self.submit(files)?;
    Ok(Flow::Continue)
  }

  /// Runs a `:command`.
  fn command(&mut self, command: &str) -> Result<Flow, CliErrors> {
    let (name, argument) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
    match name {
      "desc" | "d" => {
        if !argument.trim().is_empty() {
          self.description = argument.trim().to_string();
        }
        self.show_description()?;
        self.flush_pending()?;
      },
      "clear" | "c" => {
        self.description.clear();
        self.show_description()?;
      },
      "pick" | "p" => self.pick()?,
      "quit" | "q" => return Ok(Flow::Quit),
      "help" | "h" | "?" => self.help()?,
      other => self.term.write_line(&format!(
        "{} Unknown command {}, type {} for help",
        style(WARNING).yellow(),
        style(format!(":{other}")).yellow(),
        style(":help").yellow()
      ))?,
    }
    Ok(Flow::Continue)
  }

  /// Lists the PDFs of the working directory for selection.
  fn pick(&mut self) -> Result<(), CliErrors> {
    let pattern = format!(
      "{}{}*.pdf",
      glob::Pattern::escape(&self.dir.to_string_lossy()),
      std::path::MAIN_SEPARATOR
    );
    trace!("Listing PDFs with {pattern}");
    let options = glob::MatchOptions { case_sensitive: false, ..Default::default() };
    let mut candidates: Vec<PathBuf> = glob::glob_with(&pattern, options)?.flatten().collect();
    candidates.sort();

    if candidates.is_empty() {
      self.term.write_line(&format!(
        "{} No PDF files in {}",
        style(WARNING).yellow(),
        style(self.dir.display()).yellow()
      ))?;
      return Ok(());
    }

    for (i, path) in candidates.iter().enumerate() {
      let name = path.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();
      self.term.write_line(&format!("  {}. {}", style(i + 1).yellow(), name))?;
    }
    self.term.write_line(&format!(
      "{} Select files (e.g. {}, {}), empty to cancel:",
      style(PAPER).cyan(),
      style("1 3-4").yellow(),
      style("all").yellow()
    ))?;
    self.picking = Some(candidates);
    Ok(())
  }

  /// Submits the files chosen from a `:pick` listing.
  fn pick_selection(&mut self, answer: &str, candidates: Vec<PathBuf>) -> Result<(), CliErrors> {
    let Some(indices) = parse_selection(answer, candidates.len()) else {
      self.term.write_line(&format!("{} Invalid selection, try again:", style(WARNING).yellow()))?;
      self.picking = Some(candidates);
      return Ok(());
    };
    if indices.is_empty() {
      return Ok(());
    }
    if self.description.is_empty() {
      return Ok(self.show_description()?);
    }

    let files = indices.into_iter().map(|i| candidates[i].clone()).collect();
    self.submit(files)
  }

  /// Prints the command reference.
  fn help(&self) -> io::Result<()> {
    for (command, text) in [
      (":desc TEXT", "set the description used for every file"),
      (":clear", "clear the description"),
      (":pick", "choose PDFs from the working directory"),
      (":quit", "wait for running batches and exit"),
    ] {
      self.term.write_line(&format!("  {:<12} {}", style(command).yellow(), text))?;
    }
    Ok(())
  }
}
