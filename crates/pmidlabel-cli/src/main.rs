use std::{
  io::{self, BufRead, IsTerminal, Write},
  path::{Path, PathBuf},
  process::ExitCode,
  sync::mpsc,
};

use clap::{builder::ArgAction, Args, Parser, Subcommand};
use console::{style, Emoji};
use errors::CliErrors;
use pmidlabel::{
  errors::LabelError, BatchWorker, CollisionPolicy, Config, OverwritePrompt, Pmid, PubMedClient,
  RenameOutcome, Renamer,
};
use tracing::{debug, trace};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};

pub mod errors;
mod input;
mod interactive;

static LOOKING_GLASS: Emoji<'_, '_> = Emoji("🔍 ", "");
static BOOKS: Emoji<'_, '_> = Emoji("📚 ", "");
static PAPER: Emoji<'_, '_> = Emoji("📄 ", "");
static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "");
static SUCCESS: Emoji<'_, '_> = Emoji("✨ ", "");

#[derive(Parser)]
#[command(
  author,
  version,
  about = "Rename PubMed PDFs to '{journal} {year} {author} {description} {pmid}.pdf'",
  subcommand_negates_reqs = true
)]
struct Cli {
  /// Verbose mode (-v, -vv, -vvv)
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Configuration file to use instead of the default one
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Per-request timeout in seconds
  #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
  timeout: Option<u64>,

  #[command(flatten)]
  rename: RenameArgs,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Args)]
struct RenameArgs {
  /// PubMed identifier, 8 digits; the file renamed is `<PMID>.pdf`
  #[arg(required = true)]
  pmid: Option<String>,

  /// Free-text description placed between the author and the PMID
  #[arg(required = true)]
  description: Option<String>,

  /// Directory containing the PDF
  #[arg(long, short, default_value = ".")]
  directory: PathBuf,

  /// What to do when the new filename is taken (prompt, skip-silently, overwrite)
  #[arg(long)]
  on_collision: Option<CollisionPolicy>,

  /// Overwrite an existing file without asking
  #[arg(long, short, conflicts_with = "on_collision")]
  force: bool,
}

#[derive(Subcommand)]
enum Commands {
  /// Open a drop target that renames every PDF dropped onto the terminal
  Drop {
    /// Description shared by every dropped file (prompted for if omitted)
    #[arg(long)]
    description: Option<String>,
    /// Directory listed by `:pick`
    #[arg(long, short, default_value = ".")]
    directory:   PathBuf,
    /// PDFs to rename as soon as a description is set
    files:       Vec<PathBuf>,
  },
  /// Rename a set of PDFs in one batch, skipping names that are taken
  Batch {
    /// Description shared by every file
    #[arg(long)]
    description: String,
    /// PDFs named after their PMID
    #[arg(required = true)]
    files:       Vec<PathBuf>,
  },
}

/// Setup logging with the specified verbosity level.
///
/// `default_level` applies when neither `-v` nor `RUST_LOG` is given. With a
/// `log_dir`, events at info level and above are also appended to
/// `pmidlabel.log` in it; the returned guard flushes that file when dropped.
fn setup_logging(
  verbosity: u8,
  default_level: &str,
  log_dir: Option<&Path>,
) -> Result<Option<WorkerGuard>, CliErrors> {
  let filter = match verbosity {
    0 => default_level,
    1 => "info",
    2 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  let stderr = tracing_subscriber::fmt::layer()
    .with_writer(io::stderr)
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(true)
    .with_target(true)
    .with_filter(filter);

  let (file, guard) = match log_dir {
    Some(dir) => {
      std::fs::create_dir_all(dir)?;
      let appender = rolling::Builder::new()
        .rotation(rolling::Rotation::NEVER)
        .filename_prefix("pmidlabel")
        .filename_suffix("log")
        .build(dir)?;
      let (writer, guard) = tracing_appender::non_blocking(appender);
      let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_names(true)
        .with_filter(LevelFilter::INFO);
      (Some(layer), Some(guard))
    },
    None => (None, None),
  };

  tracing_subscriber::registry().with(stderr).with(file).init();
  Ok(guard)
}

/// Asks on the terminal before replacing an existing file.
///
/// Without a terminal the question is still printed and the answer read from
/// standard input, so scripts can pipe `y` or `n`.
struct TerminalPrompt;

impl OverwritePrompt for TerminalPrompt {
  fn confirm_overwrite(&self, target: &Path) -> io::Result<bool> {
    let name = target.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();
    let question = format!("{} already exists. Overwrite?", style(&name).yellow());

    if io::stdin().is_terminal() && console::Term::stderr().features().is_attended() {
      return dialoguer::Confirm::new()
        .with_prompt(question)
        .default(false)
        .interact()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
    }

    eprint!("{question} [y/N] ");
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    trace!("Overwrite answer: {answer:?}");
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
  }
}

/// Loads the configuration file and applies environment and flag overrides.
fn load_config(cli: &Cli) -> Result<Config, CliErrors> {
  let path = cli.config.clone().unwrap_or_else(Config::default_path);
  let mut config = Config::load(&path)?.with_env_overrides();
  if let Some(timeout) = cli.timeout {
    config.timeout_secs = timeout;
  }
  Ok(config)
}

fn runtime() -> io::Result<tokio::runtime::Runtime> {
  tokio::runtime::Builder::new_current_thread().enable_all().build()
}

/// Renames a single `<PMID>.pdf`.
fn rename(args: RenameArgs, config: &Config, renamer: &Renamer) -> Result<ExitCode, CliErrors> {
  // Both are required by clap unless a subcommand is given.
  let (Some(pmid), Some(description)) = (args.pmid, args.description) else {
    return Ok(ExitCode::FAILURE);
  };
  let policy = if args.force {
    CollisionPolicy::Overwrite
  } else {
    args.on_collision.unwrap_or(config.collision)
  };
  let pmid: Pmid = pmid.parse()?;
  let source = args.directory.join(pmid.pdf_file_name());
  if !source.exists() {
    return Err(LabelError::NotFound(source).into());
  }
  debug!("Renaming {} with policy {policy}", source.display());

  println!("{} Fetching metadata for PMID {}...", style(LOOKING_GLASS).cyan(), style(&pmid).yellow());

  let outcome = runtime()?.block_on(renamer.rename_file(
    &source,
    &pmid,
    &description,
    policy,
    &TerminalPrompt,
  ))?;

  match outcome {
    RenameOutcome::Renamed { to, .. } => {
      let name = to.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();
      println!("{} Renamed to: {}", style(SUCCESS).green(), style(name).white().bold());
    },
    RenameOutcome::Skipped { target } => {
      println!(
        "{} Skipped, {} already exists",
        style(WARNING).yellow(),
        style(target.display()).yellow()
      );
    },
    RenameOutcome::Cancelled { target } => {
      println!(
        "{} Rename cancelled, kept {}",
        style(PAPER).cyan(),
        style(target.display()).yellow()
      );
    },
  }
  Ok(ExitCode::SUCCESS)
}

/// Runs `files` as one batch on a background worker and prints the tally.
fn batch(files: Vec<PathBuf>, description: String, renamer: Renamer) -> Result<ExitCode, CliErrors> {
  let (tx, rx) = mpsc::channel();
  let mut worker = BatchWorker::spawn(renamer, move |report| {
    let _ = tx.send(report);
  })?;

  println!(
    "{} Renaming {} files...",
    style(BOOKS).cyan(),
    style(files.len()).yellow()
  );
  worker.submit(files, description)?;
  let report = rx
    .recv()
    .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "batch worker stopped"))?;
  drop(worker);

  let tally = report.tally;
  if tally.error > 0 {
    println!("{} Done: {tally}", style(WARNING).yellow());
    Ok(ExitCode::FAILURE)
  } else {
    println!("{} Done: {tally}", style(SUCCESS).green());
    Ok(ExitCode::SUCCESS)
  }
}

fn run(cli: Cli) -> Result<ExitCode, CliErrors> {
  let config = load_config(&cli)?;

  // The drop target keeps the terminal for its own output and logs to a file.
  let _guard = match &cli.command {
    Some(Commands::Drop { .. }) => setup_logging(cli.verbose, "error", Some(&config.log_dir()))?,
    _ => setup_logging(cli.verbose, "warn", None)?,
  };
  debug!("Using endpoint {} with a {}s timeout", config.endpoint, config.timeout_secs);

  let renamer = Renamer::new(PubMedClient::new(&config)?);

  match cli.command {
    None => rename(cli.rename, &config, &renamer),
    Some(Commands::Batch { description, files }) => batch(files, description, renamer),
    Some(Commands::Drop { description, directory, files }) => {
      interactive::run(renamer, description, files, directory)?;
      Ok(ExitCode::SUCCESS)
    },
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  match run(cli) {
    Ok(code) => code,
    Err(e) => {
      eprintln!("{} {e}", style("Error:").red().for_stderr());
      ExitCode::FAILURE
    },
  }
}
