//! Runtime configuration.
//!
//! Settings are read from a TOML file (by default
//! `~/.config/pmidlabel/config.toml` on Linux), then selected keys can be
//! overridden through the environment. A missing file is not an error: every key
//! has a default, so an empty or absent file behaves exactly like
//! [`Config::default`].
//!
//! ```toml
//! endpoint     = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi"
//! timeout_secs = 10
//! collision    = "prompt"
//! email        = "me@example.org"
//! ```

use super::*;

/// Default E-utilities `efetch` endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

/// Environment variable overriding [`Config::endpoint`].
pub const ENDPOINT_ENV: &str = "PMIDLABEL_ENDPOINT";

/// Environment variable overriding [`Config::timeout_secs`].
pub const TIMEOUT_ENV: &str = "PMIDLABEL_TIMEOUT";

/// Settings shared by the command line and the drop target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// URL of the `efetch` endpoint queried for MEDLINE records
  pub endpoint:     String,
  /// Per-request timeout in seconds
  pub timeout_secs: u64,
  /// `User-Agent` header sent with every request
  pub user_agent:   String,
  /// Value for the E-utilities `tool` parameter, if any
  pub tool:         Option<String>,
  /// Contact address for the E-utilities `email` parameter, if any
  pub email:        Option<String>,
  /// What the command line does when the target file already exists
  pub collision:    CollisionPolicy,
  /// Directory for the drop target's log file
  pub log_dir:      Option<PathBuf>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      endpoint:     DEFAULT_ENDPOINT.to_string(),
      timeout_secs: 10,
      user_agent:   concat!("pmidlabel/", env!("CARGO_PKG_VERSION")).to_string(),
      tool:         Some("pmidlabel".to_string()),
      email:        None,
      collision:    CollisionPolicy::Prompt,
      log_dir:      None,
    }
  }
}

impl Config {
  /// Get default config path in the user's config directory
  pub fn default_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("pmidlabel").join("config.toml")
  }

  /// Get default log directory in the user's local data directory
  pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")).join("pmidlabel")
  }

  /// Loads the configuration file at `path`, falling back to defaults when the
  /// file does not exist.
  ///
  /// # Errors
  ///
  /// Returns [`LabelError::IO`] when the file exists but cannot be read, and
  /// [`LabelError::Config`] when it is not valid TOML for this struct.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, LabelError> {
    let path = path.as_ref();
    if !path.exists() {
      debug!("No config file at {}, using defaults", path.display());
      return Ok(Self::default());
    }

    trace!("Reading config from {}", path.display());
    let text = std::fs::read_to_string(path)?;
    let config: Self = toml::from_str(&text)?;
    if config.timeout_secs == 0 {
      return Err(LabelError::InvalidConfig(format!(
        "timeout_secs must be at least 1 in {}",
        path.display()
      )));
    }
    debug!("Loaded config: {config:?}");
    Ok(config)
  }

  /// Applies `PMIDLABEL_ENDPOINT` and `PMIDLABEL_TIMEOUT` from the process
  /// environment.
  pub fn with_env_overrides(self) -> Self {
    self.with_overrides(|key| std::env::var(key).ok())
  }

  /// Applies overrides from `lookup`, which maps an environment variable name
  /// to its value.
  ///
  /// Unparseable or zero timeouts are ignored with a warning.
  fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
    if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|value| !value.is_empty()) {
      debug!("Endpoint overridden from {ENDPOINT_ENV}: {endpoint}");
      self.endpoint = endpoint;
    }

    if let Some(timeout) = lookup(TIMEOUT_ENV) {
      match timeout.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => self.timeout_secs = secs,
        _ => warn!("Ignoring {TIMEOUT_ENV}={timeout}, expected a positive number of seconds"),
      }
    }

    self
  }

  /// The per-request timeout.
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }

  /// The directory the drop target logs to.
  pub fn log_dir(&self) -> PathBuf { self.log_dir.clone().unwrap_or_else(Self::default_log_dir) }
}
