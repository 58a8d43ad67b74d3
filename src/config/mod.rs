//! Runtime configuration for a citation run.
//!
//! [`CiteConfig`] carries every option the pipeline reads. Values are layered
//! by the binary: built-in defaults, then the config file ([`FileConfig`]),
//! then command-line flags.

mod file;

pub use file::{FileConfig, LoadedConfig, load_default_file_config, resolve_default_config_path};

use std::time::Duration;

use crate::api::{DEFAULT_MAX_RETRIES, DEFAULT_MAX_WAIT};
use crate::error::CiteError;
use crate::http_client::HttpTimeouts;

/// Default spacing between dependency probes in directory mode.
pub const DEFAULT_PACE: Duration = Duration::from_secs(1);

/// Default number of dependencies resolved at once.
pub const DEFAULT_JOBS: usize = 1;

/// Upper bound for `max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Upper bound for `jobs`.
pub const MAX_JOBS: usize = 16;

const MAX_WAIT_LIMIT: Duration = Duration::from_secs(3600);
const MAX_PACE: Duration = Duration::from_secs(60);

/// Options for one citation run.
#[derive(Clone)]
pub struct CiteConfig {
    /// GitHub API token.
    pub github_token: Option<String>,
    /// Attempts per GitHub API request (0 is treated as 1).
    pub max_retries: u32,
    /// Longest server-mandated wait accepted before giving up.
    pub max_wait: Duration,
    /// Spacing between dependency probes in directory mode; zero disables.
    pub pace: Duration,
    /// Dependencies resolved concurrently within one manifest.
    pub jobs: usize,
    /// Drop contributors whose name ends in `[bot]`.
    pub filter_bots: bool,
    /// Timeouts for every outbound request.
    pub http_timeouts: HttpTimeouts,
}

impl Default for CiteConfig {
    fn default() -> Self {
        Self {
            github_token: None,
            max_retries: DEFAULT_MAX_RETRIES,
            max_wait: DEFAULT_MAX_WAIT,
            pace: DEFAULT_PACE,
            jobs: DEFAULT_JOBS,
            filter_bots: true,
            http_timeouts: HttpTimeouts::default(),
        }
    }
}

impl std::fmt::Debug for CiteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CiteConfig")
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("max_retries", &self.max_retries)
            .field("max_wait", &self.max_wait)
            .field("pace", &self.pace)
            .field("jobs", &self.jobs)
            .field("filter_bots", &self.filter_bots)
            .field("http_timeouts", &self.http_timeouts)
            .finish()
    }
}

impl CiteConfig {
    /// Checks option ranges.
    ///
    /// # Errors
    ///
    /// Returns [`CiteError::InvalidConfig`] naming the first out-of-range option.
    pub fn validate(&self) -> Result<(), CiteError> {
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(CiteError::invalid_config(
                "max_retries",
                format!("{} exceeds {MAX_RETRIES_LIMIT}", self.max_retries),
            ));
        }
        if self.max_wait > MAX_WAIT_LIMIT {
            return Err(CiteError::invalid_config(
                "max_wait",
                format!(
                    "{}s exceeds {}s",
                    self.max_wait.as_secs(),
                    MAX_WAIT_LIMIT.as_secs()
                ),
            ));
        }
        if self.pace > MAX_PACE {
            return Err(CiteError::invalid_config(
                "pace",
                format!("{}ms exceeds {}ms", self.pace.as_millis(), MAX_PACE.as_millis()),
            ));
        }
        if !(1..=MAX_JOBS).contains(&self.jobs) {
            return Err(CiteError::invalid_config(
                "jobs",
                format!("{} is outside 1..={MAX_JOBS}", self.jobs),
            ));
        }
        for (field, secs) in [
            ("connect_timeout_secs", self.http_timeouts.connect_timeout_secs),
            ("read_timeout_secs", self.http_timeouts.read_timeout_secs),
        ] {
            if !(1..=3600).contains(&secs) {
                return Err(CiteError::invalid_config(
                    field,
                    format!("{secs} is outside 1..=3600"),
                ));
            }
        }
        Ok(())
    }
}
