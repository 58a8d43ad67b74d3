//! CLI argument definitions using clap derive macros.

use std::time::Duration;

use clap::Parser;

use depcite_core::CiteConfig;

/// Find and print BibTeX citations for software dependencies.
///
/// TARGET is a DOI or GitHub URL, a dependency manifest (conda environment
/// `.yaml`/`.yml` or a one-per-line list), or a directory of environment
/// manifests. Citations go to stdout, warnings to stderr.
#[derive(Parser, Debug)]
#[command(name = "depcite")]
#[command(author, version, about)]
pub struct Args {
    /// URL, manifest file, or directory of manifests to cite
    pub target: String,

    /// GitHub API token (raises the API rate limit)
    #[arg(short = 'g', long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Attempts per GitHub API request (0-10)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: Option<u8>,

    /// Longest rate-limit wait to accept, in seconds (0-3600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(0..=3600))]
    pub max_wait: Option<u64>,

    /// Delay between dependency probes in directory mode, in milliseconds (0 to disable, max 60000)
    #[arg(long, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub pace_ms: Option<u64>,

    /// Dependencies resolved concurrently per manifest (1-16)
    #[arg(short = 'j', long, value_parser = clap::value_parser!(u8).range(1..=16))]
    pub jobs: Option<u8>,

    /// Keep `[bot]` accounts in author lists
    #[arg(long)]
    pub keep_bots: bool,
}

impl Args {
    /// Overlays flags given on the command line onto `config`.
    pub fn apply_to(&self, config: &mut CiteConfig) {
        if let Some(token) = &self.github_token {
            config.github_token = Some(token.clone());
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = u32::from(max_retries);
        }
        if let Some(secs) = self.max_wait {
            config.max_wait = Duration::from_secs(secs);
        }
        if let Some(ms) = self.pace_ms {
            config.pace = Duration::from_millis(ms);
        }
        if let Some(jobs) = self.jobs {
            config.jobs = usize::from(jobs);
        }
        if self.keep_bots {
            config.filter_bots = false;
        }
    }

    /// Default log filter from `--quiet` and `-v`.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }
}
