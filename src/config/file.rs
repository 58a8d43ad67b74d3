//! Config file loading.
//!
//! The file is a flat list of `key = value` lines with `#` comments:
//!
//! ```toml
//! github_token = "ghp_..."
//! max_retries = 5
//! max_wait_secs = 120
//! pace_ms = 500
//! jobs = 4
//! keep_bots = false
//! connect_timeout_secs = 10
//! read_timeout_secs = 30
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::debug;

use super::{CiteConfig, MAX_JOBS, MAX_RETRIES_LIMIT};

/// Values read from the config file; unset keys keep their defaults.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// GitHub API token.
    pub github_token: Option<String>,
    /// Attempts per API request.
    pub max_retries: Option<u32>,
    /// Rate-limit wait budget in seconds.
    pub max_wait_secs: Option<u64>,
    /// Directory-mode pacing in milliseconds.
    pub pace_ms: Option<u64>,
    /// Concurrent dependency resolutions.
    pub jobs: Option<usize>,
    /// Keep `[bot]` contributors in author lists.
    pub keep_bots: Option<bool>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
}

impl std::fmt::Debug for FileConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfig")
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("max_retries", &self.max_retries)
            .field("max_wait_secs", &self.max_wait_secs)
            .field("pace_ms", &self.pace_ms)
            .field("jobs", &self.jobs)
            .field("keep_bots", &self.keep_bots)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("read_timeout_secs", &self.read_timeout_secs)
            .finish()
    }
}

impl FileConfig {
    /// Validates values against runtime and CLI constraints.
    ///
    /// # Errors
    ///
    /// Fails naming the first out-of-range key.
    pub fn validate(&self) -> Result<()> {
        if let Some(max_retries) = self.max_retries
            && max_retries > MAX_RETRIES_LIMIT
        {
            bail!(
                "Invalid config value for `max_retries`: {max_retries}. Expected range: 0..={MAX_RETRIES_LIMIT}"
            );
        }
        if let Some(max_wait_secs) = self.max_wait_secs
            && max_wait_secs > 3600
        {
            bail!("Invalid config value for `max_wait_secs`: {max_wait_secs}. Expected range: 0..=3600");
        }
        if let Some(pace_ms) = self.pace_ms
            && pace_ms > 60_000
        {
            bail!("Invalid config value for `pace_ms`: {pace_ms}. Expected range: 0..=60000");
        }
        if let Some(jobs) = self.jobs
            && !(1..=MAX_JOBS).contains(&jobs)
        {
            bail!("Invalid config value for `jobs`: {jobs}. Expected range: 1..={MAX_JOBS}");
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        Ok(())
    }

    /// Overlays the set values onto `config`.
    pub fn apply_to(&self, config: &mut CiteConfig) {
        if let Some(token) = &self.github_token {
            config.github_token = Some(token.clone());
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(secs) = self.max_wait_secs {
            config.max_wait = Duration::from_secs(secs);
        }
        if let Some(ms) = self.pace_ms {
            config.pace = Duration::from_millis(ms);
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if let Some(keep_bots) = self.keep_bots {
            config.filter_bots = !keep_bots;
        }
        if let Some(secs) = self.connect_timeout_secs {
            config.http_timeouts.connect_timeout_secs = secs;
        }
        if let Some(secs) = self.read_timeout_secs {
            config.http_timeouts.read_timeout_secs = secs;
        }
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/depcite/config.toml`
/// 2. `$HOME/.config/depcite/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("depcite")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("depcite")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
///
/// # Errors
///
/// Fails when the file exists but cannot be read, parsed, or validated.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    debug!(path = ?path, loaded = config.is_some(), "resolved config file");
    Ok(LoadedConfig { path, config })
}

/// Loads and validates the config file at `path`.
///
/// # Errors
///
/// Fails when the file cannot be read, has a syntax error, an unknown key, or
/// an out-of-range value.
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "github_token" => {
                cfg.github_token = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "max_retries" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                cfg.max_retries = Some(
                    u32::try_from(parsed)
                        .map_err(|_| anyhow::anyhow!("max_retries out of range for u32"))?,
                );
            }
            "max_wait_secs" => {
                cfg.max_wait_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "pace_ms" => {
                cfg.pace_ms = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "jobs" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                cfg.jobs = Some(
                    usize::try_from(parsed)
                        .map_err(|_| anyhow::anyhow!("jobs out of range for usize"))?,
                );
            }
            "keep_bots" => {
                cfg.keep_bots = Some(parse_boolean(value).with_context(invalid)?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}
