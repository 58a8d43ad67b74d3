//! Top-level error type for the citation pipeline.
//!
//! Failures local to one dependency never surface here; they become
//! diagnostics. Only problems that stop a whole run are represented.

use thiserror::Error;

use crate::parser::ParseError;

/// Errors that abort a citation run.
#[derive(Debug, Error)]
pub enum CiteError {
    /// Target is not a URL, an existing file, or an existing directory
    #[error(
        "'{target}' is unreachable: not a URL, an existing file, or an existing directory\n  Suggestion: Check the URL scheme (https://...) or the path"
    )]
    UnreachableTarget {
        /// The target as given on the command line
        target: String,
    },

    /// HTTP client could not be constructed
    #[error("cannot initialize HTTP client: {reason}\n  Suggestion: Check proxy environment variables")]
    HttpClient {
        /// Why construction failed
        reason: String,
    },

    /// A runtime option is out of range
    #[error("invalid setting `{field}`: {reason}")]
    InvalidConfig {
        /// Name of the offending option
        field: &'static str,
        /// Why the value is rejected
        reason: String,
    },

    /// A manifest could not be read or parsed
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl CiteError {
    /// Creates an `UnreachableTarget` error.
    #[must_use]
    pub fn unreachable(target: &str) -> Self {
        Self::UnreachableTarget {
            target: target.to_string(),
        }
    }

    /// Creates an `HttpClient` error.
    #[must_use]
    pub fn http_client(reason: &str) -> Self {
        Self::HttpClient {
            reason: reason.to_string(),
        }
    }

    /// Creates an `InvalidConfig` error.
    #[must_use]
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
