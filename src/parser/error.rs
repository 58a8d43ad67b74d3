//! Error types for manifest parsing operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while reading or parsing a dependency manifest.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A line inside a `dependencies:` region is not a `- <name>` list item
    #[error(
        "malformed dependency at {}:{line}: '{content}' is not a '- <name>' list item\n  Suggestion: Indent nested keys under a list item or move them out of the dependencies block",
        .path.display()
    )]
    MalformedManifestLine {
        /// Manifest file being parsed
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Offending line, trimmed
        content: String,
    },

    /// The manifest could not be read from disk
    #[error(
        "cannot read manifest {}: {source}\n  Suggestion: Check that the file exists and is readable UTF-8 text",
        .path.display()
    )]
    Io {
        /// Manifest file being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// Creates a `MalformedManifestLine` error.
    #[must_use]
    pub fn malformed_line(path: impl AsRef<Path>, line: usize, content: &str) -> Self {
        Self::MalformedManifestLine {
            path: path.as_ref().to_path_buf(),
            line,
            content: content.trim().to_string(),
        }
    }

    /// Creates an `Io` error for a manifest path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
