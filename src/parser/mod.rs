//! Input classification and manifest parsing.
//!
//! This module decides what a citation target is and extracts dependency
//! names from manifests.
//!
//! # Current Support
//!
//! - Absolute URLs ([`is_url`])
//! - `doi.org` resolver links ([`is_doi_url`])
//! - GitHub repository links ([`is_repo_url`], [`RepoCoordinate`])
//! - Conda environment manifests and plain dependency lists ([`read_manifest`])
//!
//! Link patterns are prefix-anchored: a link followed by extra path segments
//! still classifies as the link it starts with.
//!
//! # Example
//!
//! ```
//! use depcite_core::parser::{CitableLink, classify_link};
//!
//! let link = classify_link("https://github.com/snakemake/snakemake");
//! assert!(matches!(link, CitableLink::Repo(_)));
//! ```

mod doi;
mod error;
mod manifest;
mod url;

pub use doi::{DOI_RESOLVER_PREFIX, bare_doi, is_doi_url};
pub use error::ParseError;
pub use manifest::{
    ManifestFormat, is_manifest_file, parse_dependency_list, parse_environment_manifest,
    read_manifest,
};
pub use self::url::{RepoCoordinate, is_repo_url, is_url};

use std::fmt;

use tracing::debug;

/// A bare dependency name taken from a manifest line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyName(String);

impl DependencyName {
    /// Wraps a name token.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as written in the manifest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DependencyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A link classified by what it can be cited through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CitableLink {
    /// `doi.org` resolver link; cited by content negotiation.
    Doi(String),
    /// GitHub repository link; cited from repository metadata.
    Repo(String),
    /// Neither form; cannot be cited.
    Unclassified(String),
}

impl CitableLink {
    /// The underlying URL text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Doi(url) | Self::Repo(url) | Self::Unclassified(url) => url,
        }
    }

    /// Short label for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Doi(_) => "doi",
            Self::Repo(_) => "repo",
            Self::Unclassified(_) => "unclassified",
        }
    }
}

impl fmt::Display for CitableLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies `input` as a DOI link, a repository link, or neither.
///
/// DOI links take precedence.
#[must_use]
pub fn classify_link(input: &str) -> CitableLink {
    let link = if is_doi_url(input) {
        CitableLink::Doi(input.to_string())
    } else if is_repo_url(input) {
        CitableLink::Repo(input.to_string())
    } else {
        CitableLink::Unclassified(input.to_string())
    };
    debug!(input, kind = link.kind(), "classified link");
    link
}

/// Scans free text (a registry page or JSON body) for something citable.
///
/// A DOI anywhere in the text wins over a repository link; the DOI is
/// normalized to a `https://doi.org/` link. Returns `None` when neither occurs.
#[must_use]
pub fn find_citable_link(text: &str) -> Option<CitableLink> {
    if let Some(doi_url) = doi::find_doi(text) {
        return Some(CitableLink::Doi(doi_url));
    }
    self::url::find_repo_url(text).map(|repo| CitableLink::Repo(repo.to_string()))
}
