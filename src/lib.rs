//! depcite Core Library
//!
//! Finds a citable record for each software dependency of a project and
//! renders it as BibTeX.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - URL classification and manifest parsing
//! - [`registry`] - PyPI / Bioconda / conda-forge probing for citable links
//! - [`api`] - GitHub API client with retry and rate-limit handling
//! - [`citation`] - Repository and DOI citations, BibTeX rendering
//! - [`pipeline`] - Target dispatch, per-dependency resolution, output sinks
//! - [`config`] - Runtime options and config file loading
//! - [`clock`] - Injectable time source

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod citation;
pub mod clock;
pub mod config;
pub mod error;
pub mod http_client;
pub mod parser;
pub mod pipeline;
pub mod registry;
mod user_agent;

// Re-export commonly used types
pub use api::{ApiClient, RetryPolicy};
pub use citation::{CitationBuilder, CitationRecord};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CiteConfig, FileConfig, load_default_file_config};
pub use error::CiteError;
pub use http_client::{HttpTimeouts, build_http_client};
pub use parser::{CitableLink, DependencyName, classify_link, is_doi_url, is_repo_url, is_url};
pub use pipeline::{
    CitationSink, ConsoleSink, Diagnostic, DiagnosticKind, MemorySink, Pipeline, RunSummary,
};
pub use registry::{ProbeEndpoints, ProbeSource, RegistryProber};
